//! Error types for the lien vault.
//!
//! This module defines all error types used throughout the vault. Every error
//! is terminal for the call that raised it: the call is reverted as a whole
//! and the error is surfaced to the caller.

use thiserror::Error;

use crate::core::lien::LienId;

/// Result type alias for vault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the lien vault
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ═══════════════════════════════════════════════════════════════════
    // Validation Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Attached value is zero or differs from the declared amount
    #[error("Invalid amount: declared {amount}, attached {value}")]
    InvalidAmount {
        /// Declared amount
        amount: u128,
        /// Value attached to the call
        value: u128,
    },

    /// Amount is zero
    #[error("Amount cannot be zero")]
    ZeroAmount,

    /// Share balance too small
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Required amount
        required: u128,
        /// Available amount
        available: u128,
    },

    /// Share allowance too small
    #[error("Insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance {
        /// Required amount
        required: u128,
        /// Available allowance
        available: u128,
    },

    /// Pooled liquidity cannot cover the payment
    #[error("Insufficient liquidity: required {required}, available {available}")]
    InsufficientLiquidity {
        /// Required amount
        required: u128,
        /// Available pooled liquidity
        available: u128,
    },

    /// Recipient is the null identity
    #[error("Invalid recipient")]
    InvalidRecipient,

    /// Slice outside the lien store
    #[error("Index out of range: start {start}, count {count}, len {len}")]
    IndexOutOfRange {
        /// First requested index
        start: usize,
        /// Requested number of entries
        count: usize,
        /// Number of tracked entries
        len: usize,
    },

    /// Manager fee above the cap
    #[error("Invalid manager fee {fee_bps}bps, max {max_bps}bps")]
    InvalidManagerFee {
        /// Requested fee
        fee_bps: u16,
        /// Maximum fee
        max_bps: u16,
    },

    /// Invalid input parameter
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Lien id already tracked
    #[error("Duplicate lien: {0}")]
    DuplicateLien(LienId),

    /// Lien id not tracked
    #[error("Unknown lien: {0}")]
    UnknownLien(LienId),

    /// No seized asset recorded for the lien, or the asset differs
    #[error("Unknown seized asset for lien {0}")]
    UnknownSeizedAsset(LienId),

    // ═══════════════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Not authorized to perform this action
    #[error("Not authorized: {0}")]
    Unauthorized(String),

    // ═══════════════════════════════════════════════════════════════════
    // Authenticity Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Signed payload not signed by the manager (forged, tampered or replayed)
    #[error("Invalid signature")]
    InvalidSignature,

    /// Caller-supplied lien does not match the lending protocol's record
    #[error("Lien {0} does not match the authoritative record")]
    LienHashMismatch(LienId),

    /// Collaborator differs from the one named at initialization
    #[error("Unexpected {role}: expected {expected}, got {got}")]
    UnexpectedCollaborator {
        /// Collaborator role
        role: String,
        /// Address named at initialization
        expected: String,
        /// Address supplied
        got: String,
    },

    /// Cryptographic operation failed
    #[error("Crypto error in {operation}: {details}")]
    CryptoError {
        /// Operation that failed
        operation: String,
        /// Error details
        details: String,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Temporal / State Machine Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Order deadline unset or passed
    #[error("Outdated order: deadline {deadline}, now {now}")]
    OutdatedOrder {
        /// Order deadline
        deadline: u64,
        /// Current timestamp
        now: u64,
    },

    /// Auction already running for the lien
    #[error("Auction already started for lien {0}")]
    AuctionAlreadyStarted(LienId),

    /// Lien is not inside an open auction window
    #[error("Auction not active for lien {0}")]
    AuctionNotActive(LienId),

    /// Lien's auction window has not elapsed
    #[error("Lien {0} is not defaulted")]
    LienNotDefaulted(LienId),

    /// Vault is not the lender of the lien
    #[error("Vault is not the lender of lien {0}")]
    NotLender(LienId),

    // ═══════════════════════════════════════════════════════════════════
    // Arithmetic Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Overflow in calculation
    #[error("Arithmetic overflow in {operation}")]
    Overflow {
        /// Operation that overflowed
        operation: String,
    },

    /// Underflow in calculation
    #[error("Arithmetic underflow in {operation}")]
    Underflow {
        /// Operation that underflowed
        operation: String,
    },

    /// Exponent beyond the fixed-point exp domain
    #[error("Exponent overflow")]
    ExpOverflow,

    // ═══════════════════════════════════════════════════════════════════
    // External Errors
    // ═══════════════════════════════════════════════════════════════════

    /// A collaborator rejected the request
    #[error("{collaborator} rejected request: {reason}")]
    External {
        /// Collaborator name
        collaborator: String,
        /// Reason reported
        reason: String,
    },

    /// Invariant violation detected
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // ═══════════════════════════════════════════════════════════════════
    // Serialization, Storage and Config Errors
    // ═══════════════════════════════════════════════════════════════════

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error (should not happen in production)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a collaborator rejection
    pub fn external(collaborator: &str, reason: impl Into<String>) -> Self {
        Error::External {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a critical error requiring immediate attention
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Error::InvariantViolation(_)
                | Error::Internal(_)
                | Error::Overflow { .. }
                | Error::Underflow { .. }
                | Error::ExpOverflow
        )
    }

    /// Returns true if the caller supplied data that failed an authenticity check
    pub fn is_authenticity(&self) -> bool {
        matches!(
            self,
            Error::InvalidSignature
                | Error::LienHashMismatch(_)
                | Error::UnexpectedCollaborator { .. }
                | Error::CryptoError { .. }
        )
    }

    /// Returns the error code for external systems
    pub fn code(&self) -> u32 {
        match self {
            // Validation errors: 1xxx
            Error::InvalidAmount { .. } => 1001,
            Error::ZeroAmount => 1002,
            Error::InsufficientBalance { .. } => 1003,
            Error::InsufficientAllowance { .. } => 1004,
            Error::InsufficientLiquidity { .. } => 1005,
            Error::InvalidRecipient => 1006,
            Error::IndexOutOfRange { .. } => 1007,
            Error::InvalidManagerFee { .. } => 1008,
            Error::InvalidParameter { .. } => 1009,
            Error::DuplicateLien(_) => 1010,
            Error::UnknownLien(_) => 1011,
            Error::UnknownSeizedAsset(_) => 1012,

            // Authorization errors: 2xxx
            Error::Unauthorized(_) => 2001,

            // Authenticity errors: 3xxx
            Error::InvalidSignature => 3001,
            Error::LienHashMismatch(_) => 3002,
            Error::UnexpectedCollaborator { .. } => 3003,
            Error::CryptoError { .. } => 3004,

            // Temporal / state machine errors: 4xxx
            Error::OutdatedOrder { .. } => 4001,
            Error::AuctionAlreadyStarted(_) => 4002,
            Error::AuctionNotActive(_) => 4003,
            Error::LienNotDefaulted(_) => 4004,
            Error::NotLender(_) => 4005,

            // Arithmetic errors: 5xxx
            Error::Overflow { .. } => 5001,
            Error::Underflow { .. } => 5002,
            Error::ExpOverflow => 5003,

            // External errors: 6xxx
            Error::External { .. } => 6001,
            Error::InvariantViolation(_) => 6002,

            // Serialization, storage and config errors: 7xxx
            Error::Serialization(_) => 7001,
            Error::Deserialization(_) => 7002,
            Error::Storage(_) => 7003,
            Error::Config(_) => 7004,

            // Internal errors: 9xxx
            Error::Internal(_) => 9001,
        }
    }
}
