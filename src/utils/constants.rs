//! Vault constants and magic numbers.
//!
//! All vault-wide constants are defined here for easy auditing and modification.

// ═══════════════════════════════════════════════════════════════════════════════
// FEE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Basis points divisor (10000 = 100%)
pub const BPS_DIVISOR: u128 = 10_000;

/// Maximum manager fee - 10% (1000 basis points)
pub const MAX_MANAGER_FEE_BPS: u16 = 1_000;

/// Manager fee applied to a freshly initialized vault
pub const DEFAULT_MANAGER_FEE_BPS: u16 = 0;

// ═══════════════════════════════════════════════════════════════════════════════
// SHARE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Share decimals (matches the 18-decimal liquidity asset)
pub const SHARE_DECIMALS: u8 = 18;

// ═══════════════════════════════════════════════════════════════════════════════
// DEBT ACCRUAL CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Fixed-point scale (1e18)
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// Seconds in the 365-day accrual year
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

/// Below this exponent `wad_exp` rounds to zero
pub const WAD_EXP_MIN_INPUT: i128 = -42_139_678_854_452_767_551;

/// At or above this exponent `wad_exp` overflows
pub const WAD_EXP_MAX_INPUT: i128 = 135_305_999_368_893_231_589;

// ═══════════════════════════════════════════════════════════════════════════════
// TIME CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Seconds per block used by the in-memory environment
pub const BLOCK_TIME_SECS: u64 = 12;

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNING DOMAIN CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Domain separator type string
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Liquidation order type string
pub const LIQUIDATE_ORDER_TYPE: &str = "LiquidateOrder(address collection,uint256 tokenId,uint256 amount,address recipient,uint256 nonce,uint256 deadline)";

/// Prefix for structured-data digests
pub const STRUCTURED_DATA_PREFIX: [u8; 2] = [0x19, 0x01];

/// Default signing domain version
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// Default chain identifier
pub const DEFAULT_CHAIN_ID: u64 = 1;

// ═══════════════════════════════════════════════════════════════════════════════
// CRYPTOGRAPHIC CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Length of a public key in bytes (compressed secp256k1)
pub const PUBKEY_LENGTH: usize = 33;

/// Length of a signature in bytes (compact ECDSA)
pub const SIGNATURE_LENGTH: usize = 64;

/// Length of a hash in bytes (SHA256 / Blake3)
pub const HASH_LENGTH: usize = 32;

/// Length of an address in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Length of an encoded word in canonical hashes
pub const WORD_LENGTH: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;
