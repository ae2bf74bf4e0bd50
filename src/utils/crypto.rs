//! Cryptographic primitives for the lien vault.
//!
//! This module provides the vault's identity and signing types:
//! - Hashes (SHA256, Blake3)
//! - Addresses (20-byte account identities)
//! - secp256k1 keys and compact ECDSA signatures
//! - Fixed-width word encoding for canonical structured hashes

use secp256k1::{
    ecdsa::Signature as Secp256k1Signature, Message, PublicKey as Secp256k1PubKey, Secp256k1,
    SecretKey,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{Error, Result};
use crate::utils::constants::{
    ADDRESS_LENGTH, HASH_LENGTH, PUBKEY_LENGTH, SIGNATURE_LENGTH, WORD_LENGTH,
};

// ═══════════════════════════════════════════════════════════════════════════════
// SECP256K1 CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

thread_local! {
    static SECP: Secp256k1<secp256k1::All> = Secp256k1::new();
}

fn with_secp<F, R>(f: F) -> R
where
    F: FnOnce(&Secp256k1<secp256k1::All>) -> R,
{
    SECP.with(|secp| f(secp))
}

/// Decode a fixed-length hex string into a byte array
fn decode_fixed<const N: usize>(s: &str, name: &str) -> Result<[u8; N]> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| Error::InvalidParameter {
        name: name.into(),
        reason: e.to_string(),
    })?;
    bytes.as_slice().try_into().map_err(|_| Error::InvalidParameter {
        name: name.into(),
        reason: format!("expected {} bytes, got {}", N, bytes.len()),
    })
}

macro_rules! hex_serde {
    ($ty:ident, $len:expr) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                let bytes = decode_fixed::<{ $len }>(&s, stringify!($ty))
                    .map_err(serde::de::Error::custom)?;
                Ok($ty(bytes))
            }
        }
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// HASH
// ═══════════════════════════════════════════════════════════════════════════════

/// A 32-byte cryptographic hash
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash([u8; HASH_LENGTH]);

hex_serde!(Hash, HASH_LENGTH);

impl Hash {
    /// Create a new hash from bytes
    pub fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Compute SHA256 hash of data
    pub fn sha256(data: &[u8]) -> Self {
        let result = Sha256::digest(data);
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }

    /// Compute Blake3 hash of data
    pub fn blake3(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Get the hash as bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_fixed(s, "hash").map(Self)
    }

    /// Zero hash (all zeros)
    pub fn zero() -> Self {
        Self([0u8; HASH_LENGTH])
    }

    /// Check if hash is zero
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LENGTH]
    }

    /// Convert to secp256k1 Message for signing
    pub fn to_message(&self) -> Message {
        Message::from_digest(self.0)
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADDRESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A 20-byte account identity. The all-zero address is the null identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

hex_serde!(Address, ADDRESS_LENGTH);

impl Address {
    /// The null identity
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    /// Create an address from raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Address controlled by a public key
    pub fn from_public_key(key: &PublicKey) -> Self {
        Self(key.hash160())
    }

    /// Deterministic address for a named account (contracts, fixtures)
    pub fn derive(label: &str) -> Self {
        let hash = Hash::blake3(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash.as_bytes()[..ADDRESS_LENGTH]);
        Self(bytes)
    }

    /// Whether this is the null identity
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Get the address as bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Convert to 0x-prefixed hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex (with or without 0x prefix)
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_fixed(s, "address").map(Self)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKEN ID
// ═══════════════════════════════════════════════════════════════════════════════

/// A 256-bit collateral token identifier, stored big-endian
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TokenId([u8; WORD_LENGTH]);

hex_serde!(TokenId, WORD_LENGTH);

impl TokenId {
    /// Create a token id from its big-endian bytes
    pub const fn new(bytes: [u8; WORD_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the big-endian bytes
    pub fn as_bytes(&self) -> &[u8; WORD_LENGTH] {
        &self.0
    }

    /// The id as `u128`, if it fits
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..WORD_LENGTH - 16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[WORD_LENGTH - 16..]);
        Some(u128::from_be_bytes(low))
    }
}

impl From<u128> for TokenId {
    fn from(value: u128) -> Self {
        let mut bytes = [0u8; WORD_LENGTH];
        bytes[WORD_LENGTH - 16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl From<u64> for TokenId {
    fn from(value: u64) -> Self {
        Self::from(u128::from(value))
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", self)
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_u128() {
            Some(value) => write!(f, "{}", value),
            None => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PRIVATE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Private key length in bytes
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// A secp256k1 private key for signing operations
#[derive(Clone)]
pub struct PrivateKey {
    inner: SecretKey,
}

impl PrivateKey {
    /// Create a new private key from bytes
    pub fn from_bytes(bytes: &[u8; PRIVATE_KEY_LENGTH]) -> Result<Self> {
        let inner = SecretKey::from_slice(bytes).map_err(|e| Error::CryptoError {
            operation: "private_key_from_bytes".into(),
            details: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// Generate a new random private key
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            inner: SecretKey::new(&mut rng),
        }
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = decode_fixed::<PRIVATE_KEY_LENGTH>(s, "private_key")?;
        Self::from_bytes(&bytes)
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> PublicKey {
        with_secp(|secp| {
            let pk = Secp256k1PubKey::from_secret_key(secp, &self.inner);
            PublicKey::new(pk.serialize())
        })
    }

    /// Sign a message hash
    pub fn sign(&self, message: &Hash) -> Signature {
        with_secp(|secp| {
            let sig = secp.sign_ecdsa(&message.to_message(), &self.inner);
            Signature::new(sig.serialize_compact())
        })
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED])")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PUBLIC KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// A compressed secp256k1 public key (33 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; PUBKEY_LENGTH]);

hex_serde!(PublicKey, PUBKEY_LENGTH);

impl PublicKey {
    /// Create a new public key from bytes (must be valid compressed format)
    pub fn new(bytes: [u8; PUBKEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the public key as bytes
    pub fn as_bytes(&self) -> &[u8; PUBKEY_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string, rejecting points not on the curve
    pub fn from_hex(s: &str) -> Result<Self> {
        let key = Self(decode_fixed(s, "public_key")?);
        if !key.is_valid() {
            return Err(Error::CryptoError {
                operation: "public_key_parse".into(),
                details: "not a valid secp256k1 point".into(),
            });
        }
        Ok(key)
    }

    /// SHA256 then Blake3, truncated to an address
    pub fn hash160(&self) -> [u8; ADDRESS_LENGTH] {
        let sha_hash = Sha256::digest(self.0);
        let hash = blake3::hash(&sha_hash);
        let mut result = [0u8; ADDRESS_LENGTH];
        result.copy_from_slice(&hash.as_bytes()[..ADDRESS_LENGTH]);
        result
    }

    /// Verify that this is a valid secp256k1 public key
    pub fn is_valid(&self) -> bool {
        Secp256k1PubKey::from_slice(&self.0).is_ok()
    }

    /// Verify a signature against this public key
    pub fn verify(&self, message: &Hash, signature: &Signature) -> bool {
        verify_signature(self, message, signature)
    }

    fn to_secp256k1(self) -> Option<Secp256k1PubKey> {
        Secp256k1PubKey::from_slice(&self.0).ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNATURE
// ═══════════════════════════════════════════════════════════════════════════════

/// A compact ECDSA signature (64 bytes)
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

hex_serde!(Signature, SIGNATURE_LENGTH);

impl Signature {
    /// Create a new signature from bytes
    pub fn new(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the signature as bytes
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_fixed(s, "signature").map(Self)
    }

    fn to_secp256k1(self) -> Option<Secp256k1Signature> {
        Secp256k1Signature::from_compact(&self.0).ok()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", &self.to_hex()[..16])
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIGNATURE VERIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Verify a signature against a message and public key
///
/// Malformed keys or signatures verify as false.
pub fn verify_signature(pubkey: &PublicKey, message: &Hash, signature: &Signature) -> bool {
    let (pk, sig) = match (pubkey.to_secp256k1(), signature.to_secp256k1()) {
        (Some(pk), Some(sig)) => (pk, sig),
        _ => return false,
    };
    with_secp(|secp| secp.verify_ecdsa(&message.to_message(), &sig, &pk).is_ok())
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PAIR
// ═══════════════════════════════════════════════════════════════════════════════

/// A key pair containing both private and public keys
#[derive(Clone)]
pub struct KeyPair {
    private: PrivateKey,
    public: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_private(PrivateKey::generate())
    }

    /// Create from a private key
    pub fn from_private(private: PrivateKey) -> Self {
        let public = private.public_key();
        Self { private, public }
    }

    /// Create from private key hex
    pub fn from_hex(hex: &str) -> Result<Self> {
        Ok(Self::from_private(PrivateKey::from_hex(hex)?))
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Address controlled by this key pair
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public)
    }

    /// Sign a message hash
    pub fn sign(&self, message: &Hash) -> Signature {
        self.private.sign(message)
    }

    /// Verify a signature
    pub fn verify(&self, message: &Hash, signature: &Signature) -> bool {
        self.public.verify(message, signature)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair {{ public: {:?} }}", self.public)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WORD ENCODING
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds a canonical byte string out of 32-byte big-endian words.
///
/// Every field occupies exactly one word, so two different field tuples can
/// never encode to the same bytes.
#[derive(Debug, Default)]
pub struct WordEncoder {
    buf: Vec<u8>,
}

impl WordEncoder {
    /// Start an empty encoding
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw 32-byte word
    pub fn word(mut self, word: [u8; WORD_LENGTH]) -> Self {
        self.buf.extend_from_slice(&word);
        self
    }

    /// Append an address, left-padded
    pub fn address(self, address: &Address) -> Self {
        let mut word = [0u8; WORD_LENGTH];
        word[WORD_LENGTH - ADDRESS_LENGTH..].copy_from_slice(address.as_bytes());
        self.word(word)
    }

    /// Append an unsigned integer, left-padded
    pub fn uint(self, value: u128) -> Self {
        let mut word = [0u8; WORD_LENGTH];
        word[WORD_LENGTH - 16..].copy_from_slice(&value.to_be_bytes());
        self.word(word)
    }

    /// Append a token id
    pub fn token_id(self, token_id: &TokenId) -> Self {
        self.word(*token_id.as_bytes())
    }

    /// Append a hash
    pub fn hash(self, hash: &Hash) -> Self {
        self.word(*hash.as_bytes())
    }

    /// Hash of the encoded words
    pub fn finish(self) -> Hash {
        Hash::sha256(&self.buf)
    }

    /// The encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
