use crate::identity::Address;
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeypairError {
    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Invalid key bytes: {0}")]
    InvalidBytes(String),
}

/// Ed25519 public key (32 bytes)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    /// Get the raw bytes of the public key
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Ledger address controlled by this key
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }
}

/// Ed25519 keypair identifying a ledger account holder
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Get the public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.signing_key.verifying_key())
    }

    /// Ledger address of this keypair
    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    /// Secret key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Restore a keypair from its 32 secret key bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeypairError> {
        let bytes_array: [u8; 32] = bytes.try_into().map_err(|_| KeypairError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;

        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes_array),
        })
    }

    /// Restore a keypair from a hex-encoded secret key
    pub fn from_hex(s: &str) -> Result<Self, KeypairError> {
        let bytes = hex::decode(s.trim()).map_err(|e| KeypairError::InvalidBytes(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}
