//! Domain-Separated Hashing
//!
//! Every digest in the protocol goes through SHA-256 with a domain tag:
//! - Board cell leaves
//! - Merkle interior nodes
//! - Game state integrity hashes

use sha2::{Sha256, Digest};

/// Hash output type (256 bits / 32 bytes).
pub type Hash256 = [u8; 32];

/// Deterministic hasher with a domain prefix.
///
/// Wraps SHA-256 with helpers for protocol field types.
/// Order of updates is part of the encoding.
pub struct DomainHasher {
    hasher: Sha256,
}

impl DomainHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for game state snapshots.
    pub fn for_game_state() -> Self {
        Self::new(b"BATTLESHIP_STATE_V1")
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with an optional 32-byte value, tagged so that `None`
    /// never collides with a present value.
    pub fn update_opt_hash(&mut self, value: Option<&Hash256>) {
        match value {
            Some(h) => {
                self.update_u8(1);
                self.hasher.update(h);
            }
            None => self.update_u8(0),
        }
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> Hash256 {
        self.hasher.finalize().into()
    }
}

/// Compute hash with domain separator.
pub fn hash_with_domain(domain: &[u8], data: &[u8]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(data);
    hasher.finalize().into()
}

/// Short hex prefix of a digest for log lines.
pub fn short_hex(hash: &[u8]) -> String {
    hex::encode(&hash[..hash.len().min(4)])
}
