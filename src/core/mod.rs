//! Core deterministic primitives.
//!
//! Hashing shared by the proof system and the state machine.

pub mod hash;

// Re-export core types
pub use hash::{Hash256, DomainHasher, hash_with_domain};
