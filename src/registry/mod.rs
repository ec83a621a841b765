//! Game Registry Layer
//!
//! Hosts game instances in-process. This layer is **non-deterministic**
//! (ids from uuid v4, matchmaking from a caller-supplied RNG); all protocol
//! rules run through `game/`.

pub mod games;

pub use games::{GameHandle, GameRegistry, RegistryConfig, RegistryError};
