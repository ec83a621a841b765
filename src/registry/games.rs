//! Game Registry
//!
//! Creates game instances, pools the ones still waiting for an opponent,
//! and hands out shared handles. Each instance sits behind its own mutex,
//! so calls on one game are serialized while different games proceed
//! independently.

use std::collections::BTreeMap;
use std::sync::Arc;
use rand::seq::IteratorRandom;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::core::hash::short_hex;
use crate::game::config::GameConfig;
use crate::game::error::GameError;
use crate::game::state::{GameId, GameInstance, PlayerId};

/// Shared handle to one game.
pub type GameHandle = Arc<Mutex<GameInstance>>;

/// Registry configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Applied to every created game.
    pub game: GameConfig,
}

impl RegistryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            game: GameConfig::from_env(),
        }
    }
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No game with this id.
    #[error("game {} not found", hex::encode(.0))]
    GameNotFound(GameId),

    /// No open game from another creator.
    #[error("no game available to join")]
    NoGameAvailable,

    /// The game rejected the call.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// In-process game registry.
pub struct GameRegistry {
    config: RegistryConfig,
    /// All games.
    games: RwLock<BTreeMap<GameId, GameHandle>>,
    /// Unjoined games and their creators.
    open: RwLock<BTreeMap<GameId, PlayerId>>,
}

impl GameRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            games: RwLock::new(BTreeMap::new()),
            open: RwLock::new(BTreeMap::new()),
        }
    }

    /// Registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Create a game and pool it until someone joins.
    pub async fn create_game(
        &self,
        creator: PlayerId,
        agreed_bet: u64,
        block: u64,
    ) -> Result<GameId, RegistryError> {
        let id = uuid::Uuid::new_v4().into_bytes();
        let game = GameInstance::new(id, creator, agreed_bet, &self.config.game, block)?;

        let mut games = self.games.write().await;
        games.insert(id, Arc::new(Mutex::new(game)));
        self.open.write().await.insert(id, creator);

        Ok(id)
    }

    /// Bind `opponent` to an open game.
    pub async fn join_game(
        &self,
        id: &GameId,
        opponent: PlayerId,
        block: u64,
    ) -> Result<(), RegistryError> {
        let handle = self.game(id).await.ok_or(RegistryError::GameNotFound(*id))?;

        let mut open = self.open.write().await;
        let mut game = handle.lock().await;
        game.join(opponent, block)?;
        open.remove(id);

        Ok(())
    }

    /// Pick any open game not created by `caller`.
    pub async fn get_random_game<R: Rng + ?Sized>(
        &self,
        caller: &PlayerId,
        rng: &mut R,
    ) -> Result<GameId, RegistryError> {
        let open = self.open.read().await;
        let id = open
            .iter()
            .filter(|(_, creator)| *creator != caller)
            .map(|(id, _)| *id)
            .choose(rng)
            .ok_or(RegistryError::NoGameAvailable)?;

        debug!(game = %short_hex(&id), caller = %caller.short(), "Matched open game");
        Ok(id)
    }

    /// Get a game by id.
    pub async fn game(&self, id: &GameId) -> Option<GameHandle> {
        let games = self.games.read().await;
        games.get(id).cloned()
    }

    /// Number of games held.
    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    /// Number of games waiting for an opponent.
    pub async fn open_game_count(&self) -> usize {
        self.open.read().await.len()
    }

    /// Drop games that are finished and paid out. Returns how many were removed.
    ///
    /// Game locks are only taken while the map is unlocked.
    pub async fn prune_settled(&self) -> usize {
        let handles: Vec<(GameId, GameHandle)> = {
            let games = self.games.read().await;
            games.iter().map(|(id, game)| (*id, game.clone())).collect()
        };

        let mut to_remove = Vec::new();
        for (id, game) in handles {
            if game.lock().await.is_settled() {
                to_remove.push(id);
            }
        }

        let mut games = self.games.write().await;
        for id in &to_remove {
            games.remove(id);
        }
        if !to_remove.is_empty() {
            info!(removed = to_remove.len(), remaining = games.len(), "Pruned settled games");
        }

        to_remove.len()
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
