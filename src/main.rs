//! Merkle Battleship Demo
//!
//! Plays one wagered match between two honest players through the
//! in-process registry and logs every step.

use std::collections::BTreeSet;
use anyhow::{anyhow, Context};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use battleship::{
    BOARD_CELLS, SHIP_CELLS, VERSION,
    game::{
        events::GameEventData,
        state::{CallContext, GamePhase, PlayerId},
    },
    proof::board::Board,
    registry::{GameRegistry, RegistryConfig},
};

const BET: u64 = 1_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Merkle Battleship v{}", VERSION);
    info!("Board: {} cells, {} ship cells", BOARD_CELLS, SHIP_CELLS);

    demo_match().await
}

/// One player's private view: their board and their firing order.
struct Player {
    id: PlayerId,
    board: Board,
    targets: Vec<u8>,
}

impl Player {
    fn new<R: Rng>(id: PlayerId, rng: &mut R) -> anyhow::Result<Self> {
        let ships: Vec<u8> = rand::seq::index::sample(rng, BOARD_CELLS, SHIP_CELLS)
            .into_iter()
            .map(|i| i as u8)
            .collect();
        let board = Board::random(&ships, rng)?;
        let mut targets: Vec<u8> = (0..BOARD_CELLS as u8).collect();
        targets.shuffle(rng);
        Ok(Self { id, board, targets })
    }

    fn next_target(&mut self) -> anyhow::Result<u8> {
        self.targets.pop().ok_or_else(|| anyhow!("out of targets"))
    }
}

/// Demo function to run a full match.
async fn demo_match() -> anyhow::Result<()> {
    info!("=== Starting Demo Match ===");

    let mut rng = rand::thread_rng();
    let registry = GameRegistry::new(RegistryConfig::from_env());
    let mut block = 0u64;

    let mut alice = Player::new(PlayerId::new(*uuid::Uuid::new_v4().as_bytes()), &mut rng)?;
    let mut bob = Player::new(PlayerId::new(*uuid::Uuid::new_v4().as_bytes()), &mut rng)?;

    // Matchmaking
    block += 1;
    let game_id = registry.create_game(alice.id, BET, block).await?;
    let picked = registry.get_random_game(&bob.id, &mut rng).await?;
    block += 1;
    registry.join_game(&picked, bob.id, block).await?;
    info!("Game ID: {}", hex::encode(game_id));

    let handle = registry
        .game(&game_id)
        .await
        .context("created game missing from registry")?;
    let mut game = handle.lock().await;

    // Stakes and commitments
    for player in [&alice, &bob] {
        block += 1;
        game.deposit_bet(&CallContext::new(player.id, block), BET)?;
    }
    for player in [&alice, &bob] {
        block += 1;
        game.commit_board(&CallContext::new(player.id, block), player.board.root())?;
        info!("Player {} committed root {}", player.id.short(), hex::encode(player.board.root()));
    }

    // Opening shot
    block += 1;
    let first = alice.next_target()?;
    game.shoot(&CallContext::new(alice.id, block), first)?;

    // Alternate confirm-and-shoot until someone sinks ten ships
    let mut rounds = 0u32;
    while game.phase() == GamePhase::Shooting {
        let (mover, shooter) = if game.turn() == Some(alice.id) {
            (&mut alice, &bob)
        } else {
            (&mut bob, &alice)
        };

        let pending = game
            .shots(&shooter.id)
            .and_then(|s| s.last())
            .map(|s| s.index)
            .context("no pending shot to confirm")?;
        let reveal = mover.board.reveal(pending).context("shot outside board")?;
        let next = mover.next_target()?;

        block += 1;
        let hit = game.confirm_and_shoot(
            &CallContext::new(mover.id, block),
            reveal.index,
            reveal.is_ship,
            &reveal.salt,
            &reveal.proof,
            next,
        )?;
        rounds += 1;
        if hit {
            info!(
                "Round {}: {} hit cell {} ({} hits)",
                rounds,
                shooter.id.short(),
                pending,
                game.hits_scored(&shooter.id).unwrap_or(0)
            );
        }
    }

    // End-game check by the provisional winner
    let winner_id = game.winner().context("shooting ended without a winner")?;
    let (winner, loser) = if winner_id == alice.id { (&alice, &bob) } else { (&bob, &alice) };
    let shot: BTreeSet<u8> = game
        .shots(&loser.id)
        .unwrap_or_default()
        .iter()
        .map(|s| s.index)
        .collect();
    let proof = winner.board.unshot_proof(&shot);
    info!("Winner proves {} untouched cells with {} proof hashes", proof.indexes.len(), proof.proof.len());

    block += 1;
    game.board_check(
        &CallContext::new(winner.id, block),
        &proof.indexes,
        &proof.cells,
        &proof.salts,
        &proof.proof,
        &proof.proof_flags,
    )?;

    let final_winner = game.winner().context("board check cleared the winner")?;
    if final_winner != winner.id {
        warn!("Board check overturned the result");
    }

    block += 1;
    let payout = game.withdraw(&CallContext::new(final_winner, block))?;

    // Print final results
    info!("=== Match Results ===");
    info!("Winner: {} after {} rounds", payout.to.short(), rounds);
    info!("Payout: {}", payout.amount);

    let events = game.drain_events();
    let shots = events
        .iter()
        .filter(|e| matches!(e.data, GameEventData::ShotConfirmed { .. }))
        .count();
    info!("Events: {} total, {} confirmed shots", events.len(), shots);
    info!("Final State Hash: {}", hex::encode(game.state_hash()));
    drop(game);

    let pruned = registry.prune_settled().await;
    info!("Pruned {} settled game(s), {} remaining", pruned, registry.game_count().await);

    Ok(())
}
