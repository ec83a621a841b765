//! Game Instance
//!
//! The per-match protocol state machine. One `GameInstance` exclusively owns
//! every piece of mutable state for its match; callers reach it only through
//! its id.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ─join─▶ Joined ─2×deposit─▶ BoardsCommitted ─2×commit─▶ Shooting
//!                                                                   │
//!        ┌───────────── forfeit / verified report ◀─────────────────┤
//!        ▼                                                          │ 10th hit
//!    Finished ◀──────────────── board check ◀──────────────── BoardCheck
//! ```
//!
//! Forfeit and verified reports end the game from `Joined` onward. Before
//! shooting, a report targets the player missing a deposit or commitment.
//!
//! Every transition validates completely before touching state, so a
//! rejected call leaves the instance exactly as it was.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::core::hash::{short_hex, DomainHasher, Hash256};
use crate::game::config::GameConfig;
use crate::game::dispute::DisputeClock;
use crate::game::error::GameError;
use crate::game::escrow::Escrow;
use crate::game::events::{GameEvent, GameEventData, WinReason};
use crate::game::ledger::{Shot, ShotLedger};
use crate::proof::board::Salt;
use crate::proof::commitment::BoardCommitment;
use crate::{BOARD_CELLS, MAX_BET, SHIP_CELLS};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique game identifier (UUID as bytes).
pub type GameId = [u8; 16];

/// Authenticated player identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub [u8; 16]);

impl PlayerId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Create from UUID string.
    pub fn from_uuid_str(s: &str) -> Option<Self> {
        uuid::Uuid::parse_str(s)
            .ok()
            .map(|u| Self(*u.as_bytes()))
    }

    /// Convert to UUID string.
    pub fn to_uuid_string(&self) -> String {
        uuid::Uuid::from_bytes(self.0).to_string()
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Short hex prefix for log lines.
    pub fn short(&self) -> String {
        short_hex(&self.0)
    }
}

/// The two seats of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Seat {
    /// Player who created the game. Always shoots first.
    Creator,
    /// Player who joined it.
    Opponent,
}

impl Seat {
    /// Array index of this seat.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Seat::Creator => 0,
            Seat::Opponent => 1,
        }
    }

    /// The other seat.
    #[inline]
    pub fn other(self) -> Seat {
        match self {
            Seat::Creator => Seat::Opponent,
            Seat::Opponent => Seat::Creator,
        }
    }
}

/// Game lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum GamePhase {
    /// Waiting for an opponent.
    Created = 0,
    /// Opponent bound; waiting for both stakes.
    Joined = 1,
    /// Stakes in escrow; waiting for both board roots.
    BoardsCommitted = 2,
    /// Alternating shoot / confirm rounds.
    Shooting = 3,
    /// Provisional winner must prove their own board.
    BoardCheck = 4,
    /// Winner final. Only withdrawal remains.
    Finished = 5,
}

/// Identity and sequence number of an incoming call.
///
/// The host authenticates `sender` and orders calls; `block` grows
/// monotonically across calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Authenticated caller.
    pub sender: PlayerId,
    /// Sequence number of this call.
    pub block: u64,
}

impl CallContext {
    /// Create a call context.
    pub fn new(sender: PlayerId, block: u64) -> Self {
        Self { sender, block }
    }
}

/// Funds released by a withdrawal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient.
    pub to: PlayerId,
    /// Amount released.
    pub amount: u64,
}

// =============================================================================
// GAME INSTANCE
// =============================================================================

/// Per-seat protocol state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct PlayerSlot {
    /// This player's own board root and what has been proven against it.
    commitment: Option<BoardCommitment>,
    /// Shots this player has fired at the other board.
    ledger: ShotLedger,
}

/// State machine for one match.
#[derive(Clone, Debug)]
pub struct GameInstance {
    id: GameId,
    creator: PlayerId,
    opponent: Option<PlayerId>,
    phase: GamePhase,
    turn: Seat,
    slots: [PlayerSlot; 2],
    escrow: Escrow,
    clock: DisputeClock,
    winner: Option<Seat>,
    events: Vec<GameEvent>,
}

impl GameInstance {
    /// Create a game with only creator and bet set.
    pub fn new(
        id: GameId,
        creator: PlayerId,
        agreed_bet: u64,
        config: &GameConfig,
        block: u64,
    ) -> Result<Self, GameError> {
        if agreed_bet > MAX_BET {
            return Err(GameError::BetTooLarge { max: MAX_BET });
        }

        let mut game = Self {
            id,
            creator,
            opponent: None,
            phase: GamePhase::Created,
            turn: Seat::Creator,
            slots: Default::default(),
            escrow: Escrow::new(agreed_bet),
            clock: DisputeClock::new(config.report_threshold),
            winner: None,
            events: Vec::new(),
        };
        game.emit(block, GameEventData::GameCreated { creator, agreed_bet });
        info!(game = %short_hex(&id), creator = %creator.short(), agreed_bet, "Game created");

        Ok(game)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Game identifier.
    pub fn id(&self) -> GameId {
        self.id
    }

    /// Creator.
    pub fn creator(&self) -> PlayerId {
        self.creator
    }

    /// Opponent, once joined.
    pub fn opponent(&self) -> Option<PlayerId> {
        self.opponent
    }

    /// Per-player stake.
    pub fn agreed_bet(&self) -> u64 {
        self.escrow.stake()
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Player whose move is awaited while shooting.
    pub fn turn(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Shooting => self.player(self.turn),
            _ => None,
        }
    }

    /// Winner, once decided (provisional during `BoardCheck`).
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner.and_then(|s| self.player(s))
    }

    /// Escrow state.
    pub fn escrow(&self) -> &Escrow {
        &self.escrow
    }

    /// Dispute clock state.
    pub fn dispute(&self) -> &DisputeClock {
        &self.clock
    }

    /// Shots fired by `player`.
    pub fn shots(&self, player: &PlayerId) -> Option<&[Shot]> {
        let seat = self.seat_of(player)?;
        Some(self.slots[seat.index()].ledger.shots())
    }

    /// Confirmed hits scored by `player`.
    pub fn hits_scored(&self, player: &PlayerId) -> Option<usize> {
        let seat = self.seat_of(player)?;
        Some(self.slots[seat.index()].ledger.hits())
    }

    /// Board commitment published by `player`.
    pub fn commitment(&self, player: &PlayerId) -> Option<&BoardCommitment> {
        let seat = self.seat_of(player)?;
        self.slots[seat.index()].commitment.as_ref()
    }

    /// Whether the game is decided and paid out. No call changes it afterwards.
    pub fn is_settled(&self) -> bool {
        self.phase == GamePhase::Finished && self.escrow.is_paid_out()
    }

    /// Events emitted so far and not yet drained.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Take all pending events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Player sitting in `seat`.
    pub fn player(&self, seat: Seat) -> Option<PlayerId> {
        match seat {
            Seat::Creator => Some(self.creator),
            Seat::Opponent => self.opponent,
        }
    }

    /// Seat of `player`, if they are in this game.
    pub fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        if *player == self.creator {
            Some(Seat::Creator)
        } else if self.opponent.as_ref() == Some(player) {
            Some(Seat::Opponent)
        } else {
            None
        }
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Bind the opponent.
    pub fn join(&mut self, opponent: PlayerId, block: u64) -> Result<(), GameError> {
        if self.opponent.is_some() {
            return Err(GameError::AlreadyJoined);
        }
        self.ensure_phase(GamePhase::Created)?;
        if opponent == self.creator {
            return Err(GameError::SelfJoin);
        }

        self.opponent = Some(opponent);
        self.phase = GamePhase::Joined;
        self.emit(block, GameEventData::PlayerJoined { opponent });
        info!(game = %self.tag(), opponent = %opponent.short(), "Opponent joined");

        Ok(())
    }

    /// Deposit the caller's stake.
    pub fn deposit_bet(&mut self, ctx: &CallContext, amount: u64) -> Result<(), GameError> {
        let seat = self.caller_seat(ctx)?;
        if self.escrow.has_deposited(seat) {
            return Err(GameError::AlreadyDeposited);
        }
        self.ensure_phase(GamePhase::Joined)?;

        self.escrow.deposit(seat, amount)?;
        self.emit(ctx.block, GameEventData::BetDeposited { player: ctx.sender, amount });
        debug!(game = %self.tag(), player = %ctx.sender.short(), amount, "Bet deposited");
        self.note_move(seat, ctx.block);

        if self.escrow.both_deposited() {
            self.phase = GamePhase::BoardsCommitted;
            info!(game = %self.tag(), held = self.escrow.held(), "Both stakes in escrow");
        }

        Ok(())
    }

    /// Publish the caller's board root.
    pub fn commit_board(&mut self, ctx: &CallContext, root: Hash256) -> Result<(), GameError> {
        let seat = self.caller_seat(ctx)?;
        if self.slots[seat.index()].commitment.is_some() {
            return Err(GameError::AlreadyCommitted);
        }
        self.ensure_phase(GamePhase::BoardsCommitted)?;

        self.slots[seat.index()].commitment = Some(BoardCommitment::new(root));
        self.emit(ctx.block, GameEventData::BoardCommitted { player: ctx.sender, root });
        debug!(game = %self.tag(), player = %ctx.sender.short(), root = %short_hex(&root), "Board committed");
        self.note_move(seat, ctx.block);

        if self.slots.iter().all(|s| s.commitment.is_some()) {
            self.phase = GamePhase::Shooting;
            self.turn = Seat::Creator;
            self.emit(ctx.block, GameEventData::ShootingStarted { first: self.creator });
            info!(game = %self.tag(), "Both boards committed, shooting starts");
        }

        Ok(())
    }

    /// Opening shot. Only the creator's first move.
    pub fn shoot(&mut self, ctx: &CallContext, index: u8) -> Result<(), GameError> {
        let seat = self.caller_seat(ctx)?;
        self.ensure_phase(GamePhase::Shooting)?;
        if seat != self.turn {
            return Err(GameError::WrongCaller);
        }
        if self.slots.iter().any(|s| !s.ledger.is_empty()) {
            return Err(GameError::InvalidState(self.phase));
        }
        self.slots[seat.index()].ledger.check_target(index)?;

        self.slots[seat.index()].ledger.record(index)?;
        self.emit(ctx.block, GameEventData::ShotFired { shooter: ctx.sender, index });
        self.note_move(seat, ctx.block);
        self.turn = seat.other();
        debug!(game = %self.tag(), shooter = %ctx.sender.short(), index, "Opening shot");

        Ok(())
    }

    /// Prove the content of the opponent's pending shot, then fire back.
    ///
    /// If the reveal gives the opponent their tenth hit, the opponent
    /// becomes provisional winner and `next_index` is ignored.
    /// Returns whether the confirmed shot was a hit.
    pub fn confirm_and_shoot(
        &mut self,
        ctx: &CallContext,
        index: u8,
        is_ship: bool,
        salt: &Salt,
        proof: &[Hash256],
        next_index: u8,
    ) -> Result<bool, GameError> {
        let seat = self.caller_seat(ctx)?;
        self.ensure_phase(GamePhase::Shooting)?;
        if seat != self.turn {
            return Err(GameError::WrongCaller);
        }

        let shooter = seat.other();
        let pending = self.slots[shooter.index()]
            .ledger
            .pending()
            .ok_or(GameError::InvalidState(self.phase))?;
        if index != pending {
            return Err(GameError::ShotMismatch { expected: pending, got: index });
        }

        let commitment = self.slots[seat.index()]
            .commitment
            .as_ref()
            .ok_or(GameError::InvalidState(self.phase))?;
        if let Err(e) = commitment.check_reveal(index, is_ship, salt, proof) {
            warn!(game = %self.tag(), player = %ctx.sender.short(), index, error = %e, "Reveal rejected");
            return Err(e.into());
        }

        let shooter_ledger = &self.slots[shooter.index()].ledger;
        let hits_after = shooter_ledger.hits() + is_ship as usize;
        let sunk = hits_after >= SHIP_CELLS;
        // Every cell of this board revealed with fewer than ten ships.
        let exhausted = !sunk && shooter_ledger.len() == BOARD_CELLS;
        if !sunk && !exhausted {
            self.slots[seat.index()].ledger.check_target(next_index)?;
        }

        // Validation done; apply.
        let phase = self.phase;
        let hit = match self.slots[seat.index()].commitment.as_mut() {
            Some(c) => c.reveal(index, is_ship, salt, proof)?,
            None => return Err(GameError::InvalidState(phase)),
        };
        self.slots[shooter.index()].ledger.resolve(hit);
        let shooter_id = self.player_or_default(shooter);
        self.emit(ctx.block, GameEventData::ShotConfirmed { shooter: shooter_id, index, hit });
        debug!(game = %self.tag(), shooter = %shooter_id.short(), index, hit, hits = hits_after, "Shot confirmed");
        self.note_move(seat, ctx.block);

        if sunk || exhausted {
            let reason = if sunk { WinReason::AllShipsSunk } else { WinReason::IllegalBoard };
            self.decide(shooter, reason, GamePhase::BoardCheck, ctx.block);
            return Ok(hit);
        }

        self.slots[seat.index()].ledger.record(next_index)?;
        self.emit(ctx.block, GameEventData::ShotFired { shooter: ctx.sender, index: next_index });
        self.turn = shooter;

        Ok(hit)
    }

    /// Provisional winner proves every cell of their own board the
    /// opponent never shot.
    ///
    /// If the proof is valid but the board does not hold exactly ten
    /// ships, the caller committed an illegal board and loses.
    pub fn board_check(
        &mut self,
        ctx: &CallContext,
        indexes: &[u8],
        cells: &[bool],
        salts: &[Salt],
        proof: &[Hash256],
        proof_flags: &[bool],
    ) -> Result<(), GameError> {
        let seat = self.caller_seat(ctx)?;
        self.ensure_phase(GamePhase::BoardCheck)?;
        if self.winner != Some(seat) {
            return Err(GameError::WrongCaller);
        }

        let shot: BTreeSet<u8> = self.slots[seat.other().index()].ledger.indices();
        let commitment = self.slots[seat.index()]
            .commitment
            .as_ref()
            .ok_or(GameError::InvalidState(self.phase))?;

        let check = match commitment.final_check(&shot, indexes, cells, salts, proof, proof_flags) {
            Ok(c) => c,
            Err(e) => {
                warn!(game = %self.tag(), player = %ctx.sender.short(), error = %e, "Board check rejected");
                return Err(e.into());
            }
        };
        let ships = commitment.ships_revealed() as usize + check.ships_proven;

        self.emit(ctx.block, GameEventData::BoardChecked {
            player: ctx.sender,
            ships_proven: ships.min(u8::MAX as usize) as u8,
        });

        if ships == SHIP_CELLS {
            self.phase = GamePhase::Finished;
            info!(game = %self.tag(), winner = %ctx.sender.short(), "Board check passed, game finished");
        } else {
            warn!(game = %self.tag(), player = %ctx.sender.short(), ships, "Committed board is illegal");
            self.decide(seat.other(), WinReason::IllegalBoard, GamePhase::Finished, ctx.block);
        }

        Ok(())
    }

    /// Release the escrow to the winner.
    pub fn withdraw(&mut self, ctx: &CallContext) -> Result<Payout, GameError> {
        let seat = self.caller_seat(ctx)?;
        let winner = self.winner.ok_or(GameError::NotResolved)?;
        self.ensure_phase(GamePhase::Finished)?;
        if seat != winner {
            return Err(GameError::WrongCaller);
        }

        let amount = self.escrow.payout()?;
        self.emit(ctx.block, GameEventData::Withdrawn { winner: ctx.sender, amount });
        info!(game = %self.tag(), winner = %ctx.sender.short(), amount, "Escrow paid out");

        Ok(Payout { to: ctx.sender, amount })
    }

    /// Start the timeout against an opponent who owes a move.
    ///
    /// Before shooting, the owed move is the missing deposit or board
    /// commitment; the reporter must already have made theirs.
    pub fn report(&mut self, ctx: &CallContext) -> Result<(), GameError> {
        let seat = self.caller_seat(ctx)?;
        if self.owes_move(seat)? || !self.owes_move(seat.other())? {
            return Err(GameError::WrongCaller);
        }

        self.clock.open(seat, ctx.block)?;
        self.emit(ctx.block, GameEventData::Reported { reporter: ctx.sender });
        info!(game = %self.tag(), reporter = %ctx.sender.short(), block = ctx.block, "Opponent reported");

        Ok(())
    }

    /// Finalize a report whose window has elapsed. The reporter wins.
    pub fn verify_report(&mut self, ctx: &CallContext) -> Result<(), GameError> {
        self.caller_seat(ctx)?;
        if !matches!(
            self.phase,
            GamePhase::Joined | GamePhase::BoardsCommitted | GamePhase::Shooting
        ) {
            return Err(GameError::InvalidState(self.phase));
        }

        let reporter = self.clock.check_verify(ctx.block)?;
        self.decide(reporter, WinReason::Timeout, GamePhase::Finished, ctx.block);

        Ok(())
    }

    /// Concede. The other player wins immediately.
    pub fn forfeit(&mut self, ctx: &CallContext) -> Result<(), GameError> {
        let seat = self.caller_seat(ctx)?;
        if self.winner.is_some() || self.phase == GamePhase::Created {
            return Err(GameError::InvalidState(self.phase));
        }

        self.decide(seat.other(), WinReason::Forfeit, GamePhase::Finished, ctx.block);

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Snapshot
    // -------------------------------------------------------------------------

    /// Observable state in its persisted layout.
    pub fn snapshot(&self) -> GameSnapshot {
        let [creator, opponent] = &self.slots;
        let report = self.clock.report();

        GameSnapshot {
            id: self.id,
            creator: self.creator,
            opponent: self.opponent,
            agreed_bet: self.escrow.stake(),
            phase: self.phase,
            turn: self.turn(),
            root_creator: creator.commitment.as_ref().map(|c| *c.root()),
            root_opponent: opponent.commitment.as_ref().map(|c| *c.root()),
            shots_creator: creator.ledger.shots().to_vec(),
            shots_opponent: opponent.ledger.shots().to_vec(),
            deposited_creator: self.escrow.has_deposited(Seat::Creator),
            deposited_opponent: self.escrow.has_deposited(Seat::Opponent),
            paid_out: self.escrow.is_paid_out(),
            winner: self.winner(),
            reported_by: report.and_then(|r| self.player(r.reported_by)),
            report_block: report.map(|r| r.block),
        }
    }

    /// Integrity hash over the observable state.
    pub fn state_hash(&self) -> Hash256 {
        self.snapshot().compute_hash()
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn tag(&self) -> String {
        short_hex(&self.id)
    }

    fn caller_seat(&self, ctx: &CallContext) -> Result<Seat, GameError> {
        self.seat_of(&ctx.sender).ok_or(GameError::WrongCaller)
    }

    fn ensure_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase != expected {
            return Err(GameError::InvalidState(self.phase));
        }
        Ok(())
    }

    fn player_or_default(&self, seat: Seat) -> PlayerId {
        self.player(seat).unwrap_or_default()
    }

    fn emit(&mut self, block: u64, data: GameEventData) {
        self.events.push(GameEvent::new(self.id, block, data));
    }

    /// Whether `seat` is the one holding up the game. Only defined in the
    /// phases where a report can be raised.
    fn owes_move(&self, seat: Seat) -> Result<bool, GameError> {
        match self.phase {
            GamePhase::Joined => Ok(!self.escrow.has_deposited(seat)),
            GamePhase::BoardsCommitted => Ok(self.slots[seat.index()].commitment.is_none()),
            GamePhase::Shooting => Ok(seat == self.turn),
            phase => Err(GameError::InvalidState(phase)),
        }
    }

    /// A move by `actor` proves liveness and clears a report aimed at them.
    fn note_move(&mut self, actor: Seat, block: u64) {
        if let Some(cleared) = self.clock.on_move(actor) {
            let reporter = self.player_or_default(cleared.reported_by);
            self.emit(block, GameEventData::ReportCleared { reporter });
            debug!(game = %self.tag(), reporter = %reporter.short(), "Report cleared");
        }
    }

    fn decide(&mut self, winner: Seat, reason: WinReason, phase: GamePhase, block: u64) {
        self.winner = Some(winner);
        self.phase = phase;
        self.clock.clear();
        let winner_id = self.player_or_default(winner);
        self.emit(block, GameEventData::GameWon { winner: winner_id, reason });
        info!(game = %self.tag(), winner = %winner_id.short(), ?reason, ?phase, "Winner decided");
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Read-only view of a game in its persisted layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Game identifier.
    pub id: GameId,
    /// Creator.
    pub creator: PlayerId,
    /// Opponent, once joined.
    pub opponent: Option<PlayerId>,
    /// Per-player stake.
    pub agreed_bet: u64,
    /// Phase.
    pub phase: GamePhase,
    /// Player to move while shooting.
    pub turn: Option<PlayerId>,
    /// Creator's board root.
    pub root_creator: Option<Hash256>,
    /// Opponent's board root.
    pub root_opponent: Option<Hash256>,
    /// Shots fired by the creator.
    pub shots_creator: Vec<Shot>,
    /// Shots fired by the opponent.
    pub shots_opponent: Vec<Shot>,
    /// Creator's stake deposited.
    pub deposited_creator: bool,
    /// Opponent's stake deposited.
    pub deposited_opponent: bool,
    /// Escrow released.
    pub paid_out: bool,
    /// Winner.
    pub winner: Option<PlayerId>,
    /// Reporter of a pending report.
    pub reported_by: Option<PlayerId>,
    /// Sequence number of a pending report.
    pub report_block: Option<u64>,
}

impl GameSnapshot {
    /// Serialize to JSON for UIs.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to compact binary.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from compact binary.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }

    /// Integrity hash. Field order is part of the encoding.
    pub fn compute_hash(&self) -> Hash256 {
        let mut h = DomainHasher::for_game_state();
        h.update_bytes(&self.id);
        h.update_bytes(self.creator.as_bytes());
        hash_opt_player(&mut h, self.opponent.as_ref());
        h.update_u64(self.agreed_bet);
        h.update_u8(self.phase as u8);
        hash_opt_player(&mut h, self.turn.as_ref());
        h.update_opt_hash(self.root_creator.as_ref());
        h.update_opt_hash(self.root_opponent.as_ref());
        for shots in [&self.shots_creator, &self.shots_opponent] {
            h.update_u64(shots.len() as u64);
            for shot in shots.iter() {
                h.update_u8(shot.index);
                h.update_u8(shot.outcome as u8);
            }
        }
        h.update_bool(self.deposited_creator);
        h.update_bool(self.deposited_opponent);
        h.update_bool(self.paid_out);
        hash_opt_player(&mut h, self.winner.as_ref());
        hash_opt_player(&mut h, self.reported_by.as_ref());
        match self.report_block {
            Some(b) => {
                h.update_u8(1);
                h.update_u64(b);
            }
            None => h.update_u8(0),
        }
        h.finalize()
    }
}

fn hash_opt_player(h: &mut DomainHasher, player: Option<&PlayerId>) {
    match player {
        Some(p) => {
            h.update_u8(1);
            h.update_bytes(p.as_bytes());
        }
        None => h.update_u8(0),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ledger::ShotOutcome;
    use crate::proof::board::{Board, Cell};
    use crate::proof::commitment::CommitmentError;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    const A: PlayerId = PlayerId::new([0xA; 16]);
    const B: PlayerId = PlayerId::new([0xB; 16]);
    const STRANGER: PlayerId = PlayerId::new([0xC; 16]);
    const BET: u64 = 100;

    /// Creator's ships.
    const SHIPS_A: [u8; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];
    /// Opponent's ships.
    const SHIPS_B: [u8; 10] = [20, 21, 22, 23, 24, 25, 26, 27, 28, 29];

    struct Match {
        game: GameInstance,
        board_a: Board,
        board_b: Board,
        block: u64,
    }

    impl Match {
        fn ctx(&mut self, who: PlayerId) -> CallContext {
            self.block += 1;
            CallContext::new(who, self.block)
        }

        fn board(&self, who: PlayerId) -> &Board {
            if who == A { &self.board_a } else { &self.board_b }
        }

        /// `who` confirms the pending shot against their own board and fires at `next`.
        fn confirm(&mut self, who: PlayerId, next: u8) -> Result<bool, GameError> {
            let other = if who == A { B } else { A };
            let pending = self.game.shots(&other).unwrap().last().unwrap().index;
            let r = self.board(who).reveal(pending).unwrap();
            let ctx = self.ctx(who);
            self.game.confirm_and_shoot(&ctx, r.index, r.is_ship, &r.salt, &r.proof, next)
        }

        fn board_check(&mut self, who: PlayerId) -> Result<(), GameError> {
            let other = if who == A { B } else { A };
            let shot: BTreeSet<u8> = self.game.shots(&other).unwrap().iter().map(|s| s.index).collect();
            let bp = self.board(who).unshot_proof(&shot);
            let ctx = self.ctx(who);
            self.game.board_check(&ctx, &bp.indexes, &bp.cells, &bp.salts, &bp.proof, &bp.proof_flags)
        }
    }

    fn new_game() -> GameInstance {
        GameInstance::new([1; 16], A, BET, &GameConfig::default(), 0).unwrap()
    }

    fn boards(seed: u64) -> (Board, Board) {
        let mut rng = StdRng::seed_from_u64(seed);
        (
            Board::random(&SHIPS_A, &mut rng).unwrap(),
            Board::random(&SHIPS_B, &mut rng).unwrap(),
        )
    }

    fn started_with(board_a: Board, board_b: Board) -> Match {
        let mut m = Match { game: new_game(), board_a, board_b, block: 0 };
        m.game.join(B, 1).unwrap();
        for p in [A, B] {
            let ctx = m.ctx(p);
            m.game.deposit_bet(&ctx, BET).unwrap();
        }
        let (ra, rb) = (m.board_a.root(), m.board_b.root());
        let ctx = m.ctx(A);
        m.game.commit_board(&ctx, ra).unwrap();
        let ctx = m.ctx(B);
        m.game.commit_board(&ctx, rb).unwrap();
        m
    }

    fn started() -> Match {
        let (a, b) = boards(99);
        started_with(a, b)
    }

    /// Play until A has scored ten hits on B. B only ever shoots A's empty cells.
    fn play_to_a_win(m: &mut Match) {
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, SHIPS_B[0]).unwrap();
        for k in 0..SHIP_CELLS {
            // B's k-th return shot lands on A's empty cells 30..
            let hit = m.confirm(B, 30 + k as u8).unwrap();
            assert!(hit);
            if m.game.winner().is_some() {
                break;
            }
            m.confirm(A, SHIPS_B[k + 1]).unwrap();
        }
    }

    fn assert_unchanged(m: &Match, before: &GameSnapshot, events_before: usize) {
        assert_eq!(&m.game.snapshot(), before);
        assert_eq!(m.game.events().len(), events_before);
    }

    #[test]
    fn test_player_id_uuid() {
        let s = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let id = PlayerId::from_uuid_str(s).unwrap();
        assert_eq!(id.to_uuid_string(), s);
        assert_eq!(id.short(), "67e55044");
        assert!(PlayerId::from_uuid_str("not-a-uuid").is_none());
    }

    #[test]
    fn test_seats() {
        assert_eq!(Seat::Creator.other(), Seat::Opponent);
        assert_eq!(Seat::Opponent.index(), 1);
    }

    // -------------------------------------------------------------------------
    // Setup phases
    // -------------------------------------------------------------------------

    #[test]
    fn test_lifecycle_to_shooting() {
        let m = started();
        assert_eq!(m.game.phase(), GamePhase::Shooting);
        assert_eq!(m.game.turn(), Some(A));
        assert_eq!(m.game.escrow().held(), 2 * BET);
        assert_eq!(m.game.commitment(&B).unwrap().root(), &m.board_b.root());
    }

    #[test]
    fn test_join_rules() {
        let mut game = new_game();
        assert_eq!(game.join(A, 1), Err(GameError::SelfJoin));
        game.join(B, 1).unwrap();
        assert_eq!(game.join(STRANGER, 2), Err(GameError::AlreadyJoined));
        assert_eq!(game.opponent(), Some(B));
    }

    #[test]
    fn test_oversized_bet_rejected() {
        let err = GameInstance::new([1; 16], A, MAX_BET + 1, &GameConfig::default(), 0).unwrap_err();
        assert_eq!(err, GameError::BetTooLarge { max: MAX_BET });
    }

    #[test]
    fn test_deposit_rules() {
        let mut game = new_game();
        let ctx = CallContext::new(A, 1);
        assert_eq!(game.deposit_bet(&ctx, BET), Err(GameError::InvalidState(GamePhase::Created)));

        game.join(B, 1).unwrap();
        assert_eq!(
            game.deposit_bet(&ctx, BET - 1),
            Err(GameError::WrongAmount { expected: BET, got: BET - 1 })
        );
        assert_eq!(
            game.deposit_bet(&CallContext::new(STRANGER, 2), BET),
            Err(GameError::WrongCaller)
        );

        game.deposit_bet(&ctx, BET).unwrap();
        assert_eq!(game.deposit_bet(&ctx, BET), Err(GameError::AlreadyDeposited));
        assert_eq!(game.phase(), GamePhase::Joined);

        game.deposit_bet(&CallContext::new(B, 3), BET).unwrap();
        assert_eq!(game.phase(), GamePhase::BoardsCommitted);

        // Replay after the phase moved on still reports the real cause
        assert_eq!(game.deposit_bet(&ctx, BET), Err(GameError::AlreadyDeposited));
    }

    #[test]
    fn test_commit_rules() {
        let mut game = new_game();
        game.join(B, 1).unwrap();
        let ctx_a = CallContext::new(A, 2);
        assert_eq!(game.commit_board(&ctx_a, [1; 32]), Err(GameError::InvalidState(GamePhase::Joined)));

        game.deposit_bet(&ctx_a, BET).unwrap();
        game.deposit_bet(&CallContext::new(B, 3), BET).unwrap();

        game.commit_board(&ctx_a, [1; 32]).unwrap();
        assert_eq!(game.commit_board(&ctx_a, [2; 32]), Err(GameError::AlreadyCommitted));
        assert_eq!(game.commitment(&A).unwrap().root(), &[1; 32]);

        game.commit_board(&CallContext::new(B, 4), [3; 32]).unwrap();
        assert_eq!(game.phase(), GamePhase::Shooting);
        assert_eq!(game.commit_board(&ctx_a, [2; 32]), Err(GameError::AlreadyCommitted));
    }

    // -------------------------------------------------------------------------
    // Shooting
    // -------------------------------------------------------------------------

    #[test]
    fn test_opening_round_scenario() {
        let mut m = started();

        let ctx = m.ctx(A);
        m.game.shoot(&ctx, 5).unwrap();
        assert_eq!(m.game.turn(), Some(B));

        let hit = m.confirm(B, 7).unwrap();
        assert!(!hit);

        assert_eq!(
            m.game.shots(&A).unwrap(),
            &[Shot { index: 5, outcome: ShotOutcome::Miss }]
        );
        assert_eq!(
            m.game.shots(&B).unwrap(),
            &[Shot { index: 7, outcome: ShotOutcome::Pending }]
        );
        assert_eq!(m.game.turn(), Some(A));
        assert!(m.game.commitment(&B).unwrap().is_revealed(5));
    }

    #[test]
    fn test_only_turn_holder_moves() {
        let mut m = started();
        let ctx = m.ctx(B);
        assert_eq!(m.game.shoot(&ctx, 5), Err(GameError::WrongCaller));

        let ctx = m.ctx(A);
        m.game.shoot(&ctx, 5).unwrap();

        // Bare shoot is only the opening move
        let ctx = m.ctx(B);
        assert_eq!(m.game.shoot(&ctx, 6), Err(GameError::InvalidState(GamePhase::Shooting)));

        // A cannot confirm its own shot
        let r = m.board_a.reveal(5).unwrap();
        let ctx = m.ctx(A);
        assert_eq!(
            m.game.confirm_and_shoot(&ctx, 5, r.is_ship, &r.salt, &r.proof, 9),
            Err(GameError::WrongCaller)
        );
        let ctx = m.ctx(STRANGER);
        assert_eq!(m.game.report(&ctx), Err(GameError::WrongCaller));
    }

    #[test]
    fn test_confirm_wrong_index_rejected() {
        let mut m = started();
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, 5).unwrap();

        let before = m.game.snapshot();
        let events = m.game.events().len();
        let r = m.board_b.reveal(6).unwrap();
        let ctx = m.ctx(B);
        assert_eq!(
            m.game.confirm_and_shoot(&ctx, r.index, r.is_ship, &r.salt, &r.proof, 7),
            Err(GameError::ShotMismatch { expected: 5, got: 6 })
        );
        assert_unchanged(&m, &before, events);
    }

    #[test]
    fn test_lying_reveal_rejected_atomically() {
        let mut m = started();
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, SHIPS_B[0]).unwrap();

        let before = m.game.snapshot();
        let hash_before = m.game.state_hash();
        let events = m.game.events().len();

        // B claims a miss on a ship cell
        let r = m.board_b.reveal(SHIPS_B[0]).unwrap();
        let ctx = m.ctx(B);
        assert_eq!(
            m.game.confirm_and_shoot(&ctx, r.index, false, &r.salt, &r.proof, 7),
            Err(GameError::Commitment(CommitmentError::InvalidProof))
        );
        assert_unchanged(&m, &before, events);
        assert_eq!(m.game.state_hash(), hash_before);
        assert!(!m.game.commitment(&B).unwrap().is_revealed(SHIPS_B[0]));
    }

    #[test]
    fn test_bad_next_shot_does_not_apply_reveal() {
        let mut m = started();
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, 40).unwrap();
        m.confirm(B, 41).unwrap();
        m.confirm(A, 42).unwrap();

        // B re-targets 41
        let before = m.game.snapshot();
        let events = m.game.events().len();
        assert_eq!(m.confirm(B, 41), Err(GameError::IndexReused(41)));
        assert_eq!(m.confirm(B, 64), Err(GameError::IndexOutOfRange(64)));
        assert_unchanged(&m, &before, events);
        assert!(!m.game.commitment(&B).unwrap().is_revealed(42));

        m.confirm(B, 43).unwrap();
        assert_eq!(m.game.turn(), Some(A));
    }

    #[test]
    fn test_ten_hits_wins_then_check_then_withdraw() {
        let mut m = started();
        play_to_a_win(&mut m);

        assert_eq!(m.game.winner(), Some(A));
        assert_eq!(m.game.phase(), GamePhase::BoardCheck);
        assert_eq!(m.game.hits_scored(&A), Some(10));
        assert!(!m.game.escrow().is_paid_out());
        // B's final confirmation did not fire a shot
        assert_eq!(m.game.shots(&B).unwrap().len(), 9);

        // No payout before the board check
        let ctx = m.ctx(A);
        assert_eq!(m.game.withdraw(&ctx), Err(GameError::InvalidState(GamePhase::BoardCheck)));
        // Only the provisional winner checks
        assert_eq!(m.board_check(B), Err(GameError::WrongCaller));
        // Winner is set, so no forfeit
        let ctx = m.ctx(B);
        assert_eq!(m.game.forfeit(&ctx), Err(GameError::InvalidState(GamePhase::BoardCheck)));

        m.board_check(A).unwrap();
        assert_eq!(m.game.phase(), GamePhase::Finished);
        assert_eq!(m.game.winner(), Some(A));

        let ctx = m.ctx(B);
        assert_eq!(m.game.withdraw(&ctx), Err(GameError::WrongCaller));

        let ctx = m.ctx(A);
        assert_eq!(m.game.withdraw(&ctx), Ok(Payout { to: A, amount: 2 * BET }));
        assert!(m.game.escrow().is_paid_out());
        assert_eq!(m.game.escrow().held(), 0);
        assert!(m.game.is_settled());

        let ctx = m.ctx(A);
        assert_eq!(m.game.withdraw(&ctx), Err(GameError::AlreadyPaid));
    }

    #[test]
    fn test_tenth_hit_wins_on_revealing_call() {
        let mut m = started();
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, SHIPS_B[0]).unwrap();
        for k in 0..9 {
            m.confirm(B, 30 + k as u8).unwrap();
            m.confirm(A, SHIPS_B[k + 1]).unwrap();
            assert_eq!(m.game.winner(), None);
        }
        assert_eq!(m.game.hits_scored(&A), Some(9));

        m.confirm(B, 50).unwrap();
        assert_eq!(m.game.winner(), Some(A));
        assert!(m.game.events().iter().any(|e| matches!(
            e.data,
            GameEventData::GameWon { winner, reason: WinReason::AllShipsSunk } if winner == A
        )));
    }

    #[test]
    fn test_board_check_bad_proof_rejected() {
        let mut m = started();
        play_to_a_win(&mut m);

        let shot: BTreeSet<u8> = m.game.shots(&B).unwrap().iter().map(|s| s.index).collect();
        let mut bp = m.board_a.unshot_proof(&shot);
        let pos = bp.indexes.iter().position(|i| *i == 0).unwrap();
        bp.cells[pos] = false;

        let before = m.game.snapshot();
        let events = m.game.events().len();
        let ctx = m.ctx(A);
        assert_eq!(
            m.game.board_check(&ctx, &bp.indexes, &bp.cells, &bp.salts, &bp.proof, &bp.proof_flags),
            Err(GameError::Commitment(CommitmentError::InvalidProof))
        );
        assert_unchanged(&m, &before, events);
    }

    #[test]
    fn test_illegal_winner_board_loses_on_check() {
        // A commits a board with only nine ships
        let mut rng = StdRng::seed_from_u64(5);
        let cells: Vec<Cell> = (0..64u8)
            .map(|i| Cell { index: i, is_ship: i < 9, salt: rand::Rng::gen(&mut rng) })
            .collect();
        let board_a = Board::from_cells_unchecked(cells).unwrap();
        let board_b = Board::random(&SHIPS_B, &mut rng).unwrap();

        let mut m = started_with(board_a, board_b);
        play_to_a_win(&mut m);
        assert_eq!(m.game.winner(), Some(A));

        m.board_check(A).unwrap();
        assert_eq!(m.game.phase(), GamePhase::Finished);
        assert_eq!(m.game.winner(), Some(B));

        let ctx = m.ctx(B);
        assert_eq!(m.game.withdraw(&ctx).unwrap().amount, 2 * BET);
    }

    #[test]
    fn test_exhausted_board_exposes_missing_ships() {
        // B hides only nine ships, so A can never reach ten hits
        let mut rng = StdRng::seed_from_u64(11);
        let board_a = Board::random(&SHIPS_A, &mut rng).unwrap();
        let cells: Vec<Cell> = (0..64u8)
            .map(|i| Cell { index: i, is_ship: (20..29).contains(&i), salt: rand::Rng::gen(&mut rng) })
            .collect();
        let board_b = Board::from_cells_unchecked(cells).unwrap();
        let mut m = started_with(board_a, board_b);

        // B shoots A's 54 empty cells then nine of A's ships
        let b_targets: Vec<u8> = (10..64u8).chain(0..9u8).collect();
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, 0).unwrap();
        for (k, &b_next) in b_targets.iter().enumerate() {
            m.confirm(B, b_next).unwrap();
            m.confirm(A, (k + 1) as u8).unwrap();
        }
        assert_eq!(m.game.shots(&A).unwrap().len(), 64);
        assert_eq!(m.game.winner(), None);

        // B's confirmation of A's last shot reveals the whole board
        m.confirm(B, 9).unwrap();
        assert_eq!(m.game.winner(), Some(A));
        assert_eq!(m.game.hits_scored(&A), Some(9));
        assert_eq!(m.game.phase(), GamePhase::BoardCheck);

        m.board_check(A).unwrap();
        assert_eq!(m.game.winner(), Some(A));
        assert_eq!(m.game.phase(), GamePhase::Finished);
    }

    // -------------------------------------------------------------------------
    // Disputes
    // -------------------------------------------------------------------------

    /// A opens, B answers; now A owes a move and B may report.
    fn waiting_on_a() -> Match {
        let mut m = started();
        let ctx = m.ctx(A);
        m.game.shoot(&ctx, 40).unwrap();
        m.confirm(B, 41).unwrap();
        m
    }

    #[test]
    fn test_report_timeout_scenario() {
        let mut m = waiting_on_a();
        let report_block = 100;
        m.game.report(&CallContext::new(B, report_block)).unwrap();
        assert_eq!(m.game.snapshot().reported_by, Some(B));
        assert_eq!(m.game.snapshot().report_block, Some(report_block));

        assert_eq!(
            m.game.verify_report(&CallContext::new(B, report_block + 4)),
            Err(GameError::TooEarly { ready_at: report_block + 5 })
        );
        m.game.verify_report(&CallContext::new(B, report_block + 5)).unwrap();
        assert_eq!(m.game.winner(), Some(B));
        assert_eq!(m.game.phase(), GamePhase::Finished);
        assert_eq!(m.game.snapshot().reported_by, None);

        let payout = m.game.withdraw(&CallContext::new(B, report_block + 6)).unwrap();
        assert_eq!(payout, Payout { to: B, amount: 2 * BET });
    }

    #[test]
    fn test_turn_holder_cannot_report() {
        let mut m = waiting_on_a();
        assert_eq!(m.game.report(&CallContext::new(A, 50)), Err(GameError::WrongCaller));
    }

    #[test]
    fn test_report_outside_live_phases_rejected() {
        let mut game = new_game();
        assert_eq!(
            game.report(&CallContext::new(A, 1)),
            Err(GameError::InvalidState(GamePhase::Created))
        );
        assert_eq!(
            game.verify_report(&CallContext::new(A, 1)),
            Err(GameError::InvalidState(GamePhase::Created))
        );

        let mut m = started();
        play_to_a_win(&mut m);
        let ctx = m.ctx(B);
        assert_eq!(m.game.report(&ctx), Err(GameError::InvalidState(GamePhase::BoardCheck)));
        let ctx = m.ctx(B);
        assert_eq!(m.game.verify_report(&ctx), Err(GameError::InvalidState(GamePhase::BoardCheck)));
    }

    #[test]
    fn test_report_missing_deposit() {
        let mut game = new_game();
        game.join(B, 1).unwrap();

        // Nobody has deposited, so nobody is ahead
        assert_eq!(game.report(&CallContext::new(A, 2)), Err(GameError::WrongCaller));

        game.deposit_bet(&CallContext::new(A, 3), BET).unwrap();
        assert_eq!(game.report(&CallContext::new(B, 4)), Err(GameError::WrongCaller));
        game.report(&CallContext::new(A, 4)).unwrap();

        assert_eq!(
            game.verify_report(&CallContext::new(A, 8)),
            Err(GameError::TooEarly { ready_at: 9 })
        );
        game.verify_report(&CallContext::new(A, 9)).unwrap();
        assert_eq!(game.winner(), Some(A));
        assert_eq!(game.phase(), GamePhase::Finished);

        // The staller never gets the honest player's stake
        assert_eq!(game.withdraw(&CallContext::new(B, 10)), Err(GameError::WrongCaller));
        assert_eq!(
            game.withdraw(&CallContext::new(A, 10)),
            Ok(Payout { to: A, amount: BET })
        );
    }

    #[test]
    fn test_deposit_clears_report() {
        let mut game = new_game();
        game.join(B, 1).unwrap();
        game.deposit_bet(&CallContext::new(A, 2), BET).unwrap();
        game.report(&CallContext::new(A, 3)).unwrap();

        game.deposit_bet(&CallContext::new(B, 5), BET).unwrap();
        assert_eq!(game.phase(), GamePhase::BoardsCommitted);
        assert_eq!(game.snapshot().reported_by, None);
        assert_eq!(game.verify_report(&CallContext::new(A, 20)), Err(GameError::NoReport));
    }

    #[test]
    fn test_report_missing_commitment() {
        let mut game = new_game();
        game.join(B, 1).unwrap();
        game.deposit_bet(&CallContext::new(A, 2), BET).unwrap();
        game.deposit_bet(&CallContext::new(B, 3), BET).unwrap();

        assert_eq!(game.report(&CallContext::new(A, 4)), Err(GameError::WrongCaller));
        game.commit_board(&CallContext::new(A, 4), [1; 32]).unwrap();
        assert_eq!(game.report(&CallContext::new(B, 5)), Err(GameError::WrongCaller));
        game.report(&CallContext::new(A, 5)).unwrap();

        game.verify_report(&CallContext::new(A, 10)).unwrap();
        assert_eq!(game.winner(), Some(A));
        assert_eq!(game.withdraw(&CallContext::new(A, 11)).unwrap().amount, 2 * BET);
    }

    #[test]
    fn test_commit_clears_report() {
        let mut game = new_game();
        game.join(B, 1).unwrap();
        game.deposit_bet(&CallContext::new(A, 2), BET).unwrap();
        game.deposit_bet(&CallContext::new(B, 3), BET).unwrap();
        game.commit_board(&CallContext::new(B, 4), [2; 32]).unwrap();
        game.report(&CallContext::new(B, 5)).unwrap();

        game.commit_board(&CallContext::new(A, 7), [1; 32]).unwrap();
        assert_eq!(game.phase(), GamePhase::Shooting);
        assert_eq!(game.snapshot().reported_by, None);
        assert!(game.events().iter().any(|e| matches!(e.data, GameEventData::ReportCleared { reporter } if reporter == B)));
        assert_eq!(game.verify_report(&CallContext::new(B, 20)), Err(GameError::NoReport));
    }

    #[test]
    fn test_opening_shot_clears_report() {
        let mut m = started();
        // A owes the opening shot
        let ctx = m.ctx(A);
        assert_eq!(m.game.report(&ctx), Err(GameError::WrongCaller));
        m.game.report(&CallContext::new(B, 50)).unwrap();

        m.game.shoot(&CallContext::new(A, 52), 5).unwrap();
        assert_eq!(m.game.snapshot().reported_by, None);
        assert_eq!(m.game.verify_report(&CallContext::new(B, 60)), Err(GameError::NoReport));
        assert_eq!(m.game.turn(), Some(B));
    }

    #[test]
    fn test_move_clears_report() {
        let mut m = waiting_on_a();
        m.game.report(&CallContext::new(B, 100)).unwrap();
        let ctx = m.ctx(B);
        assert_eq!(m.game.report(&ctx), Err(GameError::AlreadyReported));

        m.block = 102;
        m.confirm(A, 42).unwrap();
        assert_eq!(m.game.snapshot().reported_by, None);
        assert!(m.game.events().iter().any(|e| matches!(e.data, GameEventData::ReportCleared { reporter } if reporter == B)));

        assert_eq!(m.game.verify_report(&CallContext::new(B, 200)), Err(GameError::NoReport));
        assert_eq!(m.game.winner(), None);
    }

    #[test]
    fn test_forfeit() {
        let mut game = new_game();
        assert_eq!(
            game.forfeit(&CallContext::new(A, 1)),
            Err(GameError::InvalidState(GamePhase::Created))
        );

        game.join(B, 1).unwrap();
        game.deposit_bet(&CallContext::new(A, 2), BET).unwrap();
        game.forfeit(&CallContext::new(A, 3)).unwrap();
        assert_eq!(game.winner(), Some(B));
        assert_eq!(game.phase(), GamePhase::Finished);

        assert_eq!(
            game.forfeit(&CallContext::new(B, 4)),
            Err(GameError::InvalidState(GamePhase::Finished))
        );
        // Only A's stake was ever deposited
        assert_eq!(game.withdraw(&CallContext::new(B, 5)).unwrap().amount, BET);
    }

    #[test]
    fn test_withdraw_without_winner() {
        let mut m = started();
        let ctx = m.ctx(A);
        assert_eq!(m.game.withdraw(&ctx), Err(GameError::NotResolved));
    }

    // -------------------------------------------------------------------------
    // Snapshot & events
    // -------------------------------------------------------------------------

    #[test]
    fn test_snapshot_roundtrip_and_hash() {
        let mut m = waiting_on_a();
        let snap = m.game.snapshot();
        assert_eq!(snap.turn, Some(A));
        assert_eq!(snap.root_creator, Some(m.board_a.root()));
        assert!(snap.deposited_creator && snap.deposited_opponent);

        let bytes = snap.to_bytes().unwrap();
        assert_eq!(GameSnapshot::from_bytes(&bytes).unwrap(), snap);
        assert!(snap.to_json().unwrap().contains("\"phase\":\"Shooting\""));

        let h1 = m.game.state_hash();
        m.confirm(A, 42).unwrap();
        assert_ne!(m.game.state_hash(), h1);
    }

    #[test]
    fn test_events_drain() {
        let mut m = started();
        let events = m.game.drain_events();
        assert!(matches!(events[0].data, GameEventData::GameCreated { creator, agreed_bet: BET } if creator == A));
        assert!(matches!(events.last().unwrap().data, GameEventData::ShootingStarted { first } if first == A));
        assert!(m.game.events().is_empty());
    }

    // -------------------------------------------------------------------------
    // Properties
    // -------------------------------------------------------------------------

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_turn_alternation(
            a_targets in Just((0u8..64).collect::<Vec<_>>()).prop_shuffle(),
            b_targets in Just((0u8..64).collect::<Vec<_>>()).prop_shuffle(),
            rounds in 1usize..60,
        ) {
            let mut m = started();
            let ctx = m.ctx(A);
            m.game.shoot(&ctx, a_targets[0]).unwrap();

            for r in 0..rounds {
                let (mover, next) = if r % 2 == 0 { (B, b_targets[r / 2]) } else { (A, a_targets[r / 2 + 1]) };
                m.confirm(mover, next).unwrap();
                if m.game.winner().is_some() {
                    break;
                }

                let a_len = m.game.shots(&A).unwrap().len();
                let b_len = m.game.shots(&B).unwrap().len();
                prop_assert!(a_len.abs_diff(b_len) <= 1);
                // The player who just fired is not the one to move
                prop_assert_ne!(m.game.turn(), Some(mover));
            }
        }

        #[test]
        fn prop_forged_reveal_rejected(
            target in 0u8..64,
            byte in 0usize..32,
            flip in 1u8..=255,
        ) {
            let mut m = started();
            let ctx = m.ctx(A);
            m.game.shoot(&ctx, target).unwrap();

            let r = m.board_b.reveal(target).unwrap();
            let mut salt = r.salt;
            salt[byte] ^= flip;
            let before = m.game.snapshot();
            let ctx = m.ctx(B);
            let next = if target == 0 { 1 } else { 0 };

            let forged_salt = m.game.confirm_and_shoot(&ctx, r.index, r.is_ship, &salt, &r.proof, next);
            prop_assert_eq!(forged_salt, Err(GameError::Commitment(CommitmentError::InvalidProof)));
            let forged_cell = m.game.confirm_and_shoot(&ctx, r.index, !r.is_ship, &r.salt, &r.proof, next);
            prop_assert_eq!(forged_cell, Err(GameError::Commitment(CommitmentError::InvalidProof)));
            prop_assert_eq!(m.game.snapshot(), before);
        }
    }
}
