//! Post-game replay: read-only navigation through a recorded move
//! sequence, fully independent of the live game.
//!
//! The position at an index is always rebuilt by replaying moves from the
//! starting position onto a fresh board. Nothing is mutated incrementally,
//! so jumping 3 -> 0 -> 7 can never drift out of sync.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cozy_chess::{Board, Square};

use crate::quality::MoveQuality;
use crate::recorded::RecordedGame;

/// Base auto-advance interval; divided by the speed multiplier.
pub const BASE_ADVANCE_INTERVAL: Duration = Duration::from_millis(1200);

const MIN_SPEED: f32 = 0.25;
const MAX_SPEED: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayPhase {
    /// Not replaying.
    Idle,
    /// Replay active, manual navigation.
    Reviewing,
    /// Replay active, auto-advancing on a timer.
    Playing,
}

/// Better-move overlay for an inferior trainee move: the square pairs of
/// the played move and of the suggested best move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferiorMoveAnnotation {
    pub played: (String, String),
    pub best: (String, String),
}

/// Replay navigation state. Owns the recorded game by reference and a
/// derived board kept in sync with the current index.
pub struct ReplaySession {
    phase: ReplayPhase,
    game: Option<Arc<RecordedGame>>,
    index: usize,
    board: Board,
    fen: String,
    speed: f32,
    elapsed: Duration,
    last_tick: Instant,
}

impl Default for ReplaySession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplaySession {
    pub fn new() -> Self {
        Self {
            phase: ReplayPhase::Idle,
            game: None,
            index: 0,
            board: Board::default(),
            fen: Board::default().to_string(),
            speed: 1.0,
            elapsed: Duration::ZERO,
            last_tick: Instant::now(),
        }
    }

    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    pub fn is_replaying(&self) -> bool {
        self.phase != ReplayPhase::Idle
    }

    pub fn is_playing(&self) -> bool {
        self.phase == ReplayPhase::Playing
    }

    /// Current index in `0..=move_count`: the number of moves applied.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn game(&self) -> Option<&Arc<RecordedGame>> {
        self.game.as_ref()
    }

    /// Board at the current index.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// FEN at the current index (kept in sync with the board).
    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn move_count(&self) -> usize {
        self.game.as_ref().map_or(0, |g| g.moves.len())
    }

    /// Snapshot a finished game for review; index starts at 0.
    pub fn enter(&mut self, game: Arc<RecordedGame>) {
        self.game = Some(game);
        self.index = 0;
        self.board = Board::default();
        self.fen = self.board.to_string();
        self.phase = ReplayPhase::Reviewing;
        self.elapsed = Duration::ZERO;
    }

    /// Discard the snapshot and return to idle. The live game is owned
    /// elsewhere; the caller resets it separately.
    pub fn exit(&mut self) {
        self.game = None;
        self.index = 0;
        self.board = Board::default();
        self.fen = self.board.to_string();
        self.phase = ReplayPhase::Idle;
        self.elapsed = Duration::ZERO;
    }

    /// Jump to an index, clamped to `0..=move_count`. On a corrupt record
    /// the current index and board stay untouched and in sync.
    pub fn go_to(&mut self, index: usize) {
        let Some(game) = self.game.clone() else {
            return;
        };
        let target = index.min(game.moves.len());
        match reconstruct(&game.moves[..target]) {
            Some(board) => {
                self.fen = board.to_string();
                self.board = board;
                self.index = target;
            }
            None => {
                tracing::warn!(target, "replay reconstruction failed; keeping current index");
            }
        }
    }

    /// Step the index by ±1 (or any delta), clamped at both ends.
    pub fn step(&mut self, delta: i32) {
        if self.phase == ReplayPhase::Idle {
            return;
        }
        let target = self.index.saturating_add_signed(delta as isize);
        self.go_to(target);
    }

    /// Toggle between manual review and auto-play.
    pub fn toggle_play(&mut self) {
        match self.phase {
            ReplayPhase::Idle => {}
            ReplayPhase::Reviewing => {
                self.phase = ReplayPhase::Playing;
                self.elapsed = Duration::ZERO;
                self.last_tick = Instant::now();
            }
            ReplayPhase::Playing => self.phase = ReplayPhase::Reviewing,
        }
    }

    /// Set the auto-advance speed multiplier (clamped). Takes effect at
    /// the next tick; nothing already elapsed is rescheduled.
    pub fn set_speed(&mut self, multiplier: f32) {
        self.speed = multiplier.clamp(MIN_SPEED, MAX_SPEED);
    }

    /// Effective auto-advance interval.
    pub fn interval(&self) -> Duration {
        BASE_ADVANCE_INTERVAL.div_f32(self.speed)
    }

    /// Tick using wall-clock time. Call once per frame while playing.
    pub fn tick(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.tick_with_elapsed(elapsed)
    }

    /// Tick with an explicit elapsed duration (useful for testing).
    /// While playing, advances one move per interval; reaching the final
    /// index drops back to reviewing instead of spinning.
    pub fn tick_with_elapsed(&mut self, elapsed: Duration) -> bool {
        if self.phase != ReplayPhase::Playing {
            return false;
        }
        self.elapsed += elapsed;
        if self.elapsed < self.interval() {
            return false;
        }
        self.elapsed = Duration::ZERO;
        self.go_to(self.index + 1);
        if self.index >= self.move_count() {
            self.phase = ReplayPhase::Reviewing;
        }
        true
    }

    /// Squares of the move applied to reach the current index; `None` at
    /// index 0.
    pub fn played_move_squares(&self) -> Option<(Square, Square)> {
        if self.index == 0 {
            return None;
        }
        let game = self.game.as_ref()?;
        let before = reconstruct(&game.moves[..self.index - 1])?;
        let mv = chess::parse_san(&before, &game.moves[self.index - 1]).ok()?;
        Some((mv.from, mv.to))
    }

    /// Analysis for the move at the current index, looked up by move
    /// number so it works regardless of when the analysis arrived.
    pub fn quality(&self) -> Option<&MoveQuality> {
        if self.index == 0 {
            return None;
        }
        let game = self.game.as_ref()?;
        game.qualities
            .iter()
            .find(|q| q.move_number as usize == self.index)
    }

    /// Better-move annotation for the current index: only for the
    /// trainee's own moves, and only when the move classified worse than
    /// "good".
    pub fn annotation(&self) -> Option<InferiorMoveAnnotation> {
        let quality = self.quality()?;
        if !is_trainee_move(quality.move_number) || !quality.class.is_worse_than_good() {
            return None;
        }
        Some(InferiorMoveAnnotation {
            played: (quality.played_from.clone(), quality.played_to.clone()),
            best: (quality.best_from.clone()?, quality.best_to.clone()?),
        })
    }
}

/// The trainee plays White: odd 1-indexed half-moves are theirs.
pub fn is_trainee_move(move_number: u32) -> bool {
    move_number % 2 == 1
}

/// Replay a SAN prefix from the starting position onto a fresh board.
fn reconstruct(moves: &[String]) -> Option<Board> {
    let mut board = Board::default();
    for san in moves {
        let mv = chess::parse_san(&board, san).ok()?;
        board.play_unchecked(mv);
    }
    Some(board)
}
