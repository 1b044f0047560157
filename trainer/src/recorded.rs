//! Finished-game records: created exactly once when a game reaches a
//! terminal state, immutable afterward.

use chess::Game;
use cozy_chess::{Color, GameStatus};
use serde::{Deserialize, Serialize};

use crate::opponent::Difficulty;
use crate::quality::MoveQuality;
use crate::store::{now_timestamp, Storable};

/// Terminal result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameOutcome {
    /// PGN result token.
    pub fn pgn_token(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WhiteWins => "White wins",
            Self::BlackWins => "Black wins",
            Self::Draw => "Draw",
        };
        write!(f, "{s}")
    }
}

/// A completed game eligible for replay and review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedGame {
    pub id: String,
    pub created_at: u64,
    pub difficulty: Difficulty,
    pub outcome: GameOutcome,
    pub outcome_reason: String,
    pub pgn: String,
    /// SAN half-moves in played order.
    pub moves: Vec<String>,
    /// Analysis results, at most one per move number.
    pub qualities: Vec<MoveQuality>,
    pub white: String,
    pub black: String,
}

impl RecordedGame {
    /// Build a record from a finished live game. Returns `None` while the
    /// game is still ongoing.
    pub fn from_finished(
        game: &Game,
        difficulty: Difficulty,
        qualities: Vec<MoveQuality>,
        white: &str,
        black: &str,
    ) -> Option<Self> {
        let (outcome, outcome_reason) = match game.status() {
            GameStatus::Ongoing => return None,
            GameStatus::Won => {
                // The side to move has no escape: the other side won.
                let outcome = match game.side_to_move() {
                    Color::White => GameOutcome::BlackWins,
                    Color::Black => GameOutcome::WhiteWins,
                };
                (outcome, "Checkmate".to_string())
            }
            GameStatus::Drawn => {
                let reason = if game.legal_moves().is_empty() {
                    "Stalemate"
                } else {
                    "Draw"
                };
                (GameOutcome::Draw, reason.to_string())
            }
        };

        let moves: Vec<String> = game.history().iter().map(|e| e.san.clone()).collect();
        let pgn = write_pgn(&moves, outcome, white, black);

        Some(Self {
            id: format!("game_{}", uuid::Uuid::new_v4()),
            created_at: now_timestamp(),
            difficulty,
            outcome,
            outcome_reason,
            pgn,
            moves,
            qualities,
            white: white.to_string(),
            black: black.to_string(),
        })
    }

    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

impl Storable for RecordedGame {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Minimal PGN export: a tag section plus numbered movetext.
fn write_pgn(moves: &[String], outcome: GameOutcome, white: &str, black: &str) -> String {
    let mut pgn = String::new();
    pgn.push_str("[Event \"Opening training\"]\n");
    pgn.push_str(&format!("[White \"{white}\"]\n"));
    pgn.push_str(&format!("[Black \"{black}\"]\n"));
    pgn.push_str(&format!("[Result \"{}\"]\n\n", outcome.pgn_token()));

    for (i, san) in moves.iter().enumerate() {
        if i % 2 == 0 {
            if i > 0 {
                pgn.push(' ');
            }
            pgn.push_str(&format!("{}.", i / 2 + 1));
        }
        pgn.push(' ');
        pgn.push_str(san);
    }
    if !moves.is_empty() {
        pgn.push(' ');
    }
    pgn.push_str(outcome.pgn_token());
    pgn.push('\n');
    pgn
}
