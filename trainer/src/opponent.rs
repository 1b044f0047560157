//! Opponent move selection: one reply per request, strategy keyed by
//! difficulty, with a single-level fallback chain for the advanced tier.

use std::sync::Arc;

use chess::Game;
use cozy_chess::{Board, Move, Piece, Square};
use providers::{ContinuationStats, MoveDatabase, PositionEvaluator};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::quality::ANALYSIS_DEPTH;

/// How many ranked database continuations participate in the weighted draw.
pub const TOP_CONTINUATIONS: usize = 3;

// Heuristic scorer policy constants.
const CAPTURE_BONUS: i32 = 30;
const CHECK_BONUS: i32 = 20;
const CENTER_BONUS: i32 = 15;
const SEMI_CENTER_BONUS: i32 = 5;
const JITTER_MAX: i32 = 10;

/// Difficulty tier. Stateless: every request is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Produces replies for the non-human side.
pub struct OpponentSelector<D, E> {
    database: Arc<D>,
    evaluator: Arc<E>,
    depth: u32,
}

impl<D: MoveDatabase, E: PositionEvaluator> OpponentSelector<D, E> {
    pub fn new(database: Arc<D>, evaluator: Arc<E>) -> Self {
        Self {
            database,
            evaluator,
            depth: ANALYSIS_DEPTH,
        }
    }

    /// Produce one reply for the side to move. Returns `None` only when
    /// the position has no legal moves; callers are expected to have
    /// checked for game over already.
    pub async fn select(&self, game: &Game, difficulty: Difficulty) -> Option<Move> {
        let legal = game.legal_moves();
        if legal.is_empty() {
            return None;
        }

        let mv = match difficulty {
            Difficulty::Beginner => random_move(&legal),
            Difficulty::Intermediate => self.intermediate(game, &legal).await,
            Difficulty::Advanced => match self.engine_move(game, &legal).await {
                Some(mv) => mv,
                // Full fallback chain: database, then heuristic. Never
                // silently no-move while a legal move exists.
                None => self.intermediate(game, &legal).await,
            },
        };
        Some(mv)
    }

    async fn intermediate(&self, game: &Game, legal: &[Move]) -> Move {
        match self.database_move(game, legal).await {
            Some(mv) => mv,
            None => heuristic_move(game.position(), legal),
        }
    }

    /// Weighted draw over the top database continuations: a move with
    /// more recorded games is proportionally more likely, which keeps
    /// variety while respecting popularity.
    async fn database_move(&self, game: &Game, legal: &[Move]) -> Option<Move> {
        let history = game.history_as_uci();
        let stats = match self.database.lookup(&history, TOP_CONTINUATIONS).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::debug!(error = %e, "move database unavailable");
                return None;
            }
        };

        let ranked: Vec<&ContinuationStats> = stats
            .moves
            .iter()
            .filter(|c| c.total_games() > 0)
            .take(TOP_CONTINUATIONS)
            .collect();
        let total: u64 = ranked.iter().map(|c| c.total_games()).sum();
        if total == 0 {
            return None;
        }

        let mut ticket = rand::thread_rng().gen_range(0..total);
        let mut chosen = ranked[0];
        for continuation in &ranked {
            let weight = continuation.total_games();
            if ticket < weight {
                chosen = continuation;
                break;
            }
            ticket -= weight;
        }

        let mv = chess::parse_uci_move(&chosen.uci).ok()?;
        let mv = chess::convert_uci_castling(mv, legal);
        if legal.contains(&mv) {
            Some(mv)
        } else {
            tracing::debug!(uci = %chosen.uci, "database suggested an illegal move");
            None
        }
    }

    async fn engine_move(&self, game: &Game, legal: &[Move]) -> Option<Move> {
        let eval = match self.evaluator.evaluate(&game.fen(), self.depth).await {
            Ok(eval) => eval,
            Err(e) => {
                tracing::debug!(error = %e, "evaluator unavailable for advanced opponent");
                return None;
            }
        };
        let mv = chess::parse_uci_move(&eval.best_move_uci).ok()?;
        let mv = chess::convert_uci_castling(mv, legal);
        if legal.contains(&mv) {
            Some(mv)
        } else {
            tracing::debug!(uci = %eval.best_move_uci, "evaluator suggested an illegal move");
            None
        }
    }
}

fn random_move(legal: &[Move]) -> Move {
    legal[rand::thread_rng().gen_range(0..legal.len())]
}

/// Cheap activity scorer used when the database has nothing: random
/// jitter plus bonuses for captures, checks and central destinations.
fn heuristic_move(board: &Board, legal: &[Move]) -> Move {
    let mut rng = rand::thread_rng();
    let mut best = legal[0];
    let mut best_score = i32::MIN;

    for &mv in legal {
        let mut score = rng.gen_range(0..JITTER_MAX);
        if is_capture(board, mv) {
            score += CAPTURE_BONUS;
        }
        if gives_check(board, mv) {
            score += CHECK_BONUS;
        }
        score += destination_bonus(mv.to);

        if score > best_score {
            best = mv;
            best_score = score;
        }
    }

    best
}

fn is_capture(board: &Board, mv: Move) -> bool {
    match board.color_on(mv.to) {
        Some(color) => color != board.side_to_move(),
        // Pawn moving diagonally onto an empty square: en passant.
        None => board.piece_on(mv.from) == Some(Piece::Pawn) && mv.from.file() != mv.to.file(),
    }
}

fn gives_check(board: &Board, mv: Move) -> bool {
    let mut next = board.clone();
    next.play_unchecked(mv);
    !next.checkers().is_empty()
}

/// +15 for the four center squares, +5 for the extended-center ring
/// around them (c3-f3, c6-f6, c4, c5, f4, f5).
fn destination_bonus(to: Square) -> i32 {
    let file = to.file() as u8;
    let rank = to.rank() as u8;
    let in_center = (3..=4).contains(&file) && (3..=4).contains(&rank);
    let in_ring = (2..=5).contains(&file) && (2..=5).contains(&rank);
    if in_center {
        CENTER_BONUS
    } else if in_ring {
        SEMI_CENTER_BONUS
    } else {
        0
    }
}
