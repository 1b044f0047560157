//! Domain types returned by the provider clients.

use chess::EvalScore;
use serde::{Deserialize, Serialize};

/// Aggregate statistics for a position reached by a move sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpeningStats {
    pub white: u64,
    pub draws: u64,
    pub black: u64,
    /// Ranked continuations, most-played first.
    pub moves: Vec<ContinuationStats>,
    /// Notable historical games reaching this position.
    pub top_games: Vec<TopGame>,
}

impl OpeningStats {
    pub fn total_games(&self) -> u64 {
        self.white + self.draws + self.black
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

/// Statistics for one candidate next move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationStats {
    pub uci: String,
    pub san: String,
    pub white: u64,
    pub draws: u64,
    pub black: u64,
}

impl ContinuationStats {
    /// Number of recorded games in which this move was played; the weight
    /// used for popularity-proportional sampling.
    pub fn total_games(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

/// Reference to a notable game from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopGame {
    pub id: String,
    pub white: String,
    pub black: String,
    pub winner: Option<String>,
    pub year: Option<u32>,
}

/// One position evaluation from the external evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    /// Signed score, White's perspective.
    pub score: EvalScore,
    /// Suggested best move in coordinate notation.
    pub best_move_uci: String,
    /// Principal continuation in coordinate notation.
    pub pv: Vec<String>,
    pub depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_weight_sums_results() {
        let stats = ContinuationStats {
            uci: "g8f6".into(),
            san: "Nf6".into(),
            white: 100,
            draws: 50,
            black: 80,
        };
        assert_eq!(stats.total_games(), 230);
    }

    #[test]
    fn empty_stats() {
        let stats = OpeningStats::default();
        assert!(stats.is_empty());
        assert_eq!(stats.total_games(), 0);
    }
}
