//! Move-quality classification: compare engine evaluations before and
//! after a move and bucket the drop into a quality tier.

use std::sync::Arc;

use cozy_chess::{Board, Color, Move};
use providers::PositionEvaluator;
use serde::{Deserialize, Serialize};

/// Search depth for every evaluator request (classifier and advanced
/// opponent alike).
pub const ANALYSIS_DEPTH: u32 = 12;

// Centipawn-loss thresholds, inclusive upper bounds. Policy constants,
// not configurable per call.
const EXCELLENT_MAX_DROP: i32 = 25;
const GOOD_MAX_DROP: i32 = 50;
const INACCURACY_MAX_DROP: i32 = 100;
const MISTAKE_MAX_DROP: i32 = 200;

/// Quality tier of a played move relative to the evaluation it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityClass {
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

impl QualityClass {
    /// Bucket an evaluation drop (centipawns, mover's perspective).
    /// Negative drops clamp to zero: an improving move never counts
    /// against the mover.
    pub fn from_eval_drop(drop: i32) -> Self {
        match drop.max(0) {
            d if d <= EXCELLENT_MAX_DROP => Self::Excellent,
            d if d <= GOOD_MAX_DROP => Self::Good,
            d if d <= INACCURACY_MAX_DROP => Self::Inaccuracy,
            d if d <= MISTAKE_MAX_DROP => Self::Mistake,
            _ => Self::Blunder,
        }
    }

    /// The tiers that warrant a better-move annotation in review.
    pub fn is_worse_than_good(self) -> bool {
        matches!(self, Self::Inaccuracy | Self::Mistake | Self::Blunder)
    }
}

impl std::fmt::Display for QualityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Inaccuracy => "inaccuracy",
            Self::Mistake => "mistake",
            Self::Blunder => "blunder",
        };
        write!(f, "{s}")
    }
}

/// Analysis result for one played move. Created once, immutable after.
///
/// Evaluations are centipawns from the mover's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveQuality {
    /// 1-indexed half-move number this analysis belongs to.
    pub move_number: u32,
    pub san: String,
    pub eval_before: i32,
    pub eval_after: i32,
    pub eval_drop: i32,
    pub class: QualityClass,
    /// Suggested best move; coordinate form if SAN conversion failed.
    pub best_san: Option<String>,
    pub played_from: String,
    pub played_to: String,
    pub best_from: Option<String>,
    pub best_to: Option<String>,
}

/// Scores already-applied moves against the external evaluator.
///
/// Every analysis works on boards parsed from the before-FEN; the live
/// game position is never touched, so a slow analysis cannot block or
/// corrupt play.
pub struct QualityAnalyzer<E> {
    evaluator: Arc<E>,
    depth: u32,
}

impl<E: PositionEvaluator> QualityAnalyzer<E> {
    pub fn new(evaluator: Arc<E>) -> Self {
        Self {
            evaluator,
            depth: ANALYSIS_DEPTH,
        }
    }

    /// Analyze one move. Any failure along the way (unparseable input,
    /// evaluator unavailable) yields `None`: a missing result means
    /// "not analyzed", never an error the caller must handle.
    pub async fn analyze(
        &self,
        fen_before: &str,
        san: &str,
        move_number: u32,
    ) -> Option<MoveQuality> {
        let board: Board = match fen_before.parse() {
            Ok(b) => b,
            Err(_) => {
                tracing::debug!(move_number, fen_before, "analysis skipped: bad FEN");
                return None;
            }
        };
        let mover = board.side_to_move();

        let before = match self.evaluator.evaluate(fen_before, self.depth).await {
            Ok(eval) => eval,
            Err(e) => {
                tracing::debug!(move_number, error = %e, "before-evaluation unavailable");
                return None;
            }
        };

        let mv = match chess::parse_san(&board, san) {
            Ok(mv) => mv,
            Err(e) => {
                tracing::debug!(move_number, san, error = %e, "analysis skipped: bad SAN");
                return None;
            }
        };

        // Throwaway board for the after-position; never the live game.
        let mut after_board = board.clone();
        after_board.play_unchecked(mv);
        let fen_after = after_board.to_string();

        let after = match self.evaluator.evaluate(&fen_after, self.depth).await {
            Ok(eval) => eval,
            Err(e) => {
                tracing::debug!(move_number, error = %e, "after-evaluation unavailable");
                return None;
            }
        };

        // Evaluator scores are White-perspective; normalize so the drop
        // always means "got worse for the mover".
        let sign = match mover {
            Color::White => 1,
            Color::Black => -1,
        };
        let eval_before = sign * before.score.to_cp();
        let eval_after = sign * after.score.to_cp();
        let eval_drop = (eval_before - eval_after).max(0);
        let class = QualityClass::from_eval_drop(eval_drop);

        let (best_san, best_from, best_to) = convert_best_move(&board, &before.best_move_uci);

        tracing::debug!(
            move_number,
            san,
            eval_before,
            eval_after,
            eval_drop,
            %class,
            "move analyzed"
        );

        Some(MoveQuality {
            move_number,
            san: san.to_string(),
            eval_before,
            eval_after,
            eval_drop,
            class,
            best_san,
            played_from: chess::format_square(mv.from),
            played_to: chess::format_square(mv.to),
            best_from,
            best_to,
        })
    }
}

/// Convert the evaluator's coordinate best move to SAN on its own
/// throwaway board. On any failure the raw coordinate form is retained
/// rather than failing the whole analysis.
fn convert_best_move(
    board: &Board,
    best_uci: &str,
) -> (Option<String>, Option<String>, Option<String>) {
    if best_uci.is_empty() {
        return (None, None, None);
    }

    let mv = match chess::parse_uci_move(best_uci) {
        Ok(mv) => mv,
        Err(_) => return (Some(best_uci.to_string()), None, None),
    };

    let mut legal: Vec<Move> = Vec::new();
    board.generate_moves(|mvs| {
        legal.extend(mvs);
        false
    });

    let converted = chess::convert_uci_castling(mv, &legal);
    if legal.contains(&converted) {
        (
            Some(chess::format_san(board, converted)),
            Some(chess::format_square(converted.from)),
            Some(chess::format_square(converted.to)),
        )
    } else {
        (
            Some(best_uci.to_string()),
            Some(chess::format_square(mv.from)),
            Some(chess::format_square(mv.to)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::MockEvaluator;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    const AFTER_E4_FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn classification_thresholds_are_inclusive() {
        use QualityClass as Q;
        let cases = [
            (0, Q::Excellent),
            (25, Q::Excellent),
            (26, Q::Good),
            (50, Q::Good),
            (51, Q::Inaccuracy),
            (100, Q::Inaccuracy),
            (101, Q::Mistake),
            (200, Q::Mistake),
            (201, Q::Blunder),
            (1000, Q::Blunder),
        ];
        for (drop, expected) in cases {
            assert_eq!(Q::from_eval_drop(drop), expected, "drop {drop}");
        }
    }

    #[test]
    fn negative_drop_clamps_to_excellent() {
        assert_eq!(QualityClass::from_eval_drop(-80), QualityClass::Excellent);
    }

    #[test]
    fn worse_than_good_predicate() {
        assert!(!QualityClass::Excellent.is_worse_than_good());
        assert!(!QualityClass::Good.is_worse_than_good());
        assert!(QualityClass::Inaccuracy.is_worse_than_good());
        assert!(QualityClass::Blunder.is_worse_than_good());
    }

    #[tokio::test]
    async fn boundary_drop_of_200_is_a_mistake() {
        // Before +50, after -150 for the mover: drop of exactly 200.
        let evaluator = Arc::new(
            MockEvaluator::new().with_evaluation_sequence(&[(50, "g1f3"), (-150, "g8f6")]),
        );
        let analyzer = QualityAnalyzer::new(evaluator);

        let quality = analyzer.analyze(START_FEN, "e4", 1).await.unwrap();
        assert_eq!(quality.eval_before, 50);
        assert_eq!(quality.eval_after, -150);
        assert_eq!(quality.eval_drop, 200);
        assert_eq!(quality.class, QualityClass::Mistake);
        assert_eq!(quality.best_san.as_deref(), Some("Nf3"));
        assert_eq!(quality.played_from, "e2");
        assert_eq!(quality.played_to, "e4");
        assert_eq!(quality.best_from.as_deref(), Some("g1"));
        assert_eq!(quality.best_to.as_deref(), Some("f3"));
    }

    #[tokio::test]
    async fn black_moves_are_normalized_to_the_mover() {
        // White-perspective -30 before means +30 for the black mover;
        // +20 after means -20. Drop: 50 -> Good.
        let evaluator =
            Arc::new(MockEvaluator::new().with_evaluation_sequence(&[(-30, "e7e5"), (20, "g1f3")]));
        let analyzer = QualityAnalyzer::new(evaluator);

        let quality = analyzer.analyze(AFTER_E4_FEN, "e5", 2).await.unwrap();
        assert_eq!(quality.eval_before, 30);
        assert_eq!(quality.eval_after, -20);
        assert_eq!(quality.eval_drop, 50);
        assert_eq!(quality.class, QualityClass::Good);
    }

    #[tokio::test]
    async fn improving_move_classifies_excellent() {
        let evaluator =
            Arc::new(MockEvaluator::new().with_evaluation_sequence(&[(10, "e2e4"), (90, "d7d5")]));
        let analyzer = QualityAnalyzer::new(evaluator);

        let quality = analyzer.analyze(START_FEN, "e4", 1).await.unwrap();
        assert_eq!(quality.eval_drop, 0);
        assert_eq!(quality.class, QualityClass::Excellent);
    }

    #[tokio::test]
    async fn evaluator_failure_yields_no_result() {
        let analyzer = QualityAnalyzer::new(Arc::new(MockEvaluator::new().with_failure()));
        assert!(analyzer.analyze(START_FEN, "e4", 1).await.is_none());
    }

    #[tokio::test]
    async fn bad_inputs_yield_no_result() {
        let evaluator = Arc::new(MockEvaluator::new().with_evaluation(0, "e2e4"));
        let analyzer = QualityAnalyzer::new(evaluator);
        assert!(analyzer.analyze("not a fen", "e4", 1).await.is_none());
        assert!(analyzer.analyze(START_FEN, "Qh5", 1).await.is_none());
    }

    #[tokio::test]
    async fn unparseable_best_move_falls_back_to_raw_form() {
        let evaluator =
            Arc::new(MockEvaluator::new().with_evaluation_sequence(&[(0, "zzzz"), (0, "zzzz")]));
        let analyzer = QualityAnalyzer::new(evaluator);

        let quality = analyzer.analyze(START_FEN, "e4", 1).await.unwrap();
        assert_eq!(quality.best_san.as_deref(), Some("zzzz"));
        assert!(quality.best_from.is_none());
    }

    #[tokio::test]
    async fn illegal_best_move_keeps_coordinates() {
        // Parseable but not legal in the position.
        let evaluator =
            Arc::new(MockEvaluator::new().with_evaluation_sequence(&[(0, "e2e5"), (0, "e2e5")]));
        let analyzer = QualityAnalyzer::new(evaluator);

        let quality = analyzer.analyze(START_FEN, "e4", 1).await.unwrap();
        assert_eq!(quality.best_san.as_deref(), Some("e2e5"));
        assert_eq!(quality.best_from.as_deref(), Some("e2"));
        assert_eq!(quality.best_to.as_deref(), Some("e5"));
    }
}
