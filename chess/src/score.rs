//! Evaluation score shared by the evaluator client and the trainer.

use serde::{Deserialize, Serialize};

/// An engine evaluation of a position.
///
/// `Centipawns` is signed from White's perspective (the convention of the
/// external evaluator). `Mate(n)`: positive n means White mates in n,
/// negative means White is mated in |n|.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvalScore {
    Centipawns(i32),
    Mate(i32),
}

impl EvalScore {
    /// Fold into a single centipawn number for comparisons. Mate scores
    /// map to large magnitudes that shrink with mate distance, so a
    /// faster mate always compares better.
    pub fn to_cp(self) -> i32 {
        match self {
            Self::Centipawns(cp) => cp,
            Self::Mate(n) => {
                if n > 0 {
                    30000 - n * 100
                } else {
                    -30000 - n * 100
                }
            }
        }
    }

    /// Flip the perspective.
    pub fn negate(self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(n) => Self::Mate(-n),
        }
    }

    pub fn is_mate(self) -> bool {
        matches!(self, Self::Mate(_))
    }
}

impl std::fmt::Display for EvalScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Centipawns(cp) => write!(f, "{:+.2}", f64::from(*cp) / 100.0),
            Self::Mate(n) if *n > 0 => write!(f, "+M{n}"),
            Self::Mate(n) => write!(f, "-M{}", n.abs()),
        }
    }
}
