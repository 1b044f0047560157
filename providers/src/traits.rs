//! Service trait abstractions, implemented by the HTTP clients and by the
//! mocks used in tests.

use async_trait::async_trait;

use crate::error::ProviderResult;
use crate::types::{Evaluation, OpeningStats};

/// Historical move-statistics database, keyed by the coordinate-notation
/// move sequence from the starting position.
#[async_trait]
pub trait MoveDatabase: Send + Sync {
    /// Look up statistics for the position after `moves_uci`, requesting
    /// at most `top` ranked continuations. An empty sequence queries the
    /// starting position.
    async fn lookup(&self, moves_uci: &[String], top: usize) -> ProviderResult<OpeningStats>;
}

/// Engine-backed position evaluator.
#[async_trait]
pub trait PositionEvaluator: Send + Sync {
    /// Evaluate a FEN position at a bounded search depth. The score is
    /// signed from White's perspective.
    async fn evaluate(&self, fen: &str, depth: u32) -> ProviderResult<Evaluation>;
}
