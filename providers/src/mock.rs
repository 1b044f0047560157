//! Mock provider implementations for tests and offline development.
//! Only compiled in test mode or with the `mock` feature.

use async_trait::async_trait;
use chess::EvalScore;
use std::sync::{Arc, Mutex};

use crate::error::{ProviderError, ProviderResult};
use crate::traits::{MoveDatabase, PositionEvaluator};
use crate::types::{ContinuationStats, Evaluation, OpeningStats};

type Responder<T> = Box<dyn Fn() -> ProviderResult<T> + Send>;

/// Configurable mock move database with a call log.
pub struct MockMoveDatabase {
    response: Arc<Mutex<Option<Responder<OpeningStats>>>>,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Default for MockMoveDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMoveDatabase {
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the lookup response.
    pub fn with_lookup_response<F>(self, f: F) -> Self
    where
        F: Fn() -> ProviderResult<OpeningStats> + Send + 'static,
    {
        *self.response.lock().unwrap() = Some(Box::new(f));
        self
    }

    /// Pre-configure ranked continuations as `(uci, san, games)` triples,
    /// splitting the game count across win/draw/loss buckets.
    pub fn with_continuations(self, continuations: &[(&str, &str, u64)]) -> Self {
        let moves: Vec<ContinuationStats> = continuations
            .iter()
            .map(|(uci, san, games)| ContinuationStats {
                uci: uci.to_string(),
                san: san.to_string(),
                white: games / 2,
                draws: games / 4,
                black: games - games / 2 - games / 4,
            })
            .collect();
        self.with_lookup_response(move || {
            Ok(OpeningStats {
                white: 0,
                draws: 0,
                black: 0,
                moves: moves.clone(),
                top_games: Vec::new(),
            })
        })
    }

    /// Pre-configure an empty (no data) response.
    pub fn with_no_data(self) -> Self {
        self.with_lookup_response(|| Ok(OpeningStats::default()))
    }

    /// Pre-configure a hard failure.
    pub fn with_failure(self) -> Self {
        self.with_lookup_response(|| Err(ProviderError::Status(503)))
    }

    /// The move sequences this mock has been queried with.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MoveDatabase for MockMoveDatabase {
    async fn lookup(&self, moves_uci: &[String], _top: usize) -> ProviderResult<OpeningStats> {
        self.calls.lock().unwrap().push(moves_uci.to_vec());
        match self.response.lock().unwrap().as_ref() {
            Some(f) => f(),
            None => Err(ProviderError::NotConfigured("lookup".to_string())),
        }
    }
}

/// Configurable mock evaluator with a call log.
pub struct MockEvaluator {
    response: Arc<Mutex<Option<Responder<Evaluation>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl Default for MockEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEvaluator {
    pub fn new() -> Self {
        Self {
            response: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Configure the evaluation response.
    pub fn with_evaluate_response<F>(self, f: F) -> Self
    where
        F: Fn() -> ProviderResult<Evaluation> + Send + 'static,
    {
        *self.response.lock().unwrap() = Some(Box::new(f));
        self
    }

    /// Pre-configure a fixed centipawn score and best move.
    pub fn with_evaluation(self, cp: i32, best_move_uci: &str) -> Self {
        let best = best_move_uci.to_string();
        self.with_evaluate_response(move || {
            Ok(Evaluation {
                score: EvalScore::Centipawns(cp),
                best_move_uci: best.clone(),
                pv: vec![best.clone()],
                depth: 12,
            })
        })
    }

    /// Evaluations served in order per call; the last one repeats.
    /// Each entry is `(cp, best_move_uci)`.
    pub fn with_evaluation_sequence(self, sequence: &[(i32, &str)]) -> Self {
        let sequence: Vec<(i32, String)> = sequence
            .iter()
            .map(|(cp, best)| (*cp, best.to_string()))
            .collect();
        let cursor = Arc::new(Mutex::new(0usize));
        self.with_evaluate_response(move || {
            let mut idx = cursor.lock().unwrap();
            let (cp, best) = sequence
                .get(*idx)
                .or_else(|| sequence.last())
                .cloned()
                .ok_or_else(|| ProviderError::NotConfigured("evaluate".to_string()))?;
            *idx += 1;
            Ok(Evaluation {
                score: EvalScore::Centipawns(cp),
                best_move_uci: best.clone(),
                pv: vec![best],
                depth: 12,
            })
        })
    }

    /// Pre-configure a hard failure.
    pub fn with_failure(self) -> Self {
        self.with_evaluate_response(|| Err(ProviderError::Status(503)))
    }

    /// The FEN strings this mock has been asked to evaluate.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PositionEvaluator for MockEvaluator {
    async fn evaluate(&self, fen: &str, _depth: u32) -> ProviderResult<Evaluation> {
        self.calls.lock().unwrap().push(fen.to_string());
        match self.response.lock().unwrap().as_ref() {
            Some(f) => f(),
            None => Err(ProviderError::NotConfigured("evaluate".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_mock_reports_not_configured() {
        let db = MockMoveDatabase::new();
        let result = db.lookup(&[], 3).await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn continuations_and_call_log() {
        let db = MockMoveDatabase::new().with_continuations(&[("g8f6", "Nf6", 1000)]);
        let moves = vec!["d2d4".to_string()];
        let stats = db.lookup(&moves, 3).await.unwrap();
        assert_eq!(stats.moves.len(), 1);
        assert_eq!(stats.moves[0].total_games(), 1000);
        assert_eq!(db.calls(), vec![vec!["d2d4".to_string()]]);
    }

    #[tokio::test]
    async fn evaluation_sequence_repeats_last_entry() {
        let eval = MockEvaluator::new().with_evaluation_sequence(&[(50, "e2e4"), (-30, "e7e5")]);
        assert_eq!(
            eval.evaluate("fen1", 12).await.unwrap().score,
            EvalScore::Centipawns(50)
        );
        assert_eq!(
            eval.evaluate("fen2", 12).await.unwrap().score,
            EvalScore::Centipawns(-30)
        );
        assert_eq!(
            eval.evaluate("fen3", 12).await.unwrap().score,
            EvalScore::Centipawns(-30)
        );
        assert_eq!(eval.calls().len(), 3);
    }

    #[tokio::test]
    async fn failure_injection() {
        let eval = MockEvaluator::new().with_failure();
        assert!(eval.evaluate("fen", 12).await.is_err());
    }
}
