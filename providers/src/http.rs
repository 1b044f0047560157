//! HTTP implementations of the provider traits.
//!
//! Both services are plain JSON-over-GET. Requests carry a timeout and
//! are retried once after a short fixed backoff; anything that still
//! fails surfaces as a `ProviderError` for the caller's fallback chain.

use async_trait::async_trait;
use chess::EvalScore;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::traits::{MoveDatabase, PositionEvaluator};
use crate::types::{ContinuationStats, Evaluation, OpeningStats, TopGame};

/// Client for the historical move database (opening explorer).
pub struct ExplorerClient {
    client: reqwest::Client,
    base_url: String,
    retry_backoff: Duration,
}

impl ExplorerClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.explorer_url.clone(),
            retry_backoff: config.retry_backoff,
        })
    }
}

#[async_trait]
impl MoveDatabase for ExplorerClient {
    async fn lookup(&self, moves_uci: &[String], top: usize) -> ProviderResult<OpeningStats> {
        let play = moves_uci.join(",");
        let moves = top.to_string();
        let url = format!("{}/masters", self.base_url);
        let response: ExplorerResponse = get_with_retry(self.retry_backoff, || {
            self.client.get(&url).query(&[
                ("play", play.as_str()),
                ("moves", moves.as_str()),
                ("topGames", "4"),
            ])
        })
        .await?;

        tracing::debug!(
            moves = moves_uci.len(),
            continuations = response.moves.len(),
            "move database lookup complete"
        );
        Ok(map_explorer(response))
    }
}

/// Client for the engine-backed position evaluator.
pub struct CloudEvalClient {
    client: reqwest::Client,
    base_url: String,
    retry_backoff: Duration,
}

impl CloudEvalClient {
    pub fn new(config: &ProviderConfig) -> ProviderResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.eval_url.clone(),
            retry_backoff: config.retry_backoff,
        })
    }
}

#[async_trait]
impl PositionEvaluator for CloudEvalClient {
    async fn evaluate(&self, fen: &str, depth: u32) -> ProviderResult<Evaluation> {
        let url = format!("{}/api/cloud-eval", self.base_url);
        let depth_param = depth.to_string();
        let response: CloudEvalResponse = get_with_retry(self.retry_backoff, || {
            self.client.get(&url).query(&[
                ("fen", fen),
                ("depth", depth_param.as_str()),
                ("multiPv", "1"),
            ])
        })
        .await?;

        map_evaluation(response)
    }
}

/// Issue a GET, retrying once after the backoff on any failure.
async fn get_with_retry<T, F>(backoff: Duration, build: F) -> ProviderResult<T>
where
    T: DeserializeOwned,
    F: Fn() -> reqwest::RequestBuilder,
{
    match fetch_json::<T>(build()).await {
        Ok(value) => Ok(value),
        Err(first) => {
            tracing::debug!(error = %first, "provider request failed, retrying once");
            tokio::time::sleep(backoff).await;
            fetch_json::<T>(build()).await
        }
    }
}

async fn fetch_json<T: DeserializeOwned>(builder: reqwest::RequestBuilder) -> ProviderResult<T> {
    let response = builder.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }
    Ok(response.json::<T>().await?)
}

// --- wire formats -------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    #[serde(default)]
    white: u64,
    #[serde(default)]
    draws: u64,
    #[serde(default)]
    black: u64,
    #[serde(default)]
    moves: Vec<ExplorerMove>,
    #[serde(default, rename = "topGames")]
    top_games: Vec<ExplorerGame>,
}

#[derive(Debug, Deserialize)]
struct ExplorerMove {
    uci: String,
    san: String,
    #[serde(default)]
    white: u64,
    #[serde(default)]
    draws: u64,
    #[serde(default)]
    black: u64,
}

#[derive(Debug, Deserialize)]
struct ExplorerGame {
    id: String,
    winner: Option<String>,
    white: ExplorerPlayer,
    black: ExplorerPlayer,
    year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ExplorerPlayer {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CloudEvalResponse {
    #[serde(default)]
    depth: u32,
    #[serde(default)]
    pvs: Vec<CloudEvalPv>,
}

#[derive(Debug, Deserialize)]
struct CloudEvalPv {
    moves: String,
    cp: Option<i32>,
    mate: Option<i32>,
}

fn map_explorer(response: ExplorerResponse) -> OpeningStats {
    OpeningStats {
        white: response.white,
        draws: response.draws,
        black: response.black,
        moves: response
            .moves
            .into_iter()
            .map(|m| ContinuationStats {
                uci: m.uci,
                san: m.san,
                white: m.white,
                draws: m.draws,
                black: m.black,
            })
            .collect(),
        top_games: response
            .top_games
            .into_iter()
            .map(|g| TopGame {
                id: g.id,
                white: g.white.name,
                black: g.black.name,
                winner: g.winner,
                year: g.year,
            })
            .collect(),
    }
}

fn map_evaluation(response: CloudEvalResponse) -> ProviderResult<Evaluation> {
    let depth = response.depth;
    let pv = response
        .pvs
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("no principal variation".to_string()))?;

    let score = match (pv.mate, pv.cp) {
        (Some(mate), _) => EvalScore::Mate(mate),
        (None, Some(cp)) => EvalScore::Centipawns(cp),
        (None, None) => {
            return Err(ProviderError::Malformed(
                "evaluation carries neither cp nor mate".to_string(),
            ))
        }
    };

    let moves: Vec<String> = pv.moves.split_whitespace().map(str::to_string).collect();
    let best_move_uci = moves
        .first()
        .cloned()
        .ok_or_else(|| ProviderError::Malformed("empty principal variation".to_string()))?;

    Ok(Evaluation {
        score,
        best_move_uci,
        pv: moves,
        depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explorer_payload_maps_to_stats() {
        let json = r#"{
            "white": 1212,
            "draws": 1545,
            "black": 731,
            "moves": [
                {"uci": "g8f6", "san": "Nf6", "white": 700, "draws": 900, "black": 400},
                {"uci": "d7d5", "san": "d5", "white": 500, "draws": 600, "black": 300}
            ],
            "topGames": [
                {
                    "id": "abc123",
                    "winner": "white",
                    "white": {"name": "Carlsen, M.", "rating": 2850},
                    "black": {"name": "Caruana, F.", "rating": 2800},
                    "year": 2019
                }
            ]
        }"#;
        let response: ExplorerResponse = serde_json::from_str(json).unwrap();
        let stats = map_explorer(response);

        assert_eq!(stats.total_games(), 3488);
        assert_eq!(stats.moves.len(), 2);
        assert_eq!(stats.moves[0].uci, "g8f6");
        assert_eq!(stats.moves[0].total_games(), 2000);
        assert_eq!(stats.top_games[0].white, "Carlsen, M.");
        assert_eq!(stats.top_games[0].winner.as_deref(), Some("white"));
    }

    #[test]
    fn explorer_payload_tolerates_missing_sections() {
        let response: ExplorerResponse = serde_json::from_str("{}").unwrap();
        let stats = map_explorer(response);
        assert!(stats.is_empty());
        assert!(stats.top_games.is_empty());
    }

    #[test]
    fn eval_payload_maps_centipawns() {
        let json = r#"{
            "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "knodes": 13683,
            "depth": 22,
            "pvs": [{"moves": "e2e4 e7e5 g1f3", "cp": 30}]
        }"#;
        let response: CloudEvalResponse = serde_json::from_str(json).unwrap();
        let eval = map_evaluation(response).unwrap();

        assert_eq!(eval.score, EvalScore::Centipawns(30));
        assert_eq!(eval.best_move_uci, "e2e4");
        assert_eq!(eval.pv, vec!["e2e4", "e7e5", "g1f3"]);
        assert_eq!(eval.depth, 22);
    }

    #[test]
    fn eval_payload_maps_mate() {
        let json = r#"{"depth": 30, "pvs": [{"moves": "f3f7", "mate": 1}]}"#;
        let response: CloudEvalResponse = serde_json::from_str(json).unwrap();
        let eval = map_evaluation(response).unwrap();
        assert_eq!(eval.score, EvalScore::Mate(1));
        assert_eq!(eval.best_move_uci, "f3f7");
    }

    #[test]
    fn eval_payload_without_pv_is_malformed() {
        let response: CloudEvalResponse = serde_json::from_str(r#"{"depth": 20}"#).unwrap();
        assert!(matches!(
            map_evaluation(response),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn eval_payload_without_score_is_malformed() {
        let json = r#"{"depth": 20, "pvs": [{"moves": "e2e4"}]}"#;
        let response: CloudEvalResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            map_evaluation(response),
            Err(ProviderError::Malformed(_))
        ));
    }
}
