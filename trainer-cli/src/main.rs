mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chess::DisplayBoard;
use clap::Parser;
use cozy_chess::GameStatus;
use providers::{CloudEvalClient, ExplorerClient, ProviderConfig};
use trainer::{Difficulty, GameStore, OpponentSelector, TrainingSession};

/// Self-play demo session for the opening-trainer core: the trainee side
/// follows the move database, the opponent plays at the chosen tier, and
/// every trainee move is analyzed in the background.
#[derive(Parser, Debug)]
#[command(name = "trainer-cli", about = "Opening trainer demo session")]
struct Args {
    /// Opponent difficulty: beginner, intermediate or advanced.
    #[arg(long, default_value = "intermediate")]
    difficulty: Difficulty,

    /// Maximum number of full moves to play.
    #[arg(long, default_value_t = 8)]
    moves: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let data_dir = config::data_dir();
    tracing::info!(data_dir = %data_dir.display(), "starting training session");

    let provider_config = ProviderConfig::from_env();
    let database =
        Arc::new(ExplorerClient::new(&provider_config).context("building explorer client")?);
    let evaluator =
        Arc::new(CloudEvalClient::new(&provider_config).context("building evaluator client")?);

    let store = GameStore::new(data_dir);
    let mut session = TrainingSession::new(
        Arc::clone(&database),
        Arc::clone(&evaluator),
        store,
        args.difficulty,
    );

    // The demo trainee follows the database line, same as a student
    // drilling main-line theory.
    let trainee = OpponentSelector::new(database, evaluator);

    for move_number in 1..=args.moves {
        if session.game().status() != GameStatus::Ongoing {
            break;
        }
        let Some(mv) = trainee
            .select(session.game(), Difficulty::Intermediate)
            .await
        else {
            break;
        };
        let played = session
            .play_human_move(mv.from, mv.to, mv.promotion)
            .context("applying trainee move")?;

        match session.opponent_reply().await? {
            Some(reply) => println!("{move_number:>3}. {:<8} {}", played.san, reply.san),
            None => {
                println!("{move_number:>3}. {}", played.san);
                break;
            }
        }
        session.drain_quality_results();
    }

    let board = DisplayBoard::from_fen(&session.game().fen()).context("rendering final position")?;
    println!("\n{}", board.to_ascii());

    // Give stragglers a moment, then report whatever analysis arrived.
    tokio::time::sleep(Duration::from_millis(750)).await;
    session.drain_quality_results();

    if session.qualities().is_empty() {
        println!("No analysis available (evaluator unreachable?). Play continued regardless.");
    } else {
        println!("Move quality:");
        for quality in session.qualities() {
            let best = quality
                .best_san
                .as_deref()
                .map(|b| format!(" (best: {b})"))
                .unwrap_or_default();
            println!(
                "  #{:<3} {:<8} {:<10} drop {:>4} cp{}",
                quality.move_number, quality.san, quality.class.to_string(), quality.eval_drop, best
            );
        }
    }

    if let Some(recorded) = session.finish() {
        println!(
            "\nGame over: {} ({}). Recorded as {}.",
            recorded.outcome, recorded.outcome_reason, recorded.id
        );

        // Walk the recording back through the replay engine.
        session.enter_replay(Arc::new(recorded));
        while session.replay().index() < session.replay().move_count() {
            session.replay_mut().step(1);
            if let Some(annotation) = session.replay().annotation() {
                println!(
                    "  move {}: played {}-{}, better was {}-{}",
                    session.replay().index(),
                    annotation.played.0,
                    annotation.played.1,
                    annotation.best.0,
                    annotation.best.1
                );
            }
        }
        session.exit_replay();
    } else {
        println!("\nSession ended before a terminal state; nothing recorded.");
    }

    Ok(())
}
