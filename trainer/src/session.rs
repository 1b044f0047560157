//! One live training session: synchronous move application, background
//! quality analysis, opponent replies, and the hand-off into persistence
//! and replay when the game ends.

use std::sync::Arc;

use chess::{Game, GameError, HistoryEntry};
use cozy_chess::{GameStatus, Piece, Square};
use providers::{MoveDatabase, PositionEvaluator};
use tokio::sync::{broadcast, mpsc};

use crate::opponent::{Difficulty, OpponentSelector};
use crate::quality::{MoveQuality, QualityAnalyzer};
use crate::recorded::RecordedGame;
use crate::replay::ReplaySession;
use crate::store::GameStore;

/// Notifications for renderers. Dropped silently when nobody listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The live position changed (move, undo, reset).
    StateChanged,
    /// Analysis attached for the given move number.
    QualityAttached(u32),
    /// The game reached a terminal state and was recorded under this id.
    GameRecorded(String),
}

/// Orchestrates a live game against the selected opponent tier.
///
/// Move application is synchronous and ordered; quality analysis runs as
/// an independent fire-and-forget task per human move and is re-attached
/// by move number whenever it lands, even after further moves.
pub struct TrainingSession<D, E> {
    game: Game,
    difficulty: Difficulty,
    selector: OpponentSelector<D, E>,
    analyzer: Arc<QualityAnalyzer<E>>,
    qualities: Vec<MoveQuality>,
    quality_tx: mpsc::UnboundedSender<MoveQuality>,
    quality_rx: mpsc::UnboundedReceiver<MoveQuality>,
    store: GameStore,
    replay: ReplaySession,
    recorded_id: Option<String>,
    player_label: String,
    events: broadcast::Sender<SessionEvent>,
}

impl<D, E> TrainingSession<D, E>
where
    D: MoveDatabase + 'static,
    E: PositionEvaluator + 'static,
{
    pub fn new(
        database: Arc<D>,
        evaluator: Arc<E>,
        store: GameStore,
        difficulty: Difficulty,
    ) -> Self {
        let (quality_tx, quality_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(64);
        Self {
            game: Game::new(),
            difficulty,
            selector: OpponentSelector::new(database, Arc::clone(&evaluator)),
            analyzer: Arc::new(QualityAnalyzer::new(evaluator)),
            qualities: Vec::new(),
            quality_tx,
            quality_rx,
            store,
            replay: ReplaySession::new(),
            recorded_id: None,
            player_label: "You".to_string(),
            events,
        }
    }

    /// Subscribe to session notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn with_player_label(mut self, label: &str) -> Self {
        self.player_label = label.to_string();
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Quality results attached so far, ordered by move number.
    pub fn qualities(&self) -> &[MoveQuality] {
        &self.qualities
    }

    pub fn replay(&self) -> &ReplaySession {
        &self.replay
    }

    pub fn replay_mut(&mut self) -> &mut ReplaySession {
        &mut self.replay
    }

    /// Apply a human move by coordinates and kick off its analysis.
    pub fn play_human_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
    ) -> Result<HistoryEntry, GameError> {
        let fen_before = self.game.fen();
        let entry = self.game.try_move(from, to, promotion)?;
        let _ = self.events.send(SessionEvent::StateChanged);
        self.spawn_analysis(fen_before, &entry);
        Ok(entry)
    }

    /// Apply a human move by algebraic notation (lesson scripts).
    pub fn play_human_move_san(&mut self, san: &str) -> Result<HistoryEntry, GameError> {
        let fen_before = self.game.fen();
        let entry = self.game.try_move_san(san)?;
        let _ = self.events.send(SessionEvent::StateChanged);
        self.spawn_analysis(fen_before, &entry);
        Ok(entry)
    }

    /// Request and apply the opponent's reply. Called only after the human
    /// move is fully applied; returns `Ok(None)` when the game is already
    /// over or no move exists.
    pub async fn opponent_reply(&mut self) -> Result<Option<HistoryEntry>, GameError> {
        if self.game.status() != GameStatus::Ongoing {
            return Ok(None);
        }
        let Some(mv) = self.selector.select(&self.game, self.difficulty).await else {
            return Ok(None);
        };
        let entry = self.game.try_move(mv.from, mv.to, mv.promotion)?;
        let _ = self.events.send(SessionEvent::StateChanged);
        Ok(Some(entry))
    }

    /// Pass-throughs to the live game's selection state.
    pub fn select_square(&mut self, sq: Square) {
        self.game.select_square(sq);
    }

    pub fn undo_last(&mut self) {
        self.game.undo_last();
        let _ = self.events.send(SessionEvent::StateChanged);
    }

    /// Attach any completed analysis results, keyed by move number; at
    /// most one entry per move number is kept. Returns how many attached.
    pub fn drain_quality_results(&mut self) -> usize {
        let mut attached = 0;
        while let Ok(quality) = self.quality_rx.try_recv() {
            if self
                .qualities
                .iter()
                .any(|q| q.move_number == quality.move_number)
            {
                continue;
            }
            let _ = self
                .events
                .send(SessionEvent::QualityAttached(quality.move_number));
            self.qualities.push(quality);
            attached += 1;
        }
        if attached > 0 {
            self.qualities.sort_by_key(|q| q.move_number);
        }
        attached
    }

    /// Build the one-and-only record for a finished game and persist it.
    /// A storage failure is logged and ignored; the record is still
    /// returned so replay can proceed.
    pub fn finish(&mut self) -> Option<RecordedGame> {
        if self.recorded_id.is_some() {
            return None;
        }
        self.drain_quality_results();
        let opponent_label = format!("Trainer ({})", self.difficulty);
        let recorded = RecordedGame::from_finished(
            &self.game,
            self.difficulty,
            self.qualities.clone(),
            &self.player_label,
            &opponent_label,
        )?;

        if let Err(e) = self.store.save(&recorded) {
            tracing::warn!(error = %e, id = %recorded.id, "failed to persist recorded game; continuing");
        }
        self.recorded_id = Some(recorded.id.clone());
        let _ = self
            .events
            .send(SessionEvent::GameRecorded(recorded.id.clone()));
        tracing::info!(id = %recorded.id, moves = recorded.move_count(), "game recorded");
        Some(recorded)
    }

    /// Enter replay over a recorded game.
    pub fn enter_replay(&mut self, recorded: Arc<RecordedGame>) {
        self.replay.enter(recorded);
    }

    /// Leave replay and reset the live game for a fresh start.
    pub fn exit_replay(&mut self) {
        self.replay.exit();
        self.reset();
    }

    /// Reset the live game and all per-game state.
    pub fn reset(&mut self) {
        self.game.reset();
        self.qualities.clear();
        self.recorded_id = None;
        // Discard in-flight analysis from the previous game.
        while self.quality_rx.try_recv().is_ok() {}
        let _ = self.events.send(SessionEvent::StateChanged);
    }

    fn spawn_analysis(&self, fen_before: String, entry: &HistoryEntry) {
        let move_number = self.game.history().len() as u32;
        let analyzer = Arc::clone(&self.analyzer);
        let tx = self.quality_tx.clone();
        let san = entry.san.clone();
        // Fire-and-forget: a slow or failed analysis never stalls play.
        // Send failure just means the session is gone.
        tokio::spawn(async move {
            if let Some(quality) = analyzer.analyze(&fen_before, &san, move_number).await {
                let _ = tx.send(quality);
            }
        });
    }
}
