//! Core of the opening trainer: move-quality classification, opponent
//! move selection, replay of recorded games, and the session orchestration
//! that ties them to a live [`chess::Game`].

pub mod opponent;
pub mod quality;
pub mod recorded;
pub mod replay;
pub mod session;
pub mod store;

pub use opponent::{Difficulty, OpponentSelector};
pub use quality::{MoveQuality, QualityAnalyzer, QualityClass, ANALYSIS_DEPTH};
pub use recorded::{GameOutcome, RecordedGame};
pub use replay::{InferiorMoveAnnotation, ReplayPhase, ReplaySession};
pub use session::{SessionEvent, TrainingSession};
pub use store::{GameStore, JsonStore, Storable, StoreError};
