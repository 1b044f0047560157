//! Local persistence: a generic JSON-file-per-record store plus the
//! capped recorded-game store on top of it.
//!
//! Every failure here is recoverable by contract: callers skip the save
//! or fall back to defaults, in-memory state continues unaffected.

use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::recorded::RecordedGame;

/// Most-recent-games kept on disk.
pub const GAME_CAP: usize = 25;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Types persistable in a [`JsonStore`].
pub trait Storable: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
}

/// Generic JSON-file-per-record store.
pub struct JsonStore<T> {
    dir: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T: Storable> JsonStore<T> {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _phantom: PhantomData,
        }
    }

    fn file_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Save a record, creating the directory on first use.
    pub fn save(&self, data: &T) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(self.file_path(data.id()), json)?;
        Ok(())
    }

    /// Load a record by id; `None` if absent.
    pub fn load(&self, id: &str) -> Result<Option<T>, StoreError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Load every record, skipping files that fail to read or parse.
    pub fn load_all(&self) -> Result<Vec<T>, StoreError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut items = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<T>(&contents) {
                    Ok(data) => items.push(data),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unparseable record");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
                }
            }
        }
        Ok(items)
    }

    /// Delete a record by id; deleting a missing record is a no-op.
    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = self.file_path(id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// Capped store for recorded games: keeps the most recent [`GAME_CAP`]
/// entries, evicting the oldest on save.
pub struct GameStore {
    inner: JsonStore<RecordedGame>,
    cap: usize,
}

impl GameStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self::with_cap(data_dir, GAME_CAP)
    }

    pub fn with_cap(data_dir: PathBuf, cap: usize) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join("recorded_games")),
            cap,
        }
    }

    /// Save a game and evict anything beyond the cap, oldest first.
    pub fn save(&self, game: &RecordedGame) -> Result<(), StoreError> {
        self.inner.save(game)?;
        let games = self.list()?;
        for stale in games.iter().skip(self.cap) {
            tracing::debug!(id = %stale.id, "evicting recorded game beyond cap");
            self.inner.delete(&stale.id)?;
        }
        Ok(())
    }

    /// All recorded games, most recent first.
    pub fn list(&self) -> Result<Vec<RecordedGame>, StoreError> {
        let mut games = self.inner.load_all()?;
        games.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(games)
    }

    pub fn load(&self, id: &str) -> Result<Option<RecordedGame>, StoreError> {
        self.inner.load(id)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.inner.delete(id)
    }
}

/// Current unix timestamp in seconds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opponent::Difficulty;
    use crate::recorded::GameOutcome;

    fn sample_game(id: &str, created_at: u64) -> RecordedGame {
        RecordedGame {
            id: id.to_string(),
            created_at,
            difficulty: Difficulty::Beginner,
            outcome: GameOutcome::WhiteWins,
            outcome_reason: "Checkmate".to_string(),
            pgn: "[Event \"Opening training\"]\n\n1. e4 1-0\n".to_string(),
            moves: vec!["e4".to_string()],
            qualities: Vec::new(),
            white: "You".to_string(),
            black: "Trainer (beginner)".to_string(),
        }
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::new(dir.path().to_path_buf());
        let game = sample_game("game_1", 100);
        store.save(&game).unwrap();

        let loaded = store.load("game_1").unwrap().unwrap();
        assert_eq!(loaded.id, game.id);
        assert_eq!(loaded.moves, game.moves);
        assert_eq!(loaded.outcome, GameOutcome::WhiteWins);
    }

    #[test]
    fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::new(dir.path().to_path_buf());
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn list_is_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::new(dir.path().to_path_buf());
        store.save(&sample_game("game_old", 100)).unwrap();
        store.save(&sample_game("game_new", 300)).unwrap();
        store.save(&sample_game("game_mid", 200)).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["game_new", "game_mid", "game_old"]);
    }

    #[test]
    fn cap_evicts_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::with_cap(dir.path().to_path_buf(), 2);
        store.save(&sample_game("game_a", 100)).unwrap();
        store.save(&sample_game("game_b", 200)).unwrap();
        store.save(&sample_game("game_c", 300)).unwrap();

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["game_c", "game_b"]);
        assert!(store.load("game_a").unwrap().is_none());
    }

    #[test]
    fn delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::new(dir.path().to_path_buf());
        store.save(&sample_game("game_x", 100)).unwrap();
        store.delete("game_x").unwrap();
        assert!(store.load("game_x").unwrap().is_none());
        // Deleting again is a no-op.
        store.delete("game_x").unwrap();
    }

    #[test]
    fn unparseable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = GameStore::new(dir.path().to_path_buf());
        store.save(&sample_game("game_ok", 100)).unwrap();
        std::fs::write(
            dir.path().join("recorded_games").join("broken.json"),
            "not json",
        )
        .unwrap();

        let games = store.list().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, "game_ok");
    }

    #[test]
    fn save_into_unwritable_location_errors() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the store expects a directory.
        let blocker = dir.path().join("blocked");
        std::fs::write(&blocker, "file").unwrap();
        let store = GameStore::new(blocker);
        assert!(store.save(&sample_game("game_1", 100)).is_err());
    }
}
