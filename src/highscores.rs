//! High score boundary
//!
//! The simulation only supplies candidate scores; where the best score is
//! kept is up to the host. A JSON file store is provided for the native
//! runner.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Persistent "best score" record
pub trait HighScoreStore {
    fn best(&self) -> u64;
    fn set_best(&mut self, score: u64);
}

/// Offer a final score; written only when it beats the stored best.
///
/// Returns true on a new high score.
pub fn submit_score(store: &mut dyn HighScoreStore, score: u64) -> bool {
    if score == 0 || score <= store.best() {
        return false;
    }
    log::info!("New high score: {} (was {})", score, store.best());
    store.set_best(score);
    true
}

/// Submit the score carried by a round boundary event (level won, game over).
///
/// Other events are ignored. Returns true on a new high score.
pub fn submit_at_boundary(store: &mut dyn HighScoreStore, event: &GameEvent) -> bool {
    match event {
        GameEvent::LevelWon { score, .. } | GameEvent::GameOver { score } => {
            submit_score(store, *score)
        }
        _ => false,
    }
}

/// In-memory store (tests, embedding hosts with their own persistence)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStore {
    pub best: u64,
}

impl HighScoreStore for MemoryStore {
    fn best(&self) -> u64 {
        self.best
    }

    fn set_best(&mut self, score: u64) {
        self.best = score;
    }
}

/// On-disk record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct HighScoreFile {
    best: u64,
}

/// Best score kept in a small JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    best: u64,
}

impl JsonFileStore {
    /// Open a store, starting fresh if the file is missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let best = match Self::load(&path) {
            Ok(record) => {
                log::info!("Loaded high score {} from {}", record.best, path.display());
                record.best
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No high score file at {}, starting fresh", path.display());
                0
            }
            Err(e) => {
                log::warn!("Ignoring high score file {}: {}", path.display(), e);
                0
            }
        };
        Self { path, best }
    }

    fn load(path: &Path) -> io::Result<HighScoreFile> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the current best to disk
    pub fn save(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&HighScoreFile { best: self.best })
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileStore {
    fn best(&self) -> u64 {
        self.best
    }

    fn set_best(&mut self, score: u64) {
        self.best = score;
        if let Err(e) = self.save() {
            log::warn!("Failed to save high score to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_only_on_new_best() {
        let mut store = MemoryStore::default();
        assert!(!submit_score(&mut store, 0));
        assert!(submit_score(&mut store, 500));
        assert!(!submit_score(&mut store, 500));
        assert!(!submit_score(&mut store, 120));
        assert_eq!(store.best(), 500);
        assert!(submit_score(&mut store, 501));
        assert_eq!(store.best(), 501);
    }

    #[test]
    fn test_boundary_events_submit() {
        let mut store = MemoryStore::default();
        assert!(!submit_at_boundary(&mut store, &GameEvent::LifeLost { lives_left: 2 }));
        assert_eq!(store.best(), 0);

        let won = GameEvent::LevelWon {
            level: 0,
            score: 400,
            lives: 3,
        };
        assert!(submit_at_boundary(&mut store, &won));
        assert_eq!(store.best(), 400);

        // A lower game-over score after a level win keeps the best
        assert!(!submit_at_boundary(&mut store, &GameEvent::GameOver { score: 300 }));
        assert!(submit_at_boundary(&mut store, &GameEvent::GameOver { score: 650 }));
        assert_eq!(store.best(), 650);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.best(), 0);
        assert!(submit_score(&mut store, 2450));

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.best(), 2450);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.json");
        fs::write(&path, "not json").unwrap();

        let mut store = JsonFileStore::open(&path);
        assert_eq!(store.best(), 0);
        // A new best overwrites the corrupt file
        assert!(submit_score(&mut store, 90));
        assert_eq!(JsonFileStore::open(&path).best(), 90);
    }
}
