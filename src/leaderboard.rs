//! High score leaderboards
//!
//! The local board is a top 10 kept under its own storage key. The remote
//! board is whatever append/query service the host wires in; its failures
//! never reach the player.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::LEADERBOARD_KEY;
use crate::persistence::{Storage, StorageError};

/// Maximum number of local entries kept
pub const MAX_HIGH_SCORES: usize = 10;
/// Initials are cut to this many characters
pub const INITIALS_LEN: usize = 3;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub initials: String,
    pub score: u64,
    /// `YYYY-MM-DD`
    pub date: String,
}

/// Uppercase and cut to `INITIALS_LEN` characters
pub fn normalize_initials(initials: &str) -> String {
    let cut: String = initials
        .trim()
        .chars()
        .take(INITIALS_LEN)
        .collect::<String>()
        .to_uppercase();
    if cut.is_empty() { "---".to_string() } else { cut }
}

/// Local top-10, sorted by score descending
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalLeaderboard {
    pub entries: Vec<HighScoreEntry>,
}

impl LocalLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the board
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would get (1-indexed), `None` if it doesn't qualify
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a score. Ties rank below existing entries.
    /// Returns the rank achieved or `None` if it didn't qualify.
    pub fn add_score(&mut self, initials: &str, score: u64, date: &str) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let entry = HighScoreEntry {
            initials: normalize_initials(initials),
            score,
            date: date.to_string(),
        };
        let index = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(index, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load from storage. Missing or unreadable boards start empty.
    pub fn load(storage: &impl Storage) -> Self {
        match storage.get_item(LEADERBOARD_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Self>(&json) {
                Ok(mut board) => {
                    board.entries.sort_by(|a, b| b.score.cmp(&a.score));
                    board.entries.truncate(MAX_HIGH_SCORES);
                    log::info!("Loaded {} high scores", board.entries.len());
                    board
                }
                Err(err) => {
                    log::warn!("Failed to parse leaderboard: {err}");
                    Self::new()
                }
            },
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(err) => {
                log::warn!("Failed to load leaderboard: {err}");
                Self::new()
            }
        }
    }

    pub fn save(&self, storage: &mut impl Storage) -> Result<(), StorageError> {
        let json = serde_json::to_string(self)?;
        storage.set_item(LEADERBOARD_KEY, &json)?;
        log::debug!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}

/// Remote leaderboard failures
#[derive(Debug, Error)]
pub enum LeaderboardError {
    /// Service not configured or unreachable
    #[error("leaderboard service unavailable")]
    Unavailable,
    #[error("leaderboard rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub score: u64,
    pub timestamp_ms: i64,
}

/// Append/query global leaderboard
pub trait RemoteLeaderboard {
    fn submit(&mut self, initials: &str, score: u64, timestamp_ms: i64)
    -> Result<(), LeaderboardError>;

    /// Best `limit` scores, highest first
    fn top(&self, limit: usize) -> Result<Vec<RemoteEntry>, LeaderboardError>;
}

/// Submit and log instead of failing
pub fn submit_quietly(
    remote: &mut dyn RemoteLeaderboard,
    initials: &str,
    score: u64,
    timestamp_ms: i64,
) -> bool {
    match remote.submit(initials, score, timestamp_ms) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("Error submitting score: {err}");
            false
        }
    }
}

/// Remote board kept in memory, for tests and offline hosts
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemote {
    entries: Vec<RemoteEntry>,
    offline: bool,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `Unavailable`
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RemoteLeaderboard for InMemoryRemote {
    fn submit(
        &mut self,
        initials: &str,
        score: u64,
        timestamp_ms: i64,
    ) -> Result<(), LeaderboardError> {
        if self.offline {
            return Err(LeaderboardError::Unavailable);
        }
        self.entries.push(RemoteEntry {
            name: normalize_initials(initials),
            score,
            timestamp_ms,
        });
        Ok(())
    }

    fn top(&self, limit: usize) -> Result<Vec<RemoteEntry>, LeaderboardError> {
        if self.offline {
            return Err(LeaderboardError::Unavailable);
        }
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.score.cmp(&a.score));
        sorted.truncate(limit);
        Ok(sorted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    fn full_board() -> LocalLeaderboard {
        let mut board = LocalLeaderboard::new();
        for i in 1..=10 {
            board.add_score("abc", i * 10, "2024-03-01");
        }
        board
    }

    #[test]
    fn test_empty_board_takes_any_positive_score() {
        let board = LocalLeaderboard::new();
        assert!(board.qualifies(1));
        assert!(!board.qualifies(0));
        assert_eq!(board.potential_rank(5), Some(1));
    }

    #[test]
    fn test_full_board_must_beat_lowest() {
        let board = full_board();
        assert_eq!(board.entries.len(), 10);
        assert!(!board.qualifies(10));
        assert!(board.qualifies(11));
        assert_eq!(board.potential_rank(55), Some(6));
        assert_eq!(board.potential_rank(500), Some(1));
    }

    #[test]
    fn test_add_score_ranks_and_trims() {
        let mut board = full_board();
        assert_eq!(board.add_score("zed", 55, "2024-03-02"), Some(6));
        assert_eq!(board.entries.len(), 10);
        assert_eq!(board.entries[5].initials, "ZED");
        assert_eq!(board.entries.last().map(|e| e.score), Some(20));
        assert_eq!(board.add_score("low", 5, "2024-03-02"), None);
        assert_eq!(board.top_score(), Some(100));
    }

    #[test]
    fn test_ties_rank_below_existing() {
        let mut board = LocalLeaderboard::new();
        board.add_score("one", 50, "2024-03-01");
        assert_eq!(board.add_score("two", 50, "2024-03-01"), Some(2));
    }

    #[test]
    fn test_initials_are_normalized() {
        assert_eq!(normalize_initials("abcd"), "ABC");
        assert_eq!(normalize_initials(" jo "), "JO");
        assert_eq!(normalize_initials(""), "---");
    }

    #[test]
    fn test_storage_round_trip() {
        let mut storage = MemoryStorage::new();
        let board = full_board();
        board.save(&mut storage).unwrap();
        assert_eq!(LocalLeaderboard::load(&storage), board);

        let broken = MemoryStorage::new().with_item(LEADERBOARD_KEY, "{oops");
        assert!(LocalLeaderboard::load(&broken).is_empty());
    }

    #[test]
    fn test_remote_orders_and_fails_quietly() {
        let mut remote = InMemoryRemote::new();
        assert!(submit_quietly(&mut remote, "aaa", 10, 1));
        assert!(submit_quietly(&mut remote, "bbb", 30, 2));
        assert!(submit_quietly(&mut remote, "ccc", 20, 3));
        let top = remote.top(2).unwrap();
        assert_eq!(top.iter().map(|e| e.score).collect::<Vec<_>>(), vec![30, 20]);

        remote.set_offline(true);
        assert!(!submit_quietly(&mut remote, "ddd", 40, 4));
        assert!(remote.top(5).is_err());
        assert_eq!(remote.len(), 3);
    }
}
