use thiserror::Error;

/// Problems with a level that block loading it or starting a test run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("level file is not valid: {0}")]
    Corrupt(String),

    #[error("level map must be {expected}x{expected}, got {rows} rows")]
    WrongSize { expected: usize, rows: usize },

    #[error("level has no key")]
    MissingKey,

    #[error("level has no exit")]
    MissingExit,

    #[error("start cell (1,1) is not walkable")]
    BlockedStart,
}

impl From<serde_json::Error> for LevelError {
    fn from(err: serde_json::Error) -> Self {
        LevelError::Corrupt(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("leaderboard data is not valid: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("leaderboard is empty")]
    Empty,
}
