//! Tile-maze arcade game: collect every key, dodge traps and reach the exit
//! before the clock runs out. The library holds the rules; `main.rs` is a
//! terminal frontend over it.

pub mod constants;
pub mod effects;
pub mod error;
pub mod game;
pub mod generator;
pub mod grid;
pub mod leaderboard;
pub mod level_file;
pub mod portal;
pub mod render;
pub mod settings;
pub mod tile;

pub use error::{LeaderboardError, LevelError};
pub use game::{Game, Phase};
pub use grid::{Dir, Grid, Pos};
pub use settings::{Profile, Settings, Tuning};
pub use tile::Tile;
