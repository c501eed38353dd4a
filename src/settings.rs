//! Runtime configuration, read from `KEYMAZE_*` environment variables.

use std::path::PathBuf;

const DEFAULT_TICK_MS: u64 = 16;
const DEFAULT_RENDER_FPS: u64 = 60;
const DEFAULT_LEADERBOARD: &str = "keymaze-leaderboard.json";

/// Desktop plays on a large board with quick steps; compact is the small
/// touch-style board with every delay stretched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Desktop,
    Compact,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub grid_size: usize,
    pub min_step: u64,
    pub min_turn_step: u64,
    pub delay_factor: f64,
}

impl Profile {
    pub fn tuning(self) -> Tuning {
        match self {
            Profile::Desktop => Tuning {
                grid_size: 32,
                min_step: 25,
                min_turn_step: 50,
                delay_factor: 1.0,
            },
            Profile::Compact => Tuning {
                grid_size: 16,
                min_step: 90,
                min_turn_step: 110,
                delay_factor: 2.75,
            },
        }
    }
}

impl Tuning {
    /// Move delay for the tile the player just stepped on, before status
    /// modifiers.
    pub fn tile_delay(&self, tile: crate::tile::Tile) -> u64 {
        match tile.base_delay() {
            Some(ms) => (ms as f64 * self.delay_factor).round() as u64,
            None => self.min_step,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub tick_ms: u64,
    pub render_fps: u64,
    pub profile: Profile,
    pub seed: Option<u64>,
    pub leaderboard_path: PathBuf,
    pub log_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let positive = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        let profile = match lookup("KEYMAZE_PROFILE").as_deref().map(str::trim) {
            Some("compact") | Some("mobile") => Profile::Compact,
            _ => Profile::Desktop,
        };
        Settings {
            tick_ms: positive("KEYMAZE_TICK_MS", DEFAULT_TICK_MS),
            render_fps: positive("KEYMAZE_FPS", DEFAULT_RENDER_FPS),
            profile,
            seed: lookup("KEYMAZE_SEED").and_then(|v| v.trim().parse::<u64>().ok()),
            leaderboard_path: lookup("KEYMAZE_LEADERBOARD")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEADERBOARD)),
            log_path: lookup("KEYMAZE_LOG")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
