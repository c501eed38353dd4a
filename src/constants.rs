// Gameplay tuning. Times are milliseconds unless the name says otherwise.

pub const START: crate::grid::Pos = crate::grid::Pos { x: 1, y: 1 };

pub const PREGENERATED_LEVELS: u32 = 10;
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

pub const DEFAULT_MOVE_DELAY: u64 = 200;
pub const TURN_DELAY_FACTOR: f64 = 0.3;
pub const HASTE_STEP: u64 = 15;
pub const HASTE_FLOOR: u64 = 50;

pub const TRAIL_CAPACITY: usize = 15;
pub const TRAIL_MAX_AGE: u64 = 1500;

pub const KEY_SCORE: i64 = 100;
pub const TRAP_PENALTY_SCORE: i64 = 1500;
pub const TRAP_PENALTY_SECS: i64 = 10;
pub const TRAP_IMMUNE_BONUS: i64 = 150;
pub const SLOWDOWN_DURATION: u64 = 5000;
pub const POWERUP_SCORE: i64 = 150;
pub const SPEED_BOOST_DURATION: u64 = 10_000;

pub const TRIGGER_EXTRA_SECS: i64 = 10;
pub const TRIGGER_SCORE: i64 = 700;
pub const TRIGGER_NO_KEY_SCORE: i64 = 100;
pub const TRIGGER_KEY_BONUS: i64 = 350;
pub const IMMUNITY_DURATION: u64 = 10_000;
pub const INVISIBILITY_DURATION: u64 = 8000;

pub const LEVEL_TIME_BONUS: i64 = 10;
pub const BASE_TIME_LIMIT: i64 = 120;
pub const TIME_LIMIT_STEP: i64 = 8;
pub const MIN_TIME_LIMIT: i64 = 45;

pub const PORTAL_SECRET: &str = "keyportal";
pub const PORTAL_BUFFER_LEN: usize = 20;
pub const PORTAL_DURATION: u64 = 2000;

pub const LEADERBOARD_SIZE: usize = 10;
pub const LEADERBOARD_IMPORT_SIZE: usize = 20;
pub const GAME_VERSION: &str = "1.0";
