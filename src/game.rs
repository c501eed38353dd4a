//! The game session: map, player, timers and every rule that fires when the
//! player moves. All time is passed in as milliseconds from a caller-chosen
//! origin and all randomness comes from the caller's rng.

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::*;
use crate::effects::{prune_effects, ActiveEffect, StatusKind, Statuses, Trail, TriggerEffect};
use crate::error::LevelError;
use crate::generator::LevelSet;
use crate::grid::{self, count_tiles, empty_map, find_tiles, is_passable, move_target, neighbor, Dir, Grid, Pos};
use crate::leaderboard::LeaderboardEntry;
use crate::level_file::LevelFile;
use crate::portal::Portal;
use crate::settings::Tuning;
use crate::tile::Tile;

const FLASH_DURATION: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Playing,
    Editor,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub pos: Pos,
    pub last_move: u64,
    pub move_delay: u64,
    pub last_dir: Option<Dir>,
    pub statuses: Statuses,
}

impl Player {
    fn at_start() -> Self {
        Player {
            pos: START,
            last_move: 0,
            move_delay: DEFAULT_MOVE_DELAY,
            last_dir: None,
            statuses: Statuses::default(),
        }
    }
}

/// A short message for the player, shown until `until`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub text: String,
    pub until: u64,
}

pub struct Game {
    pub phase: Phase,
    pub grid: Grid,
    pub player: Player,
    pub level: u32,
    pub score: i64,
    pub keys: u32,
    pub time_limit: i64,
    pub time_remaining: i64,
    pub trail: Trail,
    pub effects: Vec<ActiveEffect>,
    pub flash: Option<Flash>,
    tuning: Tuning,
    levels: LevelSet,
    portal: Portal,
    held: Option<Dir>,
    level_started: u64,
    time_adjust: i64,
}

impl Game {
    pub fn new(rng: &mut impl Rng, tuning: Tuning) -> Self {
        let levels = LevelSet::new(rng, tuning.grid_size);
        let grid = levels.level(1, rng);
        Game {
            phase: Phase::Menu,
            grid,
            player: Player::at_start(),
            level: 1,
            score: 0,
            keys: 0,
            time_limit: BASE_TIME_LIMIT,
            time_remaining: BASE_TIME_LIMIT,
            trail: Trail::default(),
            effects: Vec::new(),
            flash: None,
            tuning,
            levels,
            portal: Portal::default(),
            held: None,
            level_started: 0,
            time_adjust: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.levels.size()
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn start(&mut self, now: u64, rng: &mut impl Rng) {
        self.phase = Phase::Playing;
        self.level = 1;
        self.score = 0;
        self.time_limit = BASE_TIME_LIMIT;
        self.grid = self.levels.level(1, rng);
        self.reset_level(now);
        info!("game started");
    }

    pub fn restart(&mut self, now: u64, rng: &mut impl Rng) {
        self.start(now, rng);
    }

    /// Handles one directional request. Returns `true` when the player moved
    /// or teleported; rejected requests change nothing.
    pub fn handle_move(&mut self, dir: Dir, now: u64, rng: &mut impl Rng) -> bool {
        if self.phase != Phase::Playing {
            return false;
        }

        if self.portal.is_open(now) {
            if let Some(dest) = self.portal.next_target(&self.grid) {
                self.trail.push(self.player.pos, now, &self.player.statuses);
                self.player.pos = dest;
                self.player.last_move = now;
                self.player.last_dir = Some(dir);
                self.player.move_delay = self.tuning.min_step;
                debug!("portal jump to ({}, {})", dest.x, dest.y);
                self.interact(dest, now, rng);
                return true;
            }
        }

        let elapsed = now.saturating_sub(self.player.last_move) as f64;
        let threshold = if self.player.last_dir == Some(dir) {
            self.player.move_delay as f64
        } else {
            (self.player.move_delay as f64 * TURN_DELAY_FACTOR).max(self.tuning.min_turn_step as f64)
        };
        if elapsed < threshold {
            return false;
        }

        let Some(next) = move_target(&self.grid, self.player.pos, dir) else {
            return false;
        };

        self.trail.push(self.player.pos, now, &self.player.statuses);
        self.player.pos = next;
        self.player.last_move = now;
        self.player.last_dir = Some(dir);

        let tile = self.grid[next.y][next.x];
        let mut delay = self.tuning.tile_delay(tile);
        if self.player.statuses.is_active(StatusKind::SpeedBoost, now) {
            delay = (delay / 2).max(self.tuning.min_step);
        }
        if self.player.statuses.is_active(StatusKind::Slowdown, now) {
            delay *= 2;
        }
        self.player.move_delay = delay;

        self.interact(next, now, rng);
        true
    }

    fn interact(&mut self, pos: Pos, now: u64, rng: &mut impl Rng) {
        match self.grid[pos.y][pos.x] {
            Tile::Key => {
                self.keys += 1;
                self.score += KEY_SCORE;
                self.grid[pos.y][pos.x] = Tile::Grass;
                debug!("key collected, {} left", count_tiles(&self.grid, Tile::Key));
            }
            Tile::Exit => {
                if count_tiles(&self.grid, Tile::Key) == 0 {
                    self.next_level(now, rng);
                }
            }
            Tile::Trap => {
                if self.player.statuses.is_active(StatusKind::TrapImmunity, now) {
                    self.score += TRAP_IMMUNE_BONUS;
                    self.show(format!("Immune! +{}", TRAP_IMMUNE_BONUS), now);
                } else {
                    self.shift_time(-TRAP_PENALTY_SECS);
                    self.score -= TRAP_PENALTY_SCORE;
                    self.player.statuses.start(StatusKind::Slowdown, now, SLOWDOWN_DURATION);
                    self.effects.push(ActiveEffect::new("Slowdown", now, SLOWDOWN_DURATION));
                    self.show("Trap! Slowed down".to_string(), now);
                }
                self.grid[pos.y][pos.x] = Tile::Grass;
            }
            Tile::Trigger => {
                self.grid[pos.y][pos.x] = Tile::Grass;
                self.apply_trigger(TriggerEffect::random(rng), now, rng);
            }
            Tile::Powerup => {
                self.grid[pos.y][pos.x] = Tile::Grass;
                self.score += POWERUP_SCORE;
                self.player.statuses.start(StatusKind::SpeedBoost, now, SPEED_BOOST_DURATION);
                self.effects.push(ActiveEffect::new("Speed", now, SPEED_BOOST_DURATION));
                self.show("Speed up!".to_string(), now);
            }
            _ => {}
        }
    }

    pub fn apply_trigger(&mut self, effect: TriggerEffect, now: u64, rng: &mut impl Rng) {
        debug!("trigger effect {:?}", effect);
        let (name, duration) = match effect {
            TriggerEffect::ExtendTime => {
                self.shift_time(TRIGGER_EXTRA_SECS);
                (format!("Time +{}s", TRIGGER_EXTRA_SECS), 0)
            }
            TriggerEffect::ScoreBonus => {
                self.score += TRIGGER_SCORE;
                (format!("Score +{}", TRIGGER_SCORE), 0)
            }
            TriggerEffect::Haste => {
                self.player.move_delay = self.player.move_delay.saturating_sub(HASTE_STEP).max(HASTE_FLOOR);
                ("Haste".to_string(), 0)
            }
            TriggerEffect::TeleportToKey => match find_tiles(&self.grid, Tile::Key).choose(rng) {
                Some(&key) => {
                    self.player.pos = self.landing_near(key);
                    ("Teleported".to_string(), 0)
                }
                None => {
                    self.score += TRIGGER_NO_KEY_SCORE;
                    (format!("Bonus +{}", TRIGGER_NO_KEY_SCORE), 0)
                }
            },
            TriggerEffect::TrapImmunity => {
                self.player.statuses.start(StatusKind::TrapImmunity, now, IMMUNITY_DURATION);
                ("Trap immunity".to_string(), IMMUNITY_DURATION)
            }
            TriggerEffect::KeyBonus => {
                let bonus = self.keys as i64 * TRIGGER_KEY_BONUS;
                self.score += bonus;
                (format!("Key bonus +{}", bonus), 0)
            }
            TriggerEffect::Invisibility => {
                self.player.statuses.start(StatusKind::Invisibility, now, INVISIBILITY_DURATION);
                ("Invisible".to_string(), INVISIBILITY_DURATION)
            }
        };
        self.show(name.clone(), now);
        self.effects.push(ActiveEffect::new(name, now, duration));
    }

    // Up-left of the key when walkable, else any walkable neighbour, else the
    // key cell itself.
    fn landing_near(&self, key: Pos) -> Pos {
        let diagonal = Pos::new(key.x.saturating_sub(1), key.y.saturating_sub(1));
        if is_passable(&self.grid, diagonal) {
            return diagonal;
        }
        Dir::ALL
            .iter()
            .filter_map(|dir| neighbor(&self.grid, key, *dir))
            .find(|pos| is_passable(&self.grid, *pos))
            .unwrap_or(key)
    }

    pub fn next_level(&mut self, now: u64, rng: &mut impl Rng) {
        self.level += 1;
        self.score += self.time_remaining.max(0) * LEVEL_TIME_BONUS;
        self.grid = self.levels.level(self.level, rng);
        self.time_limit =
            (BASE_TIME_LIMIT - (self.level as i64 - 1) * TIME_LIMIT_STEP).max(MIN_TIME_LIMIT);
        self.reset_level(now);
        info!("level {} reached, score {}", self.level, self.score);
    }

    /// Per-tick housekeeping: timer, expired effects and trail, and the
    /// continuous step for a held direction.
    pub fn update(&mut self, now: u64, rng: &mut impl Rng) {
        if self.flash.as_ref().is_some_and(|f| now >= f.until) {
            self.flash = None;
        }
        if self.phase != Phase::Playing {
            return;
        }

        let elapsed = (now.saturating_sub(self.level_started) / 1000) as i64;
        self.time_remaining = (self.time_limit + self.time_adjust - elapsed).max(0);
        if self.time_remaining == 0 {
            self.phase = Phase::GameOver;
            info!("time is up on level {} with score {}", self.level, self.score);
            return;
        }

        prune_effects(&mut self.effects, now);
        self.trail.prune(now);

        if let Some(dir) = self.held {
            self.handle_move(dir, now, rng);
        }
    }

    /// Latches a direction that `update` keeps stepping until cleared.
    pub fn set_held(&mut self, dir: Option<Dir>) {
        self.held = dir;
    }

    /// Feeds a typed character to the portal easter egg.
    pub fn type_char(&mut self, ch: char, now: u64) -> bool {
        if !self.portal.feed(ch, now) {
            return false;
        }
        info!("key portal opened");
        self.effects.push(ActiveEffect::new("Portal", now, PORTAL_DURATION));
        self.show("Key portal open! Use arrows to jump".to_string(), now);
        true
    }

    pub fn portal_open(&self, now: u64) -> bool {
        self.portal.is_open(now)
    }

    /// Swaps the current level for a freshly generated one without touching
    /// the timer.
    pub fn regenerate_level(&mut self, rng: &mut impl Rng) {
        if self.phase != Phase::Playing {
            return;
        }
        self.grid = self.levels.regenerate(self.level, rng);
        self.reset_player();
        debug!("level {} regenerated", self.level);
    }

    pub fn keys_total(&self) -> usize {
        self.keys as usize + count_tiles(&self.grid, Tile::Key)
    }

    pub fn is_invisible(&self, now: u64) -> bool {
        self.player.statuses.is_active(StatusKind::Invisibility, now)
    }

    pub fn statuses(&self, now: u64) -> Vec<(StatusKind, u64)> {
        self.player.statuses.active(now)
    }

    pub fn leaderboard_entry(&self, name: &str, date: &str) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            score: self.score,
            level: self.level,
            grid_size: Some(self.size()),
            date: date.to_string(),
        }
    }

    pub fn toggle_editor(&mut self) {
        if self.phase == Phase::Editor {
            self.phase = Phase::Menu;
        } else {
            self.phase = Phase::Editor;
            self.grid = empty_map(self.size());
        }
    }

    /// Overwrites one cell while editing. Out-of-bounds positions are ignored.
    pub fn paint(&mut self, pos: Pos, tile: Tile) -> bool {
        if self.phase != Phase::Editor || !grid::in_bounds(&self.grid, pos) {
            return false;
        }
        self.grid[pos.y][pos.x] = tile;
        true
    }

    pub fn clear_level(&mut self) {
        self.grid = empty_map(self.size());
    }

    pub fn validate_level(&self) -> Result<(), LevelError> {
        grid::validate_level(&self.grid)
    }

    /// Starts playing the map currently in the editor. Nothing changes when
    /// the map fails validation.
    pub fn test_level(&mut self, now: u64) -> Result<(), LevelError> {
        self.validate_level()?;
        self.phase = Phase::Playing;
        self.level = 1;
        self.score = 0;
        self.reset_level(now);
        info!("testing custom level with {}s limit", self.time_limit);
        Ok(())
    }

    pub fn to_level_file(&self, name: &str, created: &str) -> LevelFile {
        let name = name.trim();
        LevelFile {
            name: if name.is_empty() { "level".to_string() } else { name.to_string() },
            map: self.grid.clone(),
            time_limit: self.time_limit,
            created: created.to_string(),
            level: None,
        }
    }

    /// Snapshot of the level being played, named after the level and the
    /// date part of `created`.
    pub fn quick_save(&self, created: &str) -> LevelFile {
        let date = created.get(..10).unwrap_or(created);
        let mut file = self.to_level_file(&format!("level-{}-{}", self.level, date), created);
        file.level = Some(self.level);
        file
    }

    /// Replaces the map with one from a level file. On error nothing changes.
    pub fn load_level_file(&mut self, json: &str) -> Result<LevelFile, LevelError> {
        let file = LevelFile::parse(json).inspect_err(|err| warn!("level file rejected: {}", err))?;
        let size = self.size();
        if file.map.len() != size || file.map.iter().any(|row| row.len() != size) {
            warn!("level file has wrong dimensions");
            return Err(LevelError::WrongSize {
                expected: size,
                rows: file.map.len(),
            });
        }
        self.grid = file.map.clone();
        self.time_limit = file.time_limit;
        info!("loaded level '{}'", file.name);
        Ok(file)
    }

    fn reset_level(&mut self, now: u64) {
        self.reset_player();
        self.level_started = now;
        self.time_adjust = 0;
        self.time_remaining = self.time_limit;
    }

    fn reset_player(&mut self) {
        self.keys = 0;
        self.held = None;
        self.player = Player::at_start();
        self.effects.clear();
        self.trail.clear();
    }

    fn shift_time(&mut self, secs: i64) {
        self.time_adjust += secs;
        self.time_remaining = (self.time_remaining + secs).max(0);
    }

    fn show(&mut self, text: String, now: u64) {
        self.flash = Some(Flash {
            text,
            until: now + FLASH_DURATION,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Profile;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn playing_on(grid: Grid) -> (Game, StdRng) {
        let mut rng = StdRng::seed_from_u64(99);
        let mut game = Game::new(&mut rng, Profile::Desktop.tuning());
        game.start(0, &mut rng);
        game.grid = grid;
        (game, rng)
    }

    fn open_field() -> Grid {
        let mut grid = empty_map(10);
        for i in 0..10 {
            grid[0][i] = Tile::Wall;
            grid[9][i] = Tile::Wall;
            grid[i][0] = Tile::Wall;
            grid[i][9] = Tile::Wall;
        }
        grid[8][8] = Tile::Exit;
        grid
    }

    #[test]
    fn walls_block_without_side_effects() {
        let mut grid = open_field();
        grid[1][2] = Tile::Tree;
        let (mut game, mut rng) = playing_on(grid);
        assert!(!game.handle_move(Dir::Right, 1000, &mut rng));
        assert!(!game.handle_move(Dir::Up, 2000, &mut rng));
        assert_eq!(game.player.pos, START);
        assert!(game.trail.is_empty());
        assert_eq!(game.player.last_dir, None);
    }

    #[test]
    fn same_direction_waits_for_move_delay() {
        let (mut game, mut rng) = playing_on(open_field());
        game.player.pos = Pos::new(5, 5);
        game.player.move_delay = 200;
        game.player.last_move = 1000;
        game.player.last_dir = Some(Dir::Right);
        assert!(!game.handle_move(Dir::Right, 1050, &mut rng));
        assert_eq!(game.player.pos, Pos::new(5, 5));
        assert!(game.handle_move(Dir::Right, 1200, &mut rng));
        assert_eq!(game.player.pos, Pos::new(6, 5));
    }

    #[test]
    fn turning_uses_the_shorter_threshold() {
        let (mut game, mut rng) = playing_on(open_field());
        game.player.pos = Pos::new(5, 5);
        game.player.move_delay = 200;
        game.player.last_move = 1000;
        game.player.last_dir = Some(Dir::Right);
        // 200 * 0.3 = 60ms
        assert!(!game.handle_move(Dir::Down, 1050, &mut rng));
        assert!(game.handle_move(Dir::Down, 1060, &mut rng));

        game.player.move_delay = 100;
        game.player.last_move = 5000;
        // max(30, 50) = 50ms
        assert!(game.handle_move(Dir::Left, 5050, &mut rng));
        assert_eq!(game.player.pos, Pos::new(4, 6));
    }

    #[test]
    fn delay_follows_tile_and_statuses() {
        let mut grid = open_field();
        grid[1][2] = Tile::Sand;
        grid[1][3] = Tile::Sand;
        grid[1][4] = Tile::Sand;
        let (mut game, mut rng) = playing_on(grid);
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.player.move_delay, 400);

        game.player.statuses.start(StatusKind::SpeedBoost, 1000, 10_000);
        assert!(game.handle_move(Dir::Right, 1400, &mut rng));
        assert_eq!(game.player.move_delay, 200);

        game.player.statuses.start(StatusKind::Slowdown, 1400, 5000);
        assert!(game.handle_move(Dir::Right, 1600, &mut rng));
        assert_eq!(game.player.move_delay, 400);
    }

    #[test]
    fn speed_boost_never_goes_below_min_step() {
        let (mut game, mut rng) = playing_on(open_field());
        game.player.statuses.start(StatusKind::SpeedBoost, 0, 10_000);
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.player.move_delay, game.tuning().min_step);
    }

    #[test]
    fn key_then_exit_advances() {
        let mut grid = open_field();
        grid[1][2] = Tile::Key;
        let (mut game, mut rng) = playing_on(grid);
        game.player.pos = Pos::new(8, 7);
        assert!(game.handle_move(Dir::Down, 1000, &mut rng));
        assert_eq!(game.level, 1, "exit must stay shut while a key remains");

        game.player.pos = Pos::new(1, 1);
        game.player.last_dir = None;
        assert!(game.handle_move(Dir::Right, 3000, &mut rng));
        assert_eq!(game.keys, 1);
        assert_eq!(game.score, KEY_SCORE);
        assert_eq!(game.grid[1][2], Tile::Grass);

        game.player.pos = Pos::new(8, 7);
        game.player.last_dir = None;
        assert!(game.handle_move(Dir::Down, 4000, &mut rng));
        assert_eq!(game.level, 2);
        assert_eq!(game.keys, 0);
        assert_eq!(game.player.pos, START);
        assert_eq!(game.player.move_delay, DEFAULT_MOVE_DELAY);
        assert_eq!(game.time_limit, 112);
        assert_eq!(game.score, KEY_SCORE + BASE_TIME_LIMIT * LEVEL_TIME_BONUS);
        assert!(game.trail.is_empty());
    }

    #[test]
    fn trap_without_immunity_costs_time_and_score() {
        let mut grid = open_field();
        grid[1][2] = Tile::Trap;
        let (mut game, mut rng) = playing_on(grid);
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.score, -TRAP_PENALTY_SCORE);
        assert_eq!(game.time_remaining, BASE_TIME_LIMIT - TRAP_PENALTY_SECS);
        assert_eq!(game.player.statuses.slowdown_until, 1000 + SLOWDOWN_DURATION);
        assert_eq!(game.grid[1][2], Tile::Grass);
        // the penalty survives later ticks
        game.update(1100, &mut rng);
        assert_eq!(game.time_remaining, BASE_TIME_LIMIT - TRAP_PENALTY_SECS - 1);
    }

    #[test]
    fn trap_penalty_never_shows_negative_time() {
        let mut grid = open_field();
        grid[1][2] = Tile::Trap;
        let (mut game, mut rng) = playing_on(grid);
        game.time_remaining = 4;
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.time_remaining, 0);
    }

    #[test]
    fn trap_with_immunity_pays_out() {
        let mut grid = open_field();
        grid[1][2] = Tile::Trap;
        let (mut game, mut rng) = playing_on(grid);
        game.player.statuses.start(StatusKind::TrapImmunity, 0, 10_000);
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.score, TRAP_IMMUNE_BONUS);
        assert_eq!(game.time_remaining, BASE_TIME_LIMIT);
        assert_eq!(game.player.statuses.slowdown_until, 0);
        assert_eq!(game.grid[1][2], Tile::Grass);
    }

    #[test]
    fn powerup_starts_speed_boost() {
        let mut grid = open_field();
        grid[1][2] = Tile::Powerup;
        let (mut game, mut rng) = playing_on(grid);
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.score, POWERUP_SCORE);
        assert!(game.player.statuses.is_active(StatusKind::SpeedBoost, 10_999));
        assert_eq!(game.grid[1][2], Tile::Grass);
    }

    #[test]
    fn trigger_tile_is_one_shot() {
        let mut grid = open_field();
        grid[1][2] = Tile::Trigger;
        let (mut game, mut rng) = playing_on(grid);
        assert!(game.handle_move(Dir::Right, 1000, &mut rng));
        assert_eq!(game.grid[1][2], Tile::Grass);
        assert_eq!(game.effects.len(), 1);
    }

    #[test]
    fn trigger_effects() {
        let mut grid = open_field();
        grid[4][4] = Tile::Key;
        let (mut game, mut rng) = playing_on(grid);

        game.apply_trigger(TriggerEffect::ExtendTime, 0, &mut rng);
        assert_eq!(game.time_remaining, BASE_TIME_LIMIT + TRIGGER_EXTRA_SECS);

        game.apply_trigger(TriggerEffect::ScoreBonus, 0, &mut rng);
        assert_eq!(game.score, TRIGGER_SCORE);

        game.player.move_delay = 60;
        game.apply_trigger(TriggerEffect::Haste, 0, &mut rng);
        assert_eq!(game.player.move_delay, HASTE_FLOOR);

        game.apply_trigger(TriggerEffect::TeleportToKey, 0, &mut rng);
        assert_eq!(game.player.pos, Pos::new(3, 3));

        game.keys = 2;
        game.apply_trigger(TriggerEffect::KeyBonus, 0, &mut rng);
        assert_eq!(game.score, TRIGGER_SCORE + 2 * TRIGGER_KEY_BONUS);

        game.apply_trigger(TriggerEffect::TrapImmunity, 0, &mut rng);
        assert!(game.player.statuses.is_active(StatusKind::TrapImmunity, 9_999));

        game.apply_trigger(TriggerEffect::Invisibility, 0, &mut rng);
        assert!(game.is_invisible(7_999));
        assert!(!game.is_invisible(8_000));
        assert_eq!(game.effects.len(), 7);
    }

    #[test]
    fn teleport_avoids_blocked_landing() {
        let mut grid = open_field();
        grid[4][4] = Tile::Key;
        grid[3][3] = Tile::Water;
        grid[3][4] = Tile::Wall;
        let (mut game, mut rng) = playing_on(grid);
        game.apply_trigger(TriggerEffect::TeleportToKey, 0, &mut rng);
        assert_eq!(game.player.pos, Pos::new(4, 5));
    }

    #[test]
    fn teleport_without_keys_scores() {
        let (mut game, mut rng) = playing_on(open_field());
        game.apply_trigger(TriggerEffect::TeleportToKey, 0, &mut rng);
        assert_eq!(game.player.pos, START);
        assert_eq!(game.score, TRIGGER_NO_KEY_SCORE);
    }

    #[test]
    fn timer_runs_out() {
        let (mut game, mut rng) = playing_on(open_field());
        game.update(60_500, &mut rng);
        assert_eq!(game.time_remaining, 60);
        game.update(BASE_TIME_LIMIT as u64 * 1000, &mut rng);
        assert_eq!(game.phase, Phase::GameOver);
        assert!(!game.handle_move(Dir::Right, 200_000, &mut rng));
    }

    #[test]
    fn update_prunes_effects() {
        let (mut game, mut rng) = playing_on(open_field());
        game.effects.push(ActiveEffect { name: "old".into(), expiry: 4999 });
        game.effects.push(ActiveEffect { name: "info".into(), expiry: 0 });
        game.update(5000, &mut rng);
        assert_eq!(game.effects.len(), 1);
        assert_eq!(game.effects[0].name, "info");
    }

    #[test]
    fn held_direction_steps_every_tick() {
        let (mut game, mut rng) = playing_on(open_field());
        game.set_held(Some(Dir::Down));
        game.update(1000, &mut rng);
        game.update(1010, &mut rng);
        assert_eq!(game.player.pos, Pos::new(1, 2));
        game.update(1025, &mut rng);
        assert_eq!(game.player.pos, Pos::new(1, 3));
        game.set_held(None);
        game.update(2000, &mut rng);
        assert_eq!(game.player.pos, Pos::new(1, 3));
    }

    #[test]
    fn portal_jumps_through_keys_then_exit() {
        let mut grid = open_field();
        grid[2][5] = Tile::Key;
        grid[6][3] = Tile::Key;
        let (mut game, mut rng) = playing_on(grid);
        for ch in "keyportal".chars() {
            game.type_char(ch, 1000);
        }
        assert!(game.portal_open(1500));
        assert!(game.handle_move(Dir::Up, 1100, &mut rng));
        assert_eq!(game.player.pos, Pos::new(5, 2));
        assert_eq!(game.keys, 1);
        assert_eq!(game.player.move_delay, game.tuning().min_step);
        // the cycle index keeps counting while the target list shrinks
        assert!(game.handle_move(Dir::Up, 1110, &mut rng));
        assert_eq!(game.player.pos, Pos::new(8, 8));
        assert_eq!(game.level, 1);
        assert!(game.handle_move(Dir::Left, 1120, &mut rng));
        assert_eq!(game.player.pos, Pos::new(3, 6));
        assert_eq!(game.keys, 2);
        assert!(game.handle_move(Dir::Left, 1130, &mut rng));
        assert_eq!(game.level, 2);

        // window closed, and typing it again does nothing
        for ch in "keyportal".chars() {
            assert!(!game.type_char(ch, 4000));
        }
        assert!(!game.portal_open(4001));
    }

    #[test]
    fn regenerate_keeps_timer() {
        let (mut game, mut rng) = playing_on(open_field());
        game.update(10_000, &mut rng);
        game.keys = 3;
        game.regenerate_level(&mut rng);
        assert_eq!(game.keys, 0);
        assert_eq!(game.grid.len(), 32);
        game.update(10_000, &mut rng);
        assert_eq!(game.time_remaining, BASE_TIME_LIMIT - 10);
    }

    #[test]
    fn editor_flow() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Game::new(&mut rng, Profile::Compact.tuning());
        assert!(!game.paint(Pos::new(3, 3), Tile::Key));
        game.toggle_editor();
        assert_eq!(game.phase, Phase::Editor);
        assert_eq!(count_tiles(&game.grid, Tile::Grass), 16 * 16);
        assert!(!game.paint(Pos::new(16, 3), Tile::Key));
        assert!(game.paint(Pos::new(3, 3), Tile::Key));
        assert_eq!(game.test_level(0), Err(LevelError::MissingExit));
        assert_eq!(game.phase, Phase::Editor);
        game.paint(Pos::new(14, 14), Tile::Exit);
        assert_eq!(game.test_level(0), Ok(()));
        assert_eq!(game.phase, Phase::Playing);
        assert_eq!(game.grid[3][3], Tile::Key);
    }

    #[test]
    fn load_rejects_bad_files_without_changes() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = Game::new(&mut rng, Profile::Compact.tuning());
        let before = game.grid.clone();
        assert!(matches!(game.load_level_file("{oops"), Err(LevelError::Corrupt(_))));
        assert_eq!(
            game.load_level_file("[[1,1],[1,1]]"),
            Err(LevelError::WrongSize { expected: 16, rows: 2 })
        );
        assert_eq!(game.grid, before);
        assert_eq!(game.time_limit, BASE_TIME_LIMIT);
    }

    #[test]
    fn save_and_load_level_file() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut game = Game::new(&mut rng, Profile::Compact.tuning());
        game.toggle_editor();
        game.paint(Pos::new(5, 5), Tile::Key);
        game.paint(Pos::new(9, 9), Tile::Exit);
        game.time_limit = 77;
        let json = game.to_level_file("  ", "2024-06-01T12:00:00Z").to_json().unwrap();
        game.clear_level();
        game.time_limit = BASE_TIME_LIMIT;

        let loaded = game.load_level_file(&json).unwrap();
        assert_eq!(loaded.name, "level");
        assert_eq!(game.time_limit, 77);
        assert_eq!(game.grid[5][5], Tile::Key);
        assert!(game.validate_level().is_ok());
    }

    #[test]
    fn quick_save_names_level() {
        let (mut game, _) = playing_on(open_field());
        game.level = 4;
        let file = game.quick_save("2024-06-01T12:00:00Z");
        assert_eq!(file.name, "level-4-2024-06-01");
        assert_eq!(file.level, Some(4));
        assert_eq!(file.map, game.grid);
    }
}
