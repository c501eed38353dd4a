//! Procedural level generation.
//!
//! A level is a walled square of grass with random wall cells scattered over
//! it, then keys, traps, triggers, powerups and cosmetic floor patches dropped
//! onto remaining grass by rejection sampling. Reachability is not checked:
//! the outer corridor (row/column 1 and N-2) is never carved, so start and
//! exit always connect, but inner keys can end up walled in.

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::constants::{MAX_PLACEMENT_ATTEMPTS, PREGENERATED_LEVELS, START};
use crate::grid::{Grid, Pos};
use crate::tile::Tile;

/// How many of each feature a level gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelCounts {
    pub walls: usize,
    pub keys: usize,
    pub traps: usize,
    pub triggers: usize,
    pub powerups: usize,
    pub mixed: usize,
}

impl LevelCounts {
    pub fn for_level(level: u32) -> Self {
        let level = level as usize;
        LevelCounts {
            walls: (30 + level * 8).min(80),
            keys: (level / 3).max(1),
            traps: (level + 1).min(8),
            triggers: (level / 2).min(5),
            powerups: if level >= 3 { (level / 3 + 1).min(4) } else { 0 },
            mixed: if level > 5 { (level * 3).min(30) } else { 0 },
        }
    }
}

pub fn exit_pos(size: usize) -> Pos {
    Pos::new(size.saturating_sub(2), size.saturating_sub(2))
}

pub fn generate_level(rng: &mut impl Rng, level: u32, size: usize) -> Grid {
    let counts = LevelCounts::for_level(level);
    let wall = *[Tile::Wall, Tile::Tree]
        .choose(rng)
        .unwrap_or(&Tile::Wall);

    let mut grid = vec![vec![Tile::Grass; size]; size];
    for y in 0..size {
        for x in 0..size {
            if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                grid[y][x] = wall;
            }
        }
    }

    let exit = exit_pos(size);
    if size < 5 {
        warn!("grid of size {} has no room for features", size);
        if size >= 3 {
            grid[exit.y][exit.x] = Tile::Exit;
        }
        return grid;
    }

    for _ in 0..counts.walls {
        let pos = random_interior(rng, size);
        if pos != START {
            grid[pos.y][pos.x] = wall;
        }
    }

    place_tiles(&mut grid, rng, counts.keys, &[START], |_| Tile::Key);
    grid[exit.y][exit.x] = Tile::Exit;

    let reserved = [START, exit];
    place_tiles(&mut grid, rng, counts.traps, &reserved, |_| Tile::Trap);
    place_tiles(&mut grid, rng, counts.triggers, &reserved, |_| Tile::Trigger);
    place_tiles(&mut grid, rng, counts.powerups, &reserved, |_| Tile::Powerup);
    place_tiles(&mut grid, rng, counts.mixed, &reserved, |rng| {
        if rng.gen_bool(0.5) {
            Tile::Snow
        } else {
            Tile::Sand
        }
    });

    debug!("generated level {} ({}x{}): {:?}", level, size, size, counts);
    grid
}

fn random_interior(rng: &mut impl Rng, size: usize) -> Pos {
    Pos::new(rng.gen_range(2..size - 2), rng.gen_range(2..size - 2))
}

fn place_tiles<R: Rng>(
    grid: &mut Grid,
    rng: &mut R,
    count: usize,
    reserved: &[Pos],
    mut pick: impl FnMut(&mut R) -> Tile,
) -> usize {
    let mut placed = 0;
    for _ in 0..count {
        match free_cell(grid, rng, reserved) {
            Some(pos) => {
                grid[pos.y][pos.x] = pick(rng);
                placed += 1;
            }
            None => {
                warn!("no grass left for placement ({} of {} placed)", placed, count);
                break;
            }
        }
    }
    placed
}

/// Draws random interior cells until one is grass and not reserved. After
/// `MAX_PLACEMENT_ATTEMPTS` misses it picks among the remaining candidates
/// directly, so a crowded grid cannot spin forever.
fn free_cell(grid: &[Vec<Tile>], rng: &mut impl Rng, reserved: &[Pos]) -> Option<Pos> {
    let size = grid.len();
    let is_free = |pos: Pos| grid[pos.y][pos.x] == Tile::Grass && !reserved.contains(&pos);

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let pos = random_interior(rng, size);
        if is_free(pos) {
            return Some(pos);
        }
    }

    let mut candidates = Vec::new();
    for y in 2..size - 2 {
        for x in 2..size - 2 {
            let pos = Pos::new(x, y);
            if is_free(pos) {
                candidates.push(pos);
            }
        }
    }
    candidates.choose(rng).copied()
}

/// The first levels are generated once per session so a restart replays the
/// same maps; later ones are generated when reached.
#[derive(Debug, Clone)]
pub struct LevelSet {
    size: usize,
    levels: Vec<Grid>,
}

impl LevelSet {
    pub fn new(rng: &mut impl Rng, size: usize) -> Self {
        let levels = (1..=PREGENERATED_LEVELS)
            .map(|level| generate_level(rng, level, size))
            .collect();
        LevelSet { size, levels }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn level(&self, level: u32, rng: &mut impl Rng) -> Grid {
        match self.cached_index(level) {
            Some(idx) => self.levels[idx].clone(),
            None => generate_level(rng, level, self.size),
        }
    }

    pub fn regenerate(&mut self, level: u32, rng: &mut impl Rng) -> Grid {
        let grid = generate_level(rng, level, self.size);
        if let Some(idx) = self.cached_index(level) {
            self.levels[idx] = grid.clone();
        }
        grid
    }

    fn cached_index(&self, level: u32) -> Option<usize> {
        if level >= 1 && (level as usize) <= self.levels.len() {
            Some(level as usize - 1)
        } else {
            None
        }
    }
}
