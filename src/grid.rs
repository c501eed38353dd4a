use serde::{Deserialize, Serialize};

use crate::constants::START;
use crate::error::LevelError;
use crate::tile::Tile;

pub type Grid = Vec<Vec<Tile>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

pub fn empty_map(size: usize) -> Grid {
    vec![vec![Tile::Grass; size]; size]
}

/// Neighbour of `pos` in `dir`, or `None` when it would leave the grid.
pub fn neighbor(grid: &[Vec<Tile>], pos: Pos, dir: Dir) -> Option<Pos> {
    let (dx, dy) = dir.delta();
    let nx = pos.x as isize + dx;
    let ny = pos.y as isize + dy;
    if nx < 0 || ny < 0 {
        return None;
    }
    let next = Pos::new(nx as usize, ny as usize);
    if in_bounds(grid, next) {
        Some(next)
    } else {
        None
    }
}

pub fn in_bounds(grid: &[Vec<Tile>], pos: Pos) -> bool {
    pos.y < grid.len() && pos.x < grid[pos.y].len()
}

pub fn tile_at(grid: &[Vec<Tile>], pos: Pos) -> Option<Tile> {
    grid.get(pos.y).and_then(|row| row.get(pos.x)).copied()
}

pub fn is_passable(grid: &[Vec<Tile>], pos: Pos) -> bool {
    matches!(tile_at(grid, pos), Some(tile) if !tile.is_impassable())
}

/// Where a step from `pos` lands, if the neighbour exists and is walkable.
pub fn move_target(grid: &[Vec<Tile>], pos: Pos, dir: Dir) -> Option<Pos> {
    neighbor(grid, pos, dir).filter(|next| is_passable(grid, *next))
}

pub fn count_tiles(grid: &[Vec<Tile>], kind: Tile) -> usize {
    grid.iter()
        .flat_map(|row| row.iter())
        .filter(|&&cell| cell == kind)
        .count()
}

/// Positions holding `kind`, in row-major order.
pub fn find_tiles(grid: &[Vec<Tile>], kind: Tile) -> Vec<Pos> {
    let mut cells = Vec::new();
    for (y, row) in grid.iter().enumerate() {
        for (x, &cell) in row.iter().enumerate() {
            if cell == kind {
                cells.push(Pos { x, y });
            }
        }
    }
    cells
}

pub fn find_first(grid: &[Vec<Tile>], kind: Tile) -> Option<Pos> {
    find_tiles(grid, kind).into_iter().next()
}

/// Checks that a hand-made map can be played: it needs a key, an exit and a
/// walkable start cell.
pub fn validate_level(grid: &[Vec<Tile>]) -> Result<(), LevelError> {
    if count_tiles(grid, Tile::Key) == 0 {
        return Err(LevelError::MissingKey);
    }
    if count_tiles(grid, Tile::Exit) == 0 {
        return Err(LevelError::MissingExit);
    }
    if !is_passable(grid, START) {
        return Err(LevelError::BlockedStart);
    }
    Ok(())
}
