//! Key portal easter egg: typing the secret word opens a short window in
//! which every directional input jumps to the next key, then the exit.

use crate::constants::{PORTAL_BUFFER_LEN, PORTAL_DURATION, PORTAL_SECRET};
use crate::grid::{find_first, find_tiles, Pos};
use crate::tile::Tile;

#[derive(Debug, Clone, Default)]
pub struct Portal {
    buffer: String,
    until: u64,
    used: bool,
    cycle: usize,
}

impl Portal {
    /// Feeds a typed character. Returns `true` when this character completed
    /// the secret and the portal opened.
    pub fn feed(&mut self, ch: char, now: u64) -> bool {
        self.buffer.extend(ch.to_lowercase());
        let excess = self.buffer.chars().count().saturating_sub(PORTAL_BUFFER_LEN);
        if excess > 0 {
            self.buffer = self.buffer.chars().skip(excess).collect();
        }
        if self.used || !self.buffer.ends_with(PORTAL_SECRET) {
            return false;
        }
        self.used = true;
        self.until = now + PORTAL_DURATION;
        self.cycle = 0;
        true
    }

    pub fn is_open(&self, now: u64) -> bool {
        now < self.until
    }

    pub fn is_used(&self) -> bool {
        self.used
    }

    /// Next destination in the cycle over remaining keys then the exit.
    pub fn next_target(&mut self, grid: &[Vec<Tile>]) -> Option<Pos> {
        let mut targets = find_tiles(grid, Tile::Key);
        if let Some(exit) = find_first(grid, Tile::Exit) {
            targets.push(exit);
        }
        if targets.is_empty() {
            return None;
        }
        let dest = targets[self.cycle % targets.len()];
        self.cycle += 1;
        Some(dest)
    }
}
