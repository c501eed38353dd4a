use serde::{Deserialize, Serialize};

/// A grid cell. The integer codes are the on-disk representation used by
/// level files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tile {
    Wall,
    Grass,
    Snow,
    Water,
    Stone,
    Sand,
    Tree,
    Key,
    Exit,
    Trap,
    Trigger,
    Powerup,
}

impl Tile {
    pub const ALL: [Tile; 12] = [
        Tile::Wall,
        Tile::Grass,
        Tile::Snow,
        Tile::Water,
        Tile::Stone,
        Tile::Sand,
        Tile::Tree,
        Tile::Key,
        Tile::Exit,
        Tile::Trap,
        Tile::Trigger,
        Tile::Powerup,
    ];

    pub fn code(self) -> u8 {
        match self {
            Tile::Wall => 0,
            Tile::Grass => 1,
            Tile::Snow => 2,
            Tile::Water => 3,
            Tile::Stone => 4,
            Tile::Sand => 5,
            Tile::Tree => 6,
            Tile::Key => 7,
            Tile::Exit => 8,
            Tile::Trap => 9,
            Tile::Trigger => 10,
            Tile::Powerup => 11,
        }
    }

    pub fn is_impassable(self) -> bool {
        matches!(self, Tile::Wall | Tile::Water | Tile::Tree)
    }

    /// Desktop move delay after stepping onto this tile. `None` means the
    /// caller's minimum step applies.
    pub fn base_delay(self) -> Option<u64> {
        match self {
            Tile::Grass | Tile::Trigger | Tile::Powerup => Some(25),
            Tile::Snow => Some(700),
            Tile::Stone | Tile::Trap => Some(1500),
            Tile::Sand => Some(400),
            Tile::Key => Some(200),
            Tile::Exit => Some(500),
            Tile::Wall | Tile::Water | Tile::Tree => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tile::Wall => "wall",
            Tile::Grass => "grass",
            Tile::Snow => "snow",
            Tile::Water => "water",
            Tile::Stone => "stone",
            Tile::Sand => "sand",
            Tile::Tree => "tree",
            Tile::Key => "key",
            Tile::Exit => "exit",
            Tile::Trap => "trap",
            Tile::Trigger => "trigger",
            Tile::Powerup => "powerup",
        }
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> u8 {
        tile.code()
    }
}

impl TryFrom<u8> for Tile {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Tile::ALL
            .get(code as usize)
            .copied()
            .ok_or_else(|| format!("unknown tile code {}", code))
    }
}
