//! High score table. The game only produces entries; the binary decides where
//! the table lives on disk.

use std::fs;
use std::io;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::constants::{GAME_VERSION, LEADERBOARD_IMPORT_SIZE, LEADERBOARD_SIZE};
use crate::error::LeaderboardError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
    pub level: u32,
    #[serde(rename = "gridSize", default, skip_serializing_if = "Option::is_none")]
    pub grid_size: Option<usize>,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    leaderboard: Vec<LeaderboardEntry>,
    exported: String,
    game_version: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Imported {
    Bare(Vec<LeaderboardEntry>),
    Wrapped { leaderboard: Vec<LeaderboardEntry> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Reads the table from `path`; a missing file is an empty table.
    pub fn load(path: &Path) -> Result<Self, LeaderboardError> {
        match fs::read_to_string(path) {
            Ok(text) => {
                let entries: Vec<LeaderboardEntry> = serde_json::from_str(&text)?;
                Ok(Leaderboard { entries })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Leaderboard::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), LeaderboardError> {
        fs::write(path, serde_json::to_string(&self.entries)?)?;
        Ok(())
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn add(&mut self, entry: LeaderboardEntry) {
        info!("leaderboard entry {} with {} points", entry.name, entry.score);
        self.entries.push(entry);
        self.sort_and_truncate(LEADERBOARD_SIZE);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn export(&self, exported: &str) -> Result<String, LeaderboardError> {
        if self.entries.is_empty() {
            return Err(LeaderboardError::Empty);
        }
        let export = Export {
            leaderboard: self.entries.clone(),
            exported: exported.to_string(),
            game_version: GAME_VERSION.to_string(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Merges an exported table (or a bare entry list) into this one, dropping
    /// entries with the same name, score and date. Returns how many entries
    /// the input held.
    pub fn import(&mut self, json: &str) -> Result<usize, LeaderboardError> {
        let incoming = match serde_json::from_str::<Imported>(json)? {
            Imported::Bare(entries) => entries,
            Imported::Wrapped { leaderboard } => leaderboard,
        };
        let count = incoming.len();
        self.entries.extend(incoming);
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        let mut unique: Vec<LeaderboardEntry> = Vec::new();
        for entry in self.entries.drain(..) {
            let dup = unique
                .iter()
                .any(|e| e.name == entry.name && e.score == entry.score && e.date == entry.date);
            if !dup {
                unique.push(entry);
            }
        }
        unique.truncate(LEADERBOARD_IMPORT_SIZE);
        self.entries = unique;
        Ok(count)
    }

    fn sort_and_truncate(&mut self, len: usize) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            score,
            level: 1,
            grid_size: Some(32),
            date: "2024-05-01".to_string(),
        }
    }

    #[test]
    fn keeps_top_ten_descending() {
        let mut board = Leaderboard::default();
        for i in 0..12 {
            board.add(entry(&format!("p{}", i), i * 100));
        }
        let scores: Vec<i64> = board.entries().iter().map(|e| e.score).collect();
        assert_eq!(scores.len(), LEADERBOARD_SIZE);
        assert_eq!(scores[0], 1100);
        assert_eq!(*scores.last().unwrap(), 200);
    }

    #[test]
    fn export_requires_entries() {
        assert!(matches!(Leaderboard::default().export("now"), Err(LeaderboardError::Empty)));
        let mut board = Leaderboard::default();
        board.add(entry("ann", 10));
        let json = board.export("2024-05-02T00:00:00Z").unwrap();
        assert!(json.contains("\"gameVersion\": \"1.0\""));
        assert!(json.contains("\"gridSize\": 32"));
    }

    #[test]
    fn import_merges_and_dedupes() {
        let mut board = Leaderboard::default();
        board.add(entry("ann", 500));
        let mut other = Leaderboard::default();
        other.add(entry("ann", 500));
        other.add(entry("bob", 900));
        let json = other.export("now").unwrap();
        assert_eq!(board.import(&json).unwrap(), 2);
        let names: Vec<&str> = board.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "ann"]);

        let bare = r#"[{"name":"cy","score":700,"level":4,"date":"2024-05-03"}]"#;
        assert_eq!(board.import(bare).unwrap(), 1);
        assert_eq!(board.entries()[1].name, "cy");
        assert_eq!(board.entries()[1].grid_size, None);
        assert!(board.import(r#"{"scores":[]}"#).is_err());
    }

    #[test]
    fn missing_file_is_empty_table() {
        let path = std::env::temp_dir().join("keymaze-missing-leaderboard-test.json");
        let _ = fs::remove_file(&path);
        assert!(Leaderboard::load(&path).unwrap().entries().is_empty());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("keymaze-leaderboard-{}.json", std::process::id()));
        let mut board = Leaderboard::default();
        board.add(entry("dee", 1234));
        board.save(&path).unwrap();
        assert_eq!(Leaderboard::load(&path).unwrap(), board);
        let _ = fs::remove_file(&path);
    }
}
