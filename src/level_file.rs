//! JSON level files as written by the editor and quick save.

use serde::{Deserialize, Serialize};

use crate::constants::BASE_TIME_LIMIT;
use crate::error::LevelError;
use crate::grid::Grid;

fn default_time_limit() -> i64 {
    BASE_TIME_LIMIT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelFile {
    #[serde(default)]
    pub name: String,
    pub map: Grid,
    #[serde(default = "default_time_limit")]
    pub time_limit: i64,
    #[serde(default)]
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored {
    Bare(Grid),
    Wrapped(LevelFile),
}

impl LevelFile {
    /// Parses either a full level file or a bare `[[tile]]` map.
    pub fn parse(json: &str) -> Result<Self, LevelError> {
        let stored: Stored = serde_json::from_str(json)?;
        let mut file = match stored {
            Stored::Bare(map) => LevelFile {
                name: String::new(),
                map,
                time_limit: BASE_TIME_LIMIT,
                created: String::new(),
                level: None,
            },
            Stored::Wrapped(file) => file,
        };
        if file.time_limit <= 0 {
            file.time_limit = BASE_TIME_LIMIT;
        }
        Ok(file)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn file_name(&self) -> String {
        let stem: String = self
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        if stem.is_empty() {
            "level.json".to_string()
        } else {
            format!("{}.json", stem)
        }
    }
}
