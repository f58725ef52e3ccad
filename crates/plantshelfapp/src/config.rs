//! # Configuration
//!
//! Settings are declared with [`confique`] and resolved in priority order:
//! 1. **Environment variables**: `PLANTSHELF_DATA_FILE`, `PLANTSHELF_DEFAULT_VISIBILITY`, ...
//! 2. **Config file**: `plantshelf.toml` in the data directory, when present.
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `data_file` | `inventory.json` | Snapshot file name inside the data directory |
//! | `default_visibility` | `private` | Visibility of newly created plants |
//! | `watering_interval_days` | `7` | Gap between a watering and the next due date |
//! | `max_tag_length` | `64` | Longest accepted tag, in characters |

use crate::error::{InventoryError, Result};
use crate::model::{UnknownVisibility, Visibility};
use crate::tags::DEFAULT_MAX_TAG_LENGTH;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "plantshelf.toml";

/// Longest accepted gap between waterings, ten years.
pub const MAX_WATERING_INTERVAL_DAYS: u32 = 3650;

fn parse_visibility(raw: &str) -> std::result::Result<Visibility, UnknownVisibility> {
    raw.parse()
}

#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlantShelfConfig {
    /// Snapshot file name, relative to the data directory.
    #[config(env = "PLANTSHELF_DATA_FILE", default = "inventory.json")]
    pub data_file: String,

    /// Visibility given to plants created without an explicit one.
    #[config(
        env = "PLANTSHELF_DEFAULT_VISIBILITY",
        parse_env = parse_visibility,
        default = "private"
    )]
    pub default_visibility: Visibility,

    /// Days between a watering and the next due date.
    #[config(env = "PLANTSHELF_WATERING_INTERVAL_DAYS", default = 7)]
    pub watering_interval_days: u32,

    #[config(env = "PLANTSHELF_MAX_TAG_LENGTH", default = 64)]
    pub max_tag_length: usize,
}

impl Default for PlantShelfConfig {
    fn default() -> Self {
        Self {
            data_file: "inventory.json".to_string(),
            default_visibility: Visibility::Private,
            watering_interval_days: 7,
            max_tag_length: DEFAULT_MAX_TAG_LENGTH,
        }
    }
}

impl PlantShelfConfig {
    /// Loads settings from the environment and `<data_dir>/plantshelf.toml`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config = Self::builder()
            .env()
            .file(data_dir.join(CONFIG_FILE_NAME))
            .load()
            .map_err(|e| InventoryError::invalid(format!("configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_file.trim().is_empty() {
            return Err(InventoryError::invalid("data_file cannot be empty"));
        }
        if self.watering_interval_days == 0 || self.watering_interval_days > MAX_WATERING_INTERVAL_DAYS {
            return Err(InventoryError::invalid(format!(
                "watering_interval_days must be between 1 and {}",
                MAX_WATERING_INTERVAL_DAYS
            )));
        }
        if self.max_tag_length == 0 {
            return Err(InventoryError::invalid("max_tag_length must be at least 1"));
        }
        Ok(())
    }
}
