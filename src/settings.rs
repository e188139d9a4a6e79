// Import necessary libraries and modules for file I/O and serialization.
use crate::error::{ChargenError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_FEATURE_ID: &str = "character_creation";
pub const DEFAULT_DRAFT_TTL_DAYS: i64 = 7;
pub const DEFAULT_MAX_DRAFTS: usize = 20;

// Define a structure to hold chargen settings with serialization and deserialization capabilities.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub feature_id: String, // Preference key the character state is stored under.
    pub draft_dir: Option<PathBuf>, // Where local drafts live; defaults under the data dir.
    pub draft_ttl_days: i64,
    pub max_drafts: usize,
    pub debug_mode: bool, // Flag to enable or disable debug logging.
}

// Implement the Default trait for Settings to provide a method to create default settings.
impl Default for Settings {
    fn default() -> Self {
        Settings {
            feature_id: DEFAULT_FEATURE_ID.to_string(),
            draft_dir: None,
            draft_ttl_days: DEFAULT_DRAFT_TTL_DAYS,
            max_drafts: DEFAULT_MAX_DRAFTS,
            debug_mode: false,
        }
    }
}

// Additional implementation block for Settings.
impl Settings {
    // Constructor function to create new settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    // ~/sharad/data
    pub fn data_dir() -> Result<PathBuf> {
        let home_dir = dir::home_dir().ok_or(ChargenError::NoHomeDirectory)?;
        Ok(home_dir.join("sharad").join("data"))
    }

    // Load settings from the default file path, falling back to defaults if there is none.
    pub fn load() -> Result<Self> {
        let path = Self::data_dir()?.join("chargen_settings.json");
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_settings_from_file(path)
    }

    // Load settings from a specified file path.
    pub fn load_settings_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?; // Read settings from file.
        let settings = serde_json::from_str(&data)?; // Deserialize JSON data into settings.
        Ok(settings)
    }

    // Save current settings to a specified file path.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self)?; // Serialize settings into pretty JSON format.
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        let mut file = fs::File::create(path)?; // Create or overwrite the file.
        file.write_all(data.as_bytes())?; // Write the serialized data to the file.
        Ok(())
    }

    pub fn resolved_draft_dir(&self) -> Result<PathBuf> {
        match &self.draft_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("drafts")),
        }
    }
}
