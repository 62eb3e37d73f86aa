use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::write_atomic;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

/// User preferences document. A sibling of the state document with
/// the same read/write discipline: tolerant load with defaults merged
/// over whatever fields are present, atomic write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "Utc::now")]
    pub created_date: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl Default for Preferences {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            theme: Theme::System,
            created_date: now,
            last_modified: now,
        }
    }
}

pub struct PreferencesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PreferencesStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Current preferences; defaults when the file is missing or
    /// unreadable, and missing fields filled in via serde defaults.
    #[must_use]
    pub fn load(&self) -> Preferences {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|error| {
                warn!(
                    "Could not parse preferences file {}: {error}",
                    self.path.display()
                );
                Preferences::default()
            }),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Preferences::default(),
            Err(error) => {
                warn!(
                    "Could not read preferences file {}: {error}",
                    self.path.display()
                );
                Preferences::default()
            }
        }
    }

    /// Persist preferences, stamping `last_modified`.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the document cannot be
    /// committed; the prior on-disk contents stay intact.
    pub fn save(&self, preferences: &Preferences) -> Result<(), StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stamped = preferences.clone();
        stamped.last_modified = Utc::now();
        let data = serde_json::to_vec_pretty(&stamped)
            .map_err(|error| StoreError::serialize(error.to_string()))?;
        write_atomic(&self.path, &data)
            .map_err(|error| StoreError::io("write preferences file", &error))
    }

    /// Read-modify-write convenience for the theme.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the write cannot be committed.
    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        let mut preferences = self.load();
        preferences.theme = theme;
        self.save(&preferences)
    }
}
