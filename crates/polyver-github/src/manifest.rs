use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use polyver_adapter::{ShimSpec, ShortcutSpec};

use crate::adapter::GithubReleaseAdapter;

/// A plugin manifest: a JSON file dropped into the plugins directory
/// that describes one GitHub-released tool. Loading one yields a
/// fully configured [`GithubReleaseAdapter`], no code involved.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub display_name: String,
    /// "owner/name" slug of the upstream repository.
    pub repo: String,
    #[serde(default)]
    pub tag_prefix: String,
    /// Release asset file name for the current platform.
    pub asset: String,
    pub shims: Vec<ShimSpec>,
    /// Launcher shortcuts, for tools with a graphical entry point.
    #[serde(default)]
    pub shortcuts: Vec<ShortcutSpec>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read manifest {path}: {message}")]
    Read { path: String, message: String },

    #[error("manifest {path} is not valid JSON: {message}")]
    Parse { path: String, message: String },

    #[error("manifest {path} is invalid: {reason}")]
    Invalid { path: String, reason: &'static str },
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let display_path = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
            path: display_path.clone(),
            message: e.to_string(),
        })?;
        let manifest: Self = serde_json::from_str(&raw).map_err(|e| ManifestError::Parse {
            path: display_path.clone(),
            message: e.to_string(),
        })?;
        manifest.validate(&display_path)?;
        Ok(manifest)
    }

    fn validate(&self, path: &str) -> Result<(), ManifestError> {
        let invalid = |reason| ManifestError::Invalid {
            path: path.to_string(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.repo.split('/').filter(|part| !part.is_empty()).count() != 2 {
            return Err(invalid("repo must be an owner/name slug"));
        }
        if self.asset.trim().is_empty() {
            return Err(invalid("asset must not be empty"));
        }
        if self.shims.is_empty() {
            return Err(invalid("at least one shim is required"));
        }
        if self.shims.iter().any(|s| s.shim_alias.trim().is_empty()) {
            return Err(invalid("shim aliases must not be empty"));
        }
        if self.shortcuts.iter().any(|s| s.shortcut_name.trim().is_empty()) {
            return Err(invalid("shortcut names must not be empty"));
        }
        for shortcut in &self.shortcuts {
            if !self.shims.iter().any(|s| s.shim_alias == shortcut.shim_alias) {
                return Err(invalid("shortcuts must reference a declared shim alias"));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn into_adapter(self, client: reqwest::Client) -> GithubReleaseAdapter {
        GithubReleaseAdapter::new(
            client,
            self.name,
            self.display_name,
            self.repo,
            self.tag_prefix,
            self.asset,
            self.shims,
        )
        .with_shortcuts(self.shortcuts)
    }
}
