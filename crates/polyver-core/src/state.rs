use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-application record in the state document.
///
/// `installed_versions` is a `BTreeMap`, so iteration order is
/// lexicographic on the version id. "First remaining" anywhere in the
/// engine means the lexicographically smallest id; callers must not
/// depend on a particular version being chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub installed: bool,

    /// Legacy display field kept for the shim scripts' benefit; never
    /// read for logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_version: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub installed_versions: BTreeMap<String, PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_version_change: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_install: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_uninstall: Option<DateTime<Utc>>,
}

impl AppState {
    /// Version ids in map iteration order.
    #[must_use]
    pub fn version_ids(&self) -> Vec<String> {
        self.installed_versions.keys().cloned().collect()
    }

    #[must_use]
    pub fn path_for(&self, version: &str) -> Option<&Path> {
        self.installed_versions.get(version).map(PathBuf::as_path)
    }

    /// Keep `installed` and `active_version` consistent with the
    /// version map after a mutation: `installed` mirrors map
    /// non-emptiness, and an active pointer at a missing key is
    /// cleared rather than left dangling.
    pub fn normalize(&mut self) {
        self.installed = !self.installed_versions.is_empty();
        if let Some(active) = &self.active_version
            && !self.installed_versions.contains_key(active)
        {
            self.active_version = None;
        }
    }

    /// Both data-model invariants: the active pointer names an
    /// installed version (or is unset), and `installed` mirrors map
    /// non-emptiness.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let active_ok = self
            .active_version
            .as_ref()
            .is_none_or(|v| self.installed_versions.contains_key(v));
        active_ok && self.installed == !self.installed_versions.is_empty()
    }
}
