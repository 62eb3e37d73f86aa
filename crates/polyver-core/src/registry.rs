use std::path::Path;

use crate::state::AppState;
use crate::store::StateStore;

/// Read-only projection of one application's state, loaded fresh
/// from the store at the start of every query. Never mutated in
/// place: the only way state changes is through the orchestrator
/// writing to the store and loading a new snapshot.
#[derive(Debug, Clone)]
pub struct AppSnapshot {
    state: AppState,
}

impl AppSnapshot {
    #[must_use]
    pub fn load(store: &StateStore, name: &str) -> Self {
        Self {
            state: store.state_of(name),
        }
    }

    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.state.installed
    }

    #[must_use]
    pub fn active_version(&self) -> Option<&str> {
        self.state.active_version.as_deref()
    }

    /// Version ids in the underlying map's iteration order.
    #[must_use]
    pub fn installed_version_ids(&self) -> Vec<String> {
        self.state.version_ids()
    }

    #[must_use]
    pub fn contains(&self, version: &str) -> bool {
        self.state.installed_versions.contains_key(version)
    }

    #[must_use]
    pub fn path_for(&self, version: &str) -> Option<&Path> {
        self.state.path_for(version)
    }
}
