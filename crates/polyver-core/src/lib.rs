mod adapters;
mod error;
mod orchestrator;
mod outcome;
mod prefs;
mod registry;
mod shims;
mod state;
mod store;

pub use adapters::{AdapterRegistry, RegistryError};
pub use error::{CoreError, StoreError};
pub use orchestrator::{ApplicationInfo, Orchestrator};
pub use outcome::Outcome;
pub use prefs::{Preferences, PreferencesStore, Theme};
pub use registry::AppSnapshot;
pub use shims::{
    ScriptShimWriter, ScriptShortcutWriter, ShimContext, ShimSynchronizer, ShimWriter,
    ShortcutContext, ShortcutWriter, script_synchronizer,
};
pub use state::AppState;
pub use store::StateStore;
