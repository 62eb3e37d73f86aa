//! Startup wiring: paths, HTTP client, adapter registration, and
//! plugin manifest discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use polyver_adapter::AppAdapter;
use polyver_core::{
    AdapterRegistry, Orchestrator, PreferencesStore, ScriptShortcutWriter, StateStore,
    script_synchronizer,
};
use polyver_github::{Manifest, bun, godot};
use polyver_node::NodeAdapter;
use polyver_platform::{AppPaths, AppPathsError};

use crate::installers::VsCodeInstaller;

/// Resolve the data directory, honoring the `POLYVER_DIR` override.
pub fn app_paths() -> Result<AppPaths, AppPathsError> {
    if let Some(dir) = std::env::var_os("POLYVER_DIR") {
        return Ok(AppPaths::rooted_at(PathBuf::from(dir)));
    }
    AppPaths::new()
}

pub struct Engine {
    pub orchestrator: Orchestrator,
    pub preferences: PreferencesStore,
}

/// Assemble the orchestrator with all built-in adapters plus any
/// plugin manifests found on disk.
pub fn build_engine(paths: &AppPaths) -> Engine {
    let client = reqwest::Client::new();

    let mut registry = AdapterRegistry::new();
    let builtins = [
        AppAdapter::Managed(Arc::new(NodeAdapter::new(client.clone()))),
        AppAdapter::Managed(Arc::new(bun(client.clone()))),
        AppAdapter::Managed(Arc::new(godot(client.clone()))),
        AppAdapter::Unmanaged(Arc::new(VsCodeInstaller::new(
            client.clone(),
            paths.temp_dir(),
        ))),
    ];
    for adapter in builtins {
        let name = adapter.name().to_string();
        if let Err(error) = registry.register(adapter) {
            warn!("skipping built-in {name}: {error}");
        }
    }
    register_manifests(&mut registry, &paths.plugins_dir(), &client);

    let store = Arc::new(StateStore::new(paths.state_file()));
    let launcher = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("polyver"));
    let shims = script_synchronizer(&paths.shims_dir(), &launcher).with_shortcut_writer(
        Box::new(ScriptShortcutWriter::new(paths.shortcuts_dir(), launcher.clone())),
    );

    Engine {
        orchestrator: Orchestrator::new(store, shims, registry, paths.apps_dir()),
        preferences: PreferencesStore::new(paths.preferences_file()),
    }
}

/// Load every `*.json` manifest in the plugins directory. A malformed
/// manifest is logged and skipped; it never takes the rest of the
/// startup down with it.
fn register_manifests(registry: &mut AdapterRegistry, plugins_dir: &Path, client: &reqwest::Client) {
    let entries = match std::fs::read_dir(plugins_dir) {
        Ok(entries) => entries,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!("could not read plugins directory: {error}");
            }
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match Manifest::load(&path) {
            Ok(manifest) => {
                let name = manifest.name.clone();
                let adapter = AppAdapter::Managed(Arc::new(manifest.into_adapter(client.clone())));
                match registry.register(adapter) {
                    Ok(()) => debug!("registered plugin {name} from {}", path.display()),
                    Err(error) => warn!("skipping plugin {name}: {error}"),
                }
            }
            Err(error) => warn!("skipping plugin manifest: {error}"),
        }
    }
}
