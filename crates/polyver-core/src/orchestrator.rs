use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};

use polyver_adapter::{AppAdapter, ManagedAdapter, UnmanagedInstaller, VersionDescriptor};

use crate::adapters::AdapterRegistry;
use crate::error::CoreError;
use crate::outcome::Outcome;
use crate::registry::AppSnapshot;
use crate::shims::ShimSynchronizer;
use crate::store::StateStore;

/// Row of the presentation-facing application listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub name: String,
    pub display_name: String,
    pub managed: bool,
    pub installed: bool,
    pub active_version: Option<String>,
}

/// The state machine driving install, uninstall, and switch
/// sequences. All collaborators are injected at construction; the
/// orchestrator owns no global state.
///
/// One lifecycle operation may be in flight per application at a
/// time; a second request against the same application is rejected
/// with [`CoreError::OperationInFlight`] rather than interleaved,
/// because the store's read-modify-write cycles have no isolation.
/// Operations against different applications may run concurrently.
pub struct Orchestrator {
    store: Arc<StateStore>,
    shims: ShimSynchronizer,
    adapters: AdapterRegistry,
    apps_dir: PathBuf,
    in_flight: Mutex<HashSet<String>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        store: Arc<StateStore>,
        shims: ShimSynchronizer,
        adapters: AdapterRegistry,
        apps_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            shims,
            adapters,
            apps_dir,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Fresh read-only view of one application's state.
    #[must_use]
    pub fn snapshot(&self, app: &str) -> AppSnapshot {
        AppSnapshot::load(&self.store, app)
    }

    /// All registered applications joined with their stored state.
    #[must_use]
    pub fn list_applications(&self) -> Vec<ApplicationInfo> {
        self.adapters
            .iter()
            .map(|(name, adapter)| {
                let state = self.store.state_of(name);
                ApplicationInfo {
                    name: name.to_string(),
                    display_name: adapter.display_name().to_string(),
                    managed: adapter.is_managed(),
                    installed: state.installed,
                    active_version: state.active_version,
                }
            })
            .collect()
    }

    /// Install a version of `app`, or report what the caller must
    /// decide first.
    ///
    /// With `version == None` a managed application's upstream
    /// listing is fetched and returned as
    /// [`Outcome::SelectionRequired`] (or
    /// [`Outcome::NoVersionsAvailable`] when empty) — the core never
    /// prompts. A version that is already installed is a benign
    /// no-op. On any adapter failure the state record is left exactly
    /// as it was and a destination directory created for this attempt
    /// is cleaned up best-effort.
    ///
    /// # Errors
    /// Adapter, storage, and shim-sync failures; see [`CoreError`].
    pub async fn install(&self, app: &str, version: Option<&str>) -> Result<Outcome, CoreError> {
        let adapter = self.adapter(app)?;
        let _guard = self.begin(app)?;

        match adapter {
            AppAdapter::Unmanaged(installer) => {
                if version.is_some() {
                    return Err(CoreError::not_managed(app));
                }
                self.install_unmanaged(app, &installer).await
            }
            AppAdapter::Managed(adapter) => self.install_managed(app, &adapter, version).await,
        }
    }

    /// Fetch an application's upstream version listing without
    /// touching any state.
    ///
    /// # Errors
    /// [`CoreError::NotManaged`] for applications without a listing,
    /// otherwise adapter failures; see [`CoreError`].
    pub async fn available_versions(&self, app: &str) -> Result<Vec<VersionDescriptor>, CoreError> {
        match self.adapter(app)? {
            AppAdapter::Unmanaged(_) => Err(CoreError::not_managed(app)),
            AppAdapter::Managed(adapter) => adapter
                .list_available()
                .await
                .map_err(|error| CoreError::adapter(app, error)),
        }
    }

    async fn install_unmanaged(
        &self,
        app: &str,
        installer: &Arc<dyn UnmanagedInstaller>,
    ) -> Result<Outcome, CoreError> {
        if self.store.state_of(app).installed {
            return Ok(Outcome::AlreadyInstalled {
                version: installer.display_name().to_string(),
            });
        }

        info!("Running installer for {app}");
        installer
            .install()
            .await
            .map_err(|error| CoreError::adapter(app, error))?;
        self.store.set_installed(app, true)?;
        Ok(Outcome::InstallerCompleted)
    }

    async fn install_managed(
        &self,
        app: &str,
        adapter: &Arc<dyn ManagedAdapter>,
        version: Option<&str>,
    ) -> Result<Outcome, CoreError> {
        let Some(version) = version else {
            let available = adapter
                .list_available()
                .await
                .map_err(|error| CoreError::adapter(app, error))?;
            return Ok(if available.is_empty() {
                Outcome::NoVersionsAvailable
            } else {
                Outcome::SelectionRequired { available }
            });
        };

        let snapshot = self.snapshot(app);
        if snapshot.contains(version) {
            return Ok(Outcome::AlreadyInstalled {
                version: version.to_string(),
            });
        }

        let dest = self.apps_dir.join(app).join(version);
        let created = !dest.exists();
        std::fs::create_dir_all(&dest)
            .map_err(|error| CoreError::disk("create install directory", app, &error))?;

        info!("Installing {app} {version} into {}", dest.display());
        let install_root = match adapter.fetch_and_unpack(version, &dest).await {
            Ok(root) => root,
            Err(error) => {
                if created {
                    debug!("Cleaning up partial install at {}", dest.display());
                    if let Err(cleanup) = std::fs::remove_dir_all(&dest) {
                        warn!("Could not clean up {}: {cleanup}", dest.display());
                    }
                }
                return Err(CoreError::adapter(app, error));
            }
        };

        self.store.add_version(app, version, &install_root)?;

        // First version becomes active and gets shims wired up;
        // later installs leave the active pointer alone.
        if self.snapshot(app).active_version().is_none() {
            self.store.set_active_version(app, version)?;
            self.sync_shims(app, adapter, version)?;
        }

        Ok(Outcome::Installed {
            version: version.to_string(),
        })
    }

    /// Uninstall one version, or every version when `version` is
    /// `None`. Removing the active version promotes the first
    /// remaining id (map iteration order) and resyncs shims; removing
    /// the last version deletes the application's entry entirely and
    /// its shims with it. Unknown versions are a benign no-op.
    ///
    /// File deletion is best-effort throughout: the state record is
    /// the ground truth, and the remove-files-then-remove-state order
    /// makes an interrupted full uninstall resumable.
    ///
    /// # Errors
    /// Storage and shim-sync failures; see [`CoreError`].
    pub async fn uninstall(&self, app: &str, version: Option<&str>) -> Result<Outcome, CoreError> {
        let adapter = self.adapter(app)?;
        let _guard = self.begin(app)?;

        match adapter {
            AppAdapter::Unmanaged(_) => {
                if self.store.state_of(app).installed {
                    self.store.remove_state(app)?;
                    Ok(Outcome::FullyRemoved)
                } else {
                    Ok(Outcome::NotInstalled { version: None })
                }
            }
            AppAdapter::Managed(adapter) => match version {
                None => self.uninstall_all(app, &adapter).await,
                Some(version) => self.uninstall_version(app, &adapter, version).await,
            },
        }
    }

    async fn uninstall_all(
        &self,
        app: &str,
        adapter: &Arc<dyn ManagedAdapter>,
    ) -> Result<Outcome, CoreError> {
        let snapshot = self.snapshot(app);
        if !snapshot.is_installed() {
            return Ok(Outcome::NotInstalled { version: None });
        }

        let ids = snapshot.installed_version_ids();
        let aliases = shim_aliases(adapter, &ids);
        let shortcuts = shortcut_names(adapter, &ids);

        info!("Uninstalling all {} versions of {app}", ids.len());
        for id in &ids {
            if let Some(path) = snapshot.path_for(id) {
                adapter.remove_files(id, path).await;
            }
            self.store.remove_version(app, id)?;
        }

        self.shims.remove_all(&aliases);
        self.shims.remove_shortcuts(&shortcuts);
        self.store.remove_state(app)?;
        Ok(Outcome::FullyRemoved)
    }

    async fn uninstall_version(
        &self,
        app: &str,
        adapter: &Arc<dyn ManagedAdapter>,
        version: &str,
    ) -> Result<Outcome, CoreError> {
        let snapshot = self.snapshot(app);
        if !snapshot.contains(version) {
            return Ok(Outcome::NotInstalled {
                version: Some(version.to_string()),
            });
        }

        let was_active = snapshot.active_version() == Some(version);

        info!("Uninstalling {app} {version}");
        if let Some(path) = snapshot.path_for(version) {
            adapter.remove_files(version, path).await;
        }
        self.store.remove_version(app, version)?;

        if !was_active {
            return Ok(Outcome::Uninstalled {
                version: version.to_string(),
                promoted: None,
            });
        }

        let remaining = self.snapshot(app).installed_version_ids();
        if let Some(next) = remaining.first() {
            self.store.set_active_version(app, next)?;
            self.sync_shims(app, adapter, next)?;
            info!("Promoted {app} {next} to active");
            Ok(Outcome::Uninstalled {
                version: version.to_string(),
                promoted: Some(next.clone()),
            })
        } else {
            let ids = [version.to_string()];
            self.shims.remove_all(&shim_aliases(adapter, &ids));
            self.shims.remove_shortcuts(&shortcut_names(adapter, &ids));
            self.store.remove_state(app)?;
            Ok(Outcome::FullyRemoved)
        }
    }

    /// Repoint the active version and resync shims. Never touches the
    /// install trees.
    ///
    /// # Errors
    /// [`CoreError::InvalidVersion`] when `version` is not installed;
    /// otherwise only storage or shim-sync failures.
    pub fn switch_version(&self, app: &str, version: &str) -> Result<Outcome, CoreError> {
        let AppAdapter::Managed(adapter) = self.adapter(app)? else {
            return Err(CoreError::not_managed(app));
        };
        let _guard = self.begin(app)?;

        let snapshot = self.snapshot(app);
        if !snapshot.is_installed() || !snapshot.contains(version) {
            return Err(CoreError::invalid_version(app, version));
        }

        self.store.set_active_version(app, version)?;
        self.sync_shims(app, &adapter, version)?;
        info!("Switched {app} to {version}");
        Ok(Outcome::Switched {
            version: version.to_string(),
        })
    }

    /// Resolve the on-disk executable a shim alias currently points
    /// at: active version, its install path, the declared subpath,
    /// the declared executable. This is the lookup generated launcher
    /// artifacts perform at invocation time.
    ///
    /// # Errors
    /// [`CoreError::ResolveFailed`] when any step of the lookup
    /// cannot be satisfied.
    pub fn resolve_executable(&self, app: &str, alias: &str) -> Result<PathBuf, CoreError> {
        let AppAdapter::Managed(adapter) = self.adapter(app)? else {
            return Err(CoreError::not_managed(app));
        };

        let snapshot = self.snapshot(app);
        let Some(active) = snapshot.active_version() else {
            return Err(CoreError::resolve_failed(app, alias, "no active version"));
        };
        let Some(install_path) = snapshot.path_for(active) else {
            return Err(CoreError::resolve_failed(
                app,
                alias,
                format!("active version {active} has no install path"),
            ));
        };

        let Some(spec) = adapter
            .shim_specs(active)
            .into_iter()
            .find(|spec| spec.shim_alias == alias)
        else {
            return Err(CoreError::resolve_failed(
                app,
                alias,
                format!("{active} declares no such executable"),
            ));
        };

        let mut path = install_path.to_path_buf();
        if !spec.subpath.is_empty() {
            path.push(&spec.subpath);
        }
        path.push(&spec.executable_name);

        if path.is_file() {
            Ok(path)
        } else {
            Err(CoreError::resolve_failed(
                app,
                alias,
                format!("executable not found at {}", path.display()),
            ))
        }
    }

    fn adapter(&self, app: &str) -> Result<AppAdapter, CoreError> {
        self.adapters
            .get(app)
            .cloned()
            .ok_or_else(|| CoreError::unknown_application(app))
    }

    fn sync_shims(
        &self,
        app: &str,
        adapter: &Arc<dyn ManagedAdapter>,
        version: &str,
    ) -> Result<(), CoreError> {
        self.shims
            .sync(app, &adapter.shim_specs(version))
            .map_err(|error| CoreError::disk("sync shims", app, &error))?;
        self.shims
            .sync_shortcuts(app, &adapter.shortcut_specs(version))
            .map_err(|error| CoreError::disk("sync shortcuts", app, &error))
    }

    fn begin(&self, app: &str) -> Result<OperationGuard<'_>, CoreError> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !in_flight.insert(app.to_string()) {
            return Err(CoreError::OperationInFlight {
                app: app.to_string(),
            });
        }
        Ok(OperationGuard {
            orchestrator: self,
            app: app.to_string(),
        })
    }
}

fn shim_aliases(adapter: &Arc<dyn ManagedAdapter>, versions: &[String]) -> Vec<String> {
    let mut aliases = Vec::new();
    for version in versions {
        for spec in adapter.shim_specs(version) {
            if !aliases.contains(&spec.shim_alias) {
                aliases.push(spec.shim_alias);
            }
        }
    }
    aliases
}

fn shortcut_names(adapter: &Arc<dyn ManagedAdapter>, versions: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    for version in versions {
        for spec in adapter.shortcut_specs(version) {
            if !names.contains(&spec.shortcut_name) {
                names.push(spec.shortcut_name);
            }
        }
    }
    names
}

/// Marks one application as mid-operation for its lifetime.
struct OperationGuard<'a> {
    orchestrator: &'a Orchestrator,
    app: String,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.orchestrator
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&self.app);
    }
}
