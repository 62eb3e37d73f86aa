use async_trait::async_trait;
use log::warn;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AdapterError;
use crate::types::{ShimSpec, ShortcutSpec, VersionDescriptor};

/// Per-tool strategy for a version-managed application.
///
/// The engine depends only on this contract; concrete adapters own
/// all vendor-specific download and archive handling.
#[async_trait]
pub trait ManagedAdapter: Send + Sync {
    /// State key for this application. Must be stable and unique
    /// within one registry.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Query the upstream source for installable versions.
    ///
    /// An empty result means "no versions found" and is distinct from
    /// a transport failure. Ordering is whatever the upstream source
    /// produced; newest-first is a display convention, not a contract.
    ///
    /// # Errors
    /// Returns [`AdapterError::Network`] on transport failure.
    async fn list_available(&self) -> Result<Vec<VersionDescriptor>, AdapterError>;

    /// Download and extract `version` into `dest`, returning the path
    /// the declared executables will be found under.
    ///
    /// Must be safe to call into an already-nonempty `dest` without
    /// corrupting unrelated siblings.
    ///
    /// # Errors
    /// [`AdapterError::Download`] on a non-success response,
    /// [`AdapterError::Archive`] on a corrupt archive,
    /// [`AdapterError::Disk`] when extraction cannot be written, and
    /// [`AdapterError::Cancelled`] when the caller aborted the
    /// transfer.
    async fn fetch_and_unpack(&self, version: &str, dest: &Path)
    -> Result<PathBuf, AdapterError>;

    /// Best-effort recursive delete of a version's files. Failures
    /// are logged, never raised: the state record is the ground truth
    /// and stray files must not block uninstall bookkeeping.
    async fn remove_files(&self, version: &str, install_path: &Path) {
        if let Err(error) = tokio::fs::remove_dir_all(install_path).await
            && error.kind() != std::io::ErrorKind::NotFound
        {
            warn!(
                "Leaving stray files for {} {version} at {}: {error}",
                self.name(),
                install_path.display()
            );
        }
    }

    /// Executables a given version exposes. Pure, no I/O.
    fn shim_specs(&self, version: &str) -> Vec<ShimSpec>;

    /// Launcher shortcuts a given version exposes. Most runtimes are
    /// command-line tools and declare none. Pure, no I/O.
    fn shortcut_specs(&self, _version: &str) -> Vec<ShortcutSpec> {
        Vec::new()
    }
}

/// Fire-and-forget OS installer with no version tracking and no
/// shims.
#[async_trait]
pub trait UnmanagedInstaller: Send + Sync {
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    /// Run the tool's own installer once.
    ///
    /// # Errors
    /// Returns an [`AdapterError`] when the installer cannot be
    /// fetched or exits unsuccessfully.
    async fn install(&self) -> Result<(), AdapterError>;
}

/// Capability tag for a registered application. The orchestrator
/// dispatches on this variant, never on concrete adapter types.
#[derive(Clone)]
pub enum AppAdapter {
    Managed(Arc<dyn ManagedAdapter>),
    Unmanaged(Arc<dyn UnmanagedInstaller>),
}

impl AppAdapter {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Managed(adapter) => adapter.name(),
            Self::Unmanaged(installer) => installer.name(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Self::Managed(adapter) => adapter.display_name(),
            Self::Unmanaged(installer) => installer.display_name(),
        }
    }

    #[must_use]
    pub fn is_managed(&self) -> bool {
        matches!(self, Self::Managed(_))
    }
}
