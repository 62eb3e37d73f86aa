use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

/// On-disk layout of everything polyver owns.
///
/// All state lives under one base directory: the state and
/// preferences documents, the per-application install trees, the
/// shim directory (meant to be on `PATH`), scratch space for
/// in-flight downloads, and user-dropped plugin manifests.
pub struct AppPaths {
    pub base_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform.
    ///
    /// # Errors
    /// Returns an error when the platform base directory cannot be
    /// determined.
    pub fn new() -> Result<Self, AppPathsError> {
        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
            Ok(Self {
                base_dir: home.join("Library/Application Support/polyver"),
            })
        }

        #[cfg(not(target_os = "macos"))]
        {
            Ok(Self {
                base_dir: dirs::data_dir()
                    .ok_or(AppPathsError::DataDirUnavailable)?
                    .join("polyver"),
            })
        }
    }

    /// Layout rooted at an arbitrary directory, for tests and for the
    /// `POLYVER_DIR` override.
    #[must_use]
    pub fn rooted_at(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    #[must_use]
    pub fn state_file(&self) -> PathBuf {
        self.base_dir.join("apps.json")
    }

    #[must_use]
    pub fn preferences_file(&self) -> PathBuf {
        self.base_dir.join("preferences.json")
    }

    /// Root of the per-application install trees; each managed
    /// version lives at `apps/<app>/<version>`.
    #[must_use]
    pub fn apps_dir(&self) -> PathBuf {
        self.base_dir.join("apps")
    }

    /// Directory holding generated launcher shims, intended to be on
    /// the user's `PATH`.
    #[must_use]
    pub fn shims_dir(&self) -> PathBuf {
        self.base_dir.join("path")
    }

    /// Scratch space for in-flight downloads.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.base_dir.join("temp")
    }

    /// Directory launcher shortcuts are published into. Windows uses
    /// a per-user Start Menu folder, Linux the XDG applications
    /// directory, anything else a folder under the base directory.
    #[must_use]
    pub fn shortcuts_dir(&self) -> PathBuf {
        #[cfg(windows)]
        {
            if let Some(appdata) = std::env::var_os("APPDATA") {
                return PathBuf::from(appdata)
                    .join("Microsoft/Windows/Start Menu/Programs/polyver");
            }
        }

        #[cfg(target_os = "linux")]
        {
            if let Some(data) = dirs::data_dir() {
                return data.join("applications");
            }
        }

        self.base_dir.join("shortcuts")
    }

    /// Directory scanned at startup for plugin manifests.
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.base_dir.join("plugins")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.base_dir.join("polyver.log")
    }

    /// Ensure all application directories exist on disk.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.apps_dir())?;
        std::fs::create_dir_all(self.shims_dir())?;
        std::fs::create_dir_all(self.temp_dir())?;
        std::fs::create_dir_all(self.plugins_dir())?;
        Ok(())
    }
}
