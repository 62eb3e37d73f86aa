use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use log::warn;

use crate::error::StoreError;
use crate::state::AppState;

type StateDocument = BTreeMap<String, AppState>;

/// Durable mapping from application name to its install metadata.
///
/// The whole document is one flat JSON object; every mutation is a
/// read-full-document, mutate-one-key, write-full-document cycle
/// guarded by a single in-process mutex so overlapping mutations of
/// different applications cannot lose updates. There is no
/// cross-process locking; concurrent external mutation of the file is
/// undefined behavior.
pub struct StateStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl StateStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn load_document(&self) -> StateDocument {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(document) => document,
                Err(error) => {
                    warn!(
                        "Could not parse state file {}: {error}",
                        self.path.display()
                    );
                    StateDocument::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => StateDocument::new(),
            Err(error) => {
                warn!("Could not read state file {}: {error}", self.path.display());
                StateDocument::new()
            }
        }
    }

    fn write_document(&self, document: &StateDocument) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(document)
            .map_err(|error| StoreError::serialize(error.to_string()))?;
        write_atomic(&self.path, &data).map_err(|error| StoreError::io("write state file", &error))
    }

    /// State for one application; an empty default when the
    /// application has never been installed (or was fully removed).
    #[must_use]
    pub fn state_of(&self, app: &str) -> AppState {
        self.load_document().get(app).cloned().unwrap_or_default()
    }

    /// Overwrite and durably persist one application's state.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the document cannot be
    /// committed; the prior on-disk state stays intact in that case.
    pub fn set_state(&self, app: &str, state: AppState) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut document = self.load_document();
        document.insert(app.to_string(), state);
        self.write_document(&document)
    }

    /// Delete an application's entry entirely; no-op when absent.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the shrunk document cannot be
    /// committed.
    pub fn remove_state(&self, app: &str) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut document = self.load_document();
        if document.remove(app).is_none() {
            return Ok(());
        }
        self.write_document(&document)
    }

    /// Record a newly installed version and stamp the audit trail.
    /// Marks the application installed as a consequence.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the write cannot be committed.
    pub fn add_version(
        &self,
        app: &str,
        version: &str,
        install_path: &Path,
    ) -> Result<(), StoreError> {
        self.mutate(app, |state| {
            state
                .installed_versions
                .insert(version.to_string(), install_path.to_path_buf());
            let now = Utc::now();
            state.last_install = Some(now);
            if state.install_date.is_none() {
                state.install_date = Some(now);
            }
        })
    }

    /// Drop a version from the record and stamp the audit trail. If
    /// the removed version was active the pointer is cleared, never
    /// left dangling; promotion of a successor is the orchestrator's
    /// job.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the write cannot be committed.
    pub fn remove_version(&self, app: &str, version: &str) -> Result<(), StoreError> {
        self.mutate(app, |state| {
            if state.installed_versions.remove(version).is_some() {
                state.last_uninstall = Some(Utc::now());
            }
        })
    }

    /// Point the active version at `version` and stamp the change.
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the write cannot be committed.
    pub fn set_active_version(&self, app: &str, version: &str) -> Result<(), StoreError> {
        self.mutate(app, |state| {
            state.active_version = Some(version.to_string());
            state.version = Some(version.to_string());
            state.last_version_change = Some(Utc::now());
        })
    }

    /// Flip the installed flag for applications that do not track
    /// versions (unmanaged installs).
    ///
    /// # Errors
    /// Returns a [`StoreError`] when the write cannot be committed.
    pub fn set_installed(&self, app: &str, installed: bool) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut document = self.load_document();
        let state = document.entry(app.to_string()).or_default();
        state.installed = installed;
        if installed {
            state.install_date = Some(Utc::now());
        } else {
            state.uninstall_date = Some(Utc::now());
        }
        self.write_document(&document)
    }

    /// Application names present in the document.
    #[must_use]
    pub fn app_names(&self) -> Vec<String> {
        self.load_document().into_keys().collect()
    }

    #[must_use]
    pub fn installed_apps(&self) -> Vec<(String, AppState)> {
        self.load_document()
            .into_iter()
            .filter(|(_, state)| state.installed)
            .collect()
    }

    fn mutate(&self, app: &str, apply: impl FnOnce(&mut AppState)) -> Result<(), StoreError> {
        let _guard = self.lock();
        let mut document = self.load_document();
        let state = document.entry(app.to_string()).or_default();
        apply(state);
        state.normalize();
        self.write_document(&document)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Write `data` to `path` via a unique temp file in the same
/// directory followed by a rename, so a failed write never clobbers
/// the previous contents.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "store path has no parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("store");
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let pid = std::process::id();

    let mut tmp_path = None;
    for attempt in 0..16_u8 {
        let candidate = parent.join(format!(".{file_name}.{pid}.{timestamp}.{attempt}.tmp"));
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                if let Err(error) = file.write_all(data).and_then(|()| file.sync_all()) {
                    drop(file);
                    let _ = std::fs::remove_file(&candidate);
                    return Err(error);
                }
                tmp_path = Some(candidate);
                break;
            }
            Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(error) => return Err(error),
        }
    }

    let Some(tmp_path) = tmp_path else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "failed to create unique store temp file",
        ));
    };

    // Windows cannot rename over an existing file; the caller holds
    // the write lock, so the gap is not observable in-process.
    #[cfg(windows)]
    if path.exists() {
        let _ = std::fs::remove_file(path);
    }

    if let Err(error) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use crate::state::AppState;

    use super::StateStore;

    fn store_in(dir: &Path) -> StateStore {
        StateStore::new(dir.join("apps.json"))
    }

    #[test]
    fn state_of_unknown_app_is_default() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        assert_eq!(store.state_of("nodejs"), AppState::default());
    }

    #[test]
    fn set_state_then_state_of_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        let mut state = AppState::default();
        state
            .installed_versions
            .insert("v20.11.0".to_string(), PathBuf::from("/apps/nodejs/v20.11.0"));
        state.active_version = Some("v20.11.0".to_string());
        state.installed = true;

        store
            .set_state("nodejs", state.clone())
            .expect("state should persist");
        assert_eq!(store.state_of("nodejs"), state);
    }

    #[test]
    fn add_version_marks_app_installed_and_stamps_dates() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        store
            .add_version("nodejs", "v20.11.0", Path::new("/apps/nodejs/v20.11.0"))
            .expect("version should be added");

        let state = store.state_of("nodejs");
        assert!(state.installed);
        assert!(state.install_date.is_some());
        assert!(state.last_install.is_some());
        assert_eq!(
            state.path_for("v20.11.0"),
            Some(Path::new("/apps/nodejs/v20.11.0"))
        );
    }

    #[test]
    fn remove_version_clears_active_pointer_instead_of_dangling() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        store
            .add_version("nodejs", "v20.11.0", Path::new("/a"))
            .expect("version should be added");
        store
            .set_active_version("nodejs", "v20.11.0")
            .expect("active version should be set");
        store
            .remove_version("nodejs", "v20.11.0")
            .expect("version should be removed");

        let state = store.state_of("nodejs");
        assert_eq!(state.active_version, None);
        assert!(!state.installed);
        assert!(state.is_consistent());
        assert!(state.last_uninstall.is_some());
    }

    #[test]
    fn remove_state_deletes_entry_and_tolerates_absence() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        store
            .add_version("bun", "1.2.0", Path::new("/a"))
            .expect("version should be added");
        store.remove_state("bun").expect("entry should be removed");
        assert_eq!(store.state_of("bun"), AppState::default());
        assert!(store.app_names().is_empty());

        // Removing a missing entry is a no-op, not an error.
        store.remove_state("bun").expect("absent entry is a no-op");
    }

    #[test]
    fn corrupt_state_file_loads_as_empty_document() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("apps.json");
        std::fs::write(&path, b"{ not json").expect("fixture should be written");

        let store = StateStore::new(path);
        assert_eq!(store.state_of("nodejs"), AppState::default());
    }

    #[test]
    fn installed_apps_filters_uninstalled_entries() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        store
            .add_version("nodejs", "v20.11.0", Path::new("/a"))
            .expect("version should be added");
        store
            .set_installed("vscode", false)
            .expect("flag should persist");

        let installed = store.installed_apps();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].0, "nodejs");
        assert_eq!(store.app_names(), ["nodejs", "vscode"]);
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_leaves_prior_document_intact() {
        use std::os::unix::fs::PermissionsExt;

        use crate::error::StoreError;

        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());
        store
            .add_version("nodejs", "v20.11.0", Path::new("/a"))
            .expect("version should be added");
        let before = store.state_of("nodejs");

        // A read-only directory makes the temp-file creation fail
        // before the rename can touch the current document.
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o555))
            .expect("permissions should change");
        let result = store.add_version("nodejs", "v22.0.0", Path::new("/b"));
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(0o755))
            .expect("permissions should be restored");

        match result {
            Err(StoreError::Io { .. }) => {}
            other => panic!("expected io error, got {other:?}"),
        }
        let after = store.state_of("nodejs");
        assert_eq!(after, before);
        assert!(after.path_for("v22.0.0").is_none());
    }

    #[test]
    fn atomic_write_leaves_no_temp_files_behind() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let store = store_in(temp.path());

        store
            .add_version("nodejs", "v20.11.0", Path::new("/a"))
            .expect("version should be added");

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .expect("dir should be listable")
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
