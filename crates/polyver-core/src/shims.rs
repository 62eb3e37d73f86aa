use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use polyver_adapter::{ShimSpec, ShortcutSpec};

/// Everything a writer needs to emit one launcher artifact.
pub struct ShimContext<'a> {
    pub app: &'a str,
    pub spec: &'a ShimSpec,
}

/// Everything a writer needs to emit one shortcut artifact.
pub struct ShortcutContext<'a> {
    pub app: &'a str,
    pub spec: &'a ShortcutSpec,
}

/// Seam between the synchronizer and the artifact format. The
/// synchronizer decides *which* artifacts must exist; a writer decides
/// what they look like on disk.
pub trait ShimWriter: Send + Sync {
    /// Create or overwrite the artifact for one shim declaration.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the artifact cannot be
    /// written.
    fn write(&self, context: &ShimContext<'_>) -> io::Result<PathBuf>;

    /// Delete the artifact published under `alias`. Returns false
    /// when no such artifact existed; that is not an error.
    ///
    /// # Errors
    /// Returns the underlying I/O error when an existing artifact
    /// cannot be deleted.
    fn remove(&self, alias: &str) -> io::Result<bool>;
}

/// Seam for the second artifact kind: GUI launcher shortcuts (Start
/// Menu or desktop entries), published per application rather than
/// per executable.
pub trait ShortcutWriter: Send + Sync {
    /// Create or overwrite the shortcut for one declaration.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the artifact cannot be
    /// written.
    fn write(&self, context: &ShortcutContext<'_>) -> io::Result<PathBuf>;

    /// Delete the shortcut published under `name`. Returns false when
    /// no such artifact existed; that is not an error.
    ///
    /// # Errors
    /// Returns the underlying I/O error when an existing artifact
    /// cannot be deleted.
    fn remove(&self, name: &str) -> io::Result<bool>;
}

/// Writes launcher shortcuts as text artifacts: a `.cmd` in the Start
/// Menu programs folder on Windows (a real `.lnk` needs COM, which
/// the launcher hand-off makes unnecessary), a freedesktop `.desktop`
/// entry elsewhere. Both delegate to `<launcher> run <app> <alias>`,
/// so shortcuts resolve the active version at launch time exactly
/// like shims do.
pub struct ScriptShortcutWriter {
    shortcuts_dir: PathBuf,
    launcher: PathBuf,
}

impl ScriptShortcutWriter {
    #[must_use]
    pub fn new(shortcuts_dir: PathBuf, launcher: PathBuf) -> Self {
        Self {
            shortcuts_dir,
            launcher,
        }
    }

    fn artifact_path(&self, name: &str) -> PathBuf {
        #[cfg(windows)]
        {
            self.shortcuts_dir.join(format!("{name}.cmd"))
        }
        #[cfg(not(windows))]
        {
            self.shortcuts_dir.join(format!("{name}.desktop"))
        }
    }

    fn artifact_body(&self, context: &ShortcutContext<'_>) -> String {
        let launcher = self.launcher.display();
        let app = context.app;
        let alias = &context.spec.shim_alias;
        let name = &context.spec.shortcut_name;

        #[cfg(windows)]
        {
            format!(
                "@echo off\r\n\
                 rem Generated shortcut for {name} ({app}); resolves the active version at run time.\r\n\
                 start \"\" \"{launcher}\" run {app} {alias}\r\n"
            )
        }
        #[cfg(not(windows))]
        {
            format!(
                "[Desktop Entry]\n\
                 Type=Application\n\
                 Name={name}\n\
                 Comment={name}, version-managed launcher\n\
                 Exec=\"{launcher}\" run {app} {alias}\n\
                 Terminal=false\n"
            )
        }
    }
}

impl ShortcutWriter for ScriptShortcutWriter {
    fn write(&self, context: &ShortcutContext<'_>) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.shortcuts_dir)?;
        let path = self.artifact_path(&context.spec.shortcut_name);
        std::fs::write(&path, self.artifact_body(context))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }

        Ok(path)
    }

    fn remove(&self, name: &str) -> io::Result<bool> {
        match std::fs::remove_file(self.artifact_path(name)) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error),
        }
    }
}

/// Writes launcher scripts into the shim directory. Each script
/// delegates to `<launcher> run <app> <alias>`, which performs the
/// active-version lookup against the state file at invocation time,
/// so artifacts stay valid across version switches even without a
/// rewrite.
pub struct ScriptShimWriter {
    shims_dir: PathBuf,
    launcher: PathBuf,
}

impl ScriptShimWriter {
    #[must_use]
    pub fn new(shims_dir: PathBuf, launcher: PathBuf) -> Self {
        Self {
            shims_dir,
            launcher,
        }
    }

    fn artifact_path(&self, alias: &str) -> PathBuf {
        #[cfg(windows)]
        {
            self.shims_dir.join(format!("{alias}.ps1"))
        }
        #[cfg(not(windows))]
        {
            self.shims_dir.join(alias)
        }
    }

    fn script_body(&self, context: &ShimContext<'_>) -> String {
        let launcher = self.launcher.display();
        let app = context.app;
        let alias = &context.spec.shim_alias;

        #[cfg(windows)]
        {
            format!(
                "# Generated launcher for {alias} ({app}); resolves the active version at run time.\n\
                 param([Parameter(ValueFromRemainingArguments=$true)]$Args)\n\
                 & \"{launcher}\" run {app} {alias} -- @Args\n\
                 exit $LASTEXITCODE\n"
            )
        }
        #[cfg(not(windows))]
        {
            format!(
                "#!/bin/sh\n\
                 # Generated launcher for {alias} ({app}); resolves the active version at run time.\n\
                 exec \"{launcher}\" run {app} {alias} -- \"$@\"\n"
            )
        }
    }
}

impl ShimWriter for ScriptShimWriter {
    fn write(&self, context: &ShimContext<'_>) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.shims_dir)?;
        let path = self.artifact_path(&context.spec.shim_alias);
        std::fs::write(&path, self.script_body(context))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
        }

        Ok(path)
    }

    fn remove(&self, alias: &str) -> io::Result<bool> {
        match std::fs::remove_file(self.artifact_path(alias)) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(error) => Err(error),
        }
    }
}

/// Keeps the launcher artifacts on disk consistent with the currently
/// active version of each application. Invoked after every
/// state-mutating operation.
pub struct ShimSynchronizer {
    writer: Box<dyn ShimWriter>,
    shortcut_writer: Option<Box<dyn ShortcutWriter>>,
}

impl ShimSynchronizer {
    #[must_use]
    pub fn new(writer: Box<dyn ShimWriter>) -> Self {
        Self {
            writer,
            shortcut_writer: None,
        }
    }

    /// Additionally maintain shortcut artifacts. Without a shortcut
    /// writer, shortcut declarations are ignored.
    #[must_use]
    pub fn with_shortcut_writer(mut self, writer: Box<dyn ShortcutWriter>) -> Self {
        self.shortcut_writer = Some(writer);
        self
    }

    /// Regenerate every artifact declared by `specs`. Idempotent:
    /// existing artifacts are overwritten.
    ///
    /// # Errors
    /// Returns the first I/O error; earlier artifacts may already
    /// have been rewritten (each rewrite is individually complete).
    pub fn sync(&self, app: &str, specs: &[ShimSpec]) -> io::Result<()> {
        for spec in specs {
            let path = self.writer.write(&ShimContext { app, spec })?;
            debug!("Wrote shim {} -> {}", spec.shim_alias, path.display());
        }
        Ok(())
    }

    /// Delete the named artifacts; missing ones are skipped and
    /// failures are logged, since a stray shim is recoverable while
    /// blocked uninstall bookkeeping is not. Returns how many were
    /// actually removed.
    pub fn remove_all(&self, aliases: &[String]) -> usize {
        let mut removed = 0;
        for alias in aliases {
            match self.writer.remove(alias) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(error) => warn!("Could not remove shim {alias}: {error}"),
            }
        }
        removed
    }

    /// Regenerate every shortcut declared by `specs`. Idempotent, and
    /// a no-op when no shortcut writer is configured.
    ///
    /// # Errors
    /// Returns the first I/O error.
    pub fn sync_shortcuts(&self, app: &str, specs: &[ShortcutSpec]) -> io::Result<()> {
        let Some(writer) = &self.shortcut_writer else {
            return Ok(());
        };
        for spec in specs {
            let path = writer.write(&ShortcutContext { app, spec })?;
            debug!("Wrote shortcut {} -> {}", spec.shortcut_name, path.display());
        }
        Ok(())
    }

    /// Delete the named shortcuts with the same tolerance as
    /// [`Self::remove_all`]. Returns how many were actually removed.
    pub fn remove_shortcuts(&self, names: &[String]) -> usize {
        let Some(writer) = &self.shortcut_writer else {
            return 0;
        };
        let mut removed = 0;
        for name in names {
            match writer.remove(name) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(error) => warn!("Could not remove shortcut {name}: {error}"),
            }
        }
        removed
    }
}

/// Default synchronizer writing launcher scripts under `shims_dir`
/// that delegate to the given launcher binary.
#[must_use]
pub fn script_synchronizer(shims_dir: &Path, launcher: &Path) -> ShimSynchronizer {
    ShimSynchronizer::new(Box::new(ScriptShimWriter::new(
        shims_dir.to_path_buf(),
        launcher.to_path_buf(),
    )))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use polyver_adapter::{ShimSpec, ShortcutSpec};

    use super::{
        ScriptShimWriter, ScriptShortcutWriter, ShimContext, ShimSynchronizer, ShimWriter,
        ShortcutContext, ShortcutWriter,
    };

    fn writer_in(dir: &std::path::Path) -> ScriptShimWriter {
        ScriptShimWriter::new(dir.join("path"), PathBuf::from("/usr/local/bin/polyver"))
    }

    #[test]
    fn write_emits_script_delegating_to_launcher() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let writer = writer_in(temp.path());
        let spec = ShimSpec::new("node.exe", "node-v20.11.0-win-x64", "node");

        let path = writer
            .write(&ShimContext {
                app: "nodejs",
                spec: &spec,
            })
            .expect("shim should be written");

        let body = std::fs::read_to_string(&path).expect("shim should be readable");
        assert!(body.contains("run nodejs node"));
        assert!(body.contains("polyver"));
    }

    #[cfg(unix)]
    #[test]
    fn written_shim_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("tempdir should be created");
        let writer = writer_in(temp.path());
        let spec = ShimSpec::new("bun", "", "bun");

        let path = writer
            .write(&ShimContext {
                app: "bun",
                spec: &spec,
            })
            .expect("shim should be written");

        let mode = std::fs::metadata(&path)
            .expect("shim metadata should be readable")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn remove_reports_missing_artifact_without_error() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let writer = writer_in(temp.path());

        assert!(!writer.remove("ghost").expect("missing shim is not an error"));
    }

    #[test]
    fn sync_is_idempotent_and_remove_all_counts() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let synchronizer = ShimSynchronizer::new(Box::new(writer_in(temp.path())));
        let specs = vec![
            ShimSpec::new("node.exe", "root", "node"),
            ShimSpec::new("npm.ps1", "root", "npm"),
        ];

        synchronizer
            .sync("nodejs", &specs)
            .expect("first sync should succeed");
        synchronizer
            .sync("nodejs", &specs)
            .expect("second sync should overwrite in place");

        let removed = synchronizer.remove_all(&["node".to_string(), "npm".to_string(), "ghost".to_string()]);
        assert_eq!(removed, 2);
    }

    #[test]
    fn shortcut_artifact_delegates_to_launcher_and_removes_cleanly() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let writer = ScriptShortcutWriter::new(
            temp.path().join("shortcuts"),
            PathBuf::from("/usr/local/bin/polyver"),
        );
        let spec = ShortcutSpec::new("Godot", "godot");

        let path = writer
            .write(&ShortcutContext {
                app: "godot",
                spec: &spec,
            })
            .expect("shortcut should be written");

        let body = std::fs::read_to_string(&path).expect("shortcut should be readable");
        assert!(body.contains("run godot godot"));
        assert!(body.contains("Godot"));

        assert!(writer.remove("Godot").expect("shortcut should be removed"));
        assert!(!writer.remove("Godot").expect("missing shortcut is not an error"));
    }

    #[test]
    fn shortcut_sync_without_a_writer_is_a_noop() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let synchronizer = ShimSynchronizer::new(Box::new(writer_in(temp.path())));

        synchronizer
            .sync_shortcuts("godot", &[ShortcutSpec::new("Godot", "godot")])
            .expect("no shortcut writer means nothing to do");
        assert_eq!(synchronizer.remove_shortcuts(&["Godot".to_string()]), 0);
    }

    #[test]
    fn shortcut_sync_with_a_writer_creates_and_removes_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let shortcuts_dir = temp.path().join("shortcuts");
        let synchronizer = ShimSynchronizer::new(Box::new(writer_in(temp.path())))
            .with_shortcut_writer(Box::new(ScriptShortcutWriter::new(
                shortcuts_dir.clone(),
                PathBuf::from("/usr/local/bin/polyver"),
            )));

        synchronizer
            .sync_shortcuts("godot", &[ShortcutSpec::new("Godot", "godot")])
            .expect("shortcut should be written");
        assert_eq!(
            std::fs::read_dir(&shortcuts_dir)
                .expect("shortcuts dir should exist")
                .count(),
            1
        );

        assert_eq!(synchronizer.remove_shortcuts(&["Godot".to_string()]), 1);
    }
}
