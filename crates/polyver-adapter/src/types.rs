use serde::{Deserialize, Serialize};

/// One entry of an adapter's upstream version listing.
///
/// `real_name` is the installation and state key; `display_name` is
/// presentation-only and must never be used as a map key or path
/// component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    pub real_name: String,
    pub display_name: String,
}

impl VersionDescriptor {
    #[must_use]
    pub fn new(real_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            real_name: real_name.into(),
            display_name: display_name.into(),
        }
    }

    /// Descriptor whose display name is just the version id.
    #[must_use]
    pub fn plain(real_name: impl Into<String>) -> Self {
        let real_name = real_name.into();
        let display_name = real_name.clone();
        Self {
            real_name,
            display_name,
        }
    }
}

/// Declaration of one executable a version exposes, consumed by the
/// shim synchronizer. Pure data, no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShimSpec {
    /// File name of the executable under the install path.
    pub executable_name: String,
    /// Path components between the install path and the executable,
    /// e.g. the top-level folder an archive extracts into. Empty when
    /// the executable sits directly in the install path.
    #[serde(default)]
    pub subpath: String,
    /// Stable command name the shim is published under.
    pub shim_alias: String,
}

impl ShimSpec {
    #[must_use]
    pub fn new(
        executable_name: impl Into<String>,
        subpath: impl Into<String>,
        shim_alias: impl Into<String>,
    ) -> Self {
        Self {
            executable_name: executable_name.into(),
            subpath: subpath.into(),
            shim_alias: shim_alias.into(),
        }
    }
}

/// Declaration of one launcher shortcut (Start Menu entry, desktop
/// entry) a version exposes. Like [`ShimSpec`] this is pure data; the
/// synchronizer owns the artifact on disk, and the artifact launches
/// through the declared shim alias so the active-version lookup stays
/// dynamic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutSpec {
    /// Display name the shortcut is published under, e.g. "Godot".
    pub shortcut_name: String,
    /// Shim alias the shortcut launches; must be one of the aliases
    /// the same version declares in its shim specs.
    pub shim_alias: String,
}

impl ShortcutSpec {
    #[must_use]
    pub fn new(shortcut_name: impl Into<String>, shim_alias: impl Into<String>) -> Self {
        Self {
            shortcut_name: shortcut_name.into(),
            shim_alias: shim_alias.into(),
        }
    }
}
