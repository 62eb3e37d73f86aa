use std::fmt;

use polyver_adapter::VersionDescriptor;

/// Structured result of a lifecycle transition. Benign conditions
/// (already installed, nothing to remove, empty upstream listing) are
/// outcomes rather than errors and leave all state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A version was fetched, recorded, and (if first) activated.
    Installed { version: String },
    /// The requested version was already present; nothing changed.
    AlreadyInstalled { version: String },
    /// No version was supplied; the caller must pick from this
    /// listing and call again with a resolved id.
    SelectionRequired { available: Vec<VersionDescriptor> },
    /// The upstream listing was empty; nothing was attempted.
    NoVersionsAvailable,
    /// The active pointer moved; shims were resynced.
    Switched { version: String },
    /// One version was removed; `promoted` names the version that
    /// became active in its place, when the removed one was active.
    Uninstalled {
        version: String,
        promoted: Option<String>,
    },
    /// The last version was removed; the application's entry and its
    /// shims are gone.
    FullyRemoved,
    /// The named version (or the whole application) was not
    /// installed; nothing changed.
    NotInstalled { version: Option<String> },
    /// An unmanaged tool's own installer ran to completion.
    InstallerCompleted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed { version } => write!(f, "installed {version}"),
            Self::AlreadyInstalled { version } => write!(f, "{version} is already installed"),
            Self::SelectionRequired { available } => {
                write!(f, "selection required ({} available)", available.len())
            }
            Self::NoVersionsAvailable => write!(f, "no versions available"),
            Self::Switched { version } => write!(f, "switched to {version}"),
            Self::Uninstalled {
                version,
                promoted: Some(next),
            } => write!(f, "uninstalled {version}, {next} is now active"),
            Self::Uninstalled {
                version,
                promoted: None,
            } => write!(f, "uninstalled {version}"),
            Self::FullyRemoved => write!(f, "fully removed"),
            Self::NotInstalled {
                version: Some(version),
            } => write!(f, "{version} is not installed"),
            Self::NotInstalled { version: None } => write!(f, "not installed"),
            Self::InstallerCompleted => write!(f, "installer completed"),
        }
    }
}
