use thiserror::Error;

use polyver_adapter::AdapterError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("State store {action} failed ({kind}): {message}")]
    Io {
        action: &'static str,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("State store serialization failed: {details}")]
    Serialize { details: String },
}

impl StoreError {
    pub(crate) fn io(action: &'static str, error: &std::io::Error) -> Self {
        Self::Io {
            action,
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub(crate) fn serialize(details: impl Into<String>) -> Self {
        Self::Serialize {
            details: details.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("No application named {app} is registered")]
    UnknownApplication { app: String },

    #[error("{app} does not track versions")]
    NotManaged { app: String },

    #[error("Version {version} of {app} is not installed")]
    InvalidVersion { app: String, version: String },

    #[error("Another operation on {app} is already in progress")]
    OperationInFlight { app: String },

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("{app}: {source}")]
    Adapter { app: String, source: AdapterError },

    #[error("{action} for {app} failed ({kind}): {message}")]
    Disk {
        action: &'static str,
        app: String,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Cannot resolve {alias} for {app}: {reason}")]
    ResolveFailed {
        app: String,
        alias: String,
        reason: String,
    },
}

impl CoreError {
    pub fn unknown_application(app: impl Into<String>) -> Self {
        Self::UnknownApplication { app: app.into() }
    }

    pub fn not_managed(app: impl Into<String>) -> Self {
        Self::NotManaged { app: app.into() }
    }

    pub fn invalid_version(app: impl Into<String>, version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            app: app.into(),
            version: version.into(),
        }
    }

    pub fn adapter(app: impl Into<String>, source: AdapterError) -> Self {
        Self::Adapter {
            app: app.into(),
            source,
        }
    }

    pub fn disk(action: &'static str, app: impl Into<String>, error: &std::io::Error) -> Self {
        Self::Disk {
            action,
            app: app.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }

    pub fn resolve_failed(
        app: impl Into<String>,
        alias: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ResolveFailed {
            app: app.into(),
            alias: alias.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use polyver_adapter::AdapterError;

    use super::{CoreError, StoreError};

    #[test]
    fn store_error_display_includes_action_and_kind() {
        let error = StoreError::io(
            "write state file",
            &std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(
            error.to_string(),
            "State store write state file failed (permission denied): denied"
        );
    }

    #[test]
    fn storage_error_passes_through_transparently() {
        let inner = StoreError::serialize("bad document");
        let outer = CoreError::from(inner.clone());
        assert_eq!(outer.to_string(), inner.to_string());
    }

    #[test]
    fn adapter_error_display_names_the_application() {
        let error = CoreError::adapter("nodejs", AdapterError::download("https://x/y.zip", 404));
        assert_eq!(
            error.to_string(),
            "nodejs: Download of https://x/y.zip failed with status 404"
        );
    }

    #[test]
    fn invalid_version_display_names_app_and_version() {
        let error = CoreError::invalid_version("nodejs", "v3.0.0");
        assert_eq!(error.to_string(), "Version v3.0.0 of nodejs is not installed");
    }
}
