use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Network error during {operation}: {details}")]
    Network {
        operation: &'static str,
        details: String,
    },

    #[error("Download of {url} failed with status {status}")]
    Download { url: String, status: u16 },

    #[error("Archive error in {context}: {details}")]
    Archive {
        context: &'static str,
        details: String,
    },

    #[error("Disk error ({kind}): {message}")]
    Disk {
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    #[error("Adapter error in {context}: {details}")]
    AdapterSpecific {
        context: &'static str,
        details: String,
    },
}

impl AdapterError {
    pub fn network(operation: &'static str, details: impl Into<String>) -> Self {
        Self::Network {
            operation,
            details: details.into(),
        }
    }

    pub fn network_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network(operation, error.to_string())
    }

    pub fn download(url: impl Into<String>, status: u16) -> Self {
        Self::Download {
            url: url.into(),
            status,
        }
    }

    pub fn archive(context: &'static str, details: impl Into<String>) -> Self {
        Self::Archive {
            context,
            details: details.into(),
        }
    }

    pub fn archive_from<E>(context: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::archive(context, error.to_string())
    }

    pub fn adapter_specific(context: &'static str, details: impl Into<String>) -> Self {
        Self::AdapterSpecific {
            context,
            details: details.into(),
        }
    }
}

impl From<std::io::Error> for AdapterError {
    fn from(err: std::io::Error) -> Self {
        AdapterError::Disk {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AdapterError;

    #[test]
    fn io_error_conversion_maps_to_disk_variant() {
        let mapped = AdapterError::from(std::io::Error::other("disk full"));
        assert!(
            matches!(mapped, AdapterError::Disk { kind, ref message } if kind == std::io::ErrorKind::Other && message.contains("disk full"))
        );
    }

    #[test]
    fn download_display_includes_url_and_status() {
        let error = AdapterError::download("https://nodejs.org/dist/v99.0.0/x.zip", 404);
        assert_eq!(
            error.to_string(),
            "Download of https://nodejs.org/dist/v99.0.0/x.zip failed with status 404"
        );
    }

    #[test]
    fn network_helper_keeps_operation_context() {
        let error = AdapterError::network_from("list versions", "connection refused");
        assert!(matches!(
            error,
            AdapterError::Network {
                operation: "list versions",
                ..
            }
        ));
        assert_eq!(
            error.to_string(),
            "Network error during list versions: connection refused"
        );
    }

    #[test]
    fn cancelled_display_names_the_operation() {
        let error = AdapterError::Cancelled {
            operation: "download",
        };
        assert_eq!(error.to_string(), "download cancelled");
    }
}
