//! Unmanaged applications: tools installed once through their own
//! installer, tracked only as an installed flag.

use std::path::PathBuf;

use async_trait::async_trait;
use log::info;

use polyver_adapter::{AdapterError, UnmanagedInstaller, fetch::download_to};

const VSCODE_INSTALLER_URL: &str =
    "https://update.code.visualstudio.com/latest/win32-x64-user/stable";

/// Downloads the Visual Studio Code user installer and hands off to
/// it. Versioning, updates, and uninstall are the installer's own
/// business.
pub struct VsCodeInstaller {
    client: reqwest::Client,
    temp_dir: PathBuf,
}

impl VsCodeInstaller {
    pub fn new(client: reqwest::Client, temp_dir: PathBuf) -> Self {
        Self { client, temp_dir }
    }
}

#[async_trait]
impl UnmanagedInstaller for VsCodeInstaller {
    fn name(&self) -> &str {
        "vscode"
    }

    fn display_name(&self) -> &str {
        "Visual Studio Code"
    }

    async fn install(&self) -> Result<(), AdapterError> {
        if !cfg!(windows) {
            return Err(AdapterError::adapter_specific(
                "running installer",
                "the Visual Studio Code installer is only automated on Windows; \
                 use your platform's package manager instead",
            ));
        }

        let installer_path = self.temp_dir.join("VSCodeSetup.exe");
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        info!("downloading Visual Studio Code installer");
        download_to(&self.client, VSCODE_INSTALLER_URL, &installer_path).await?;

        info!("launching {}", installer_path.display());
        let status = tokio::process::Command::new(&installer_path)
            .status()
            .await?;
        let _ = tokio::fs::remove_file(&installer_path).await;

        if status.success() {
            Ok(())
        } else {
            Err(AdapterError::adapter_specific(
                "running installer",
                format!("installer exited with {status}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VsCodeInstaller;
    use polyver_adapter::{AppAdapter, UnmanagedInstaller};
    use std::sync::Arc;

    #[test]
    fn vscode_registers_as_unmanaged() {
        let installer = VsCodeInstaller::new(reqwest::Client::new(), std::env::temp_dir());
        assert_eq!(installer.name(), "vscode");

        let adapter = AppAdapter::Unmanaged(Arc::new(installer));
        assert!(!adapter.is_managed());
        assert_eq!(adapter.display_name(), "Visual Studio Code");
    }
}
