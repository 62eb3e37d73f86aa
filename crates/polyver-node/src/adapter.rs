use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use polyver_adapter::fetch::{download_to, unpack_archive};
use polyver_adapter::{AdapterError, ManagedAdapter, ShimSpec, VersionDescriptor};

use crate::release::{DistEntry, descriptors_from_index};

const DEFAULT_DIST_MIRROR: &str = "https://nodejs.org/dist";

#[cfg(all(target_os = "windows", target_arch = "x86_64"))]
const PLATFORM: &str = "win-x64";
#[cfg(all(target_os = "windows", target_arch = "aarch64"))]
const PLATFORM: &str = "win-arm64";
#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
const PLATFORM: &str = "darwin-x64";
#[cfg(all(target_os = "macos", target_arch = "aarch64"))]
const PLATFORM: &str = "darwin-arm64";
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const PLATFORM: &str = "linux-x64";
#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
const PLATFORM: &str = "linux-arm64";

// The dist server ships zip archives for Windows and tarballs for
// everything else.
#[cfg(windows)]
const ARCHIVE_EXT: &str = "zip";
#[cfg(not(windows))]
const ARCHIVE_EXT: &str = "tar.gz";

/// Node.js adapter against the official dist server (or a configured
/// mirror with the same layout).
pub struct NodeAdapter {
    client: reqwest::Client,
    dist_mirror: String,
}

impl NodeAdapter {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            dist_mirror: DEFAULT_DIST_MIRROR.to_string(),
        }
    }

    #[must_use]
    pub fn with_dist_mirror(mut self, mirror: String) -> Self {
        self.dist_mirror = mirror.trim_end_matches('/').to_string();
        self
    }

    /// Top-level folder the official archives extract into, and the
    /// shim subpath as a consequence.
    fn archive_stem(version: &str) -> String {
        format!("node-{version}-{PLATFORM}")
    }

    fn archive_name(version: &str) -> String {
        format!("{}.{ARCHIVE_EXT}", Self::archive_stem(version))
    }
}

#[async_trait]
impl ManagedAdapter for NodeAdapter {
    fn name(&self) -> &str {
        "nodejs"
    }

    fn display_name(&self) -> &str {
        "Node.js"
    }

    async fn list_available(&self) -> Result<Vec<VersionDescriptor>, AdapterError> {
        let url = format!("{}/index.json", self.dist_mirror);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| AdapterError::network_from("list node versions", error))?;

        if !response.status().is_success() {
            return Err(AdapterError::download(url, response.status().as_u16()));
        }

        let entries: Vec<DistEntry> = response
            .json()
            .await
            .map_err(|error| AdapterError::network_from("parse node index", error))?;
        debug!("Fetched {} node index entries", entries.len());
        Ok(descriptors_from_index(&entries))
    }

    async fn fetch_and_unpack(
        &self,
        version: &str,
        dest: &Path,
    ) -> Result<PathBuf, AdapterError> {
        let filename = Self::archive_name(version);
        let url = format!("{}/{version}/{filename}", self.dist_mirror);
        let archive = dest.join(&filename);

        download_to(&self.client, &url, &archive).await?;
        unpack_archive(archive.clone(), dest.to_path_buf()).await?;
        tokio::fs::remove_file(&archive).await?;

        Ok(dest.to_path_buf())
    }

    fn shim_specs(&self, version: &str) -> Vec<ShimSpec> {
        let stem = Self::archive_stem(version);
        #[cfg(windows)]
        {
            vec![
                ShimSpec::new("node.exe", stem.clone(), "node"),
                ShimSpec::new("npm.ps1", stem.clone(), "npm"),
                ShimSpec::new("npx.ps1", stem, "npx"),
            ]
        }
        #[cfg(not(windows))]
        {
            let bin = format!("{stem}/bin");
            vec![
                ShimSpec::new("node", bin.clone(), "node"),
                ShimSpec::new("npm", bin.clone(), "npm"),
                ShimSpec::new("npx", bin, "npx"),
            ]
        }
    }
}
