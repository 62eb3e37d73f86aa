use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};

use polyver_adapter::{
    AdapterError, ManagedAdapter, ShimSpec, ShortcutSpec, VersionDescriptor,
    fetch::{download_to, unpack_archive},
};

use crate::release::{Release, descriptors_from_releases};

const GITHUB_API: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("polyver/", env!("CARGO_PKG_VERSION"));

/// Adapter for tools that publish platform archives on GitHub
/// releases. Everything that varies per tool is plain configuration,
/// so one implementation serves both built-in apps and plugin
/// manifests.
///
/// Asset and shim fields may embed a `{version}` placeholder, which
/// is replaced with the installed version id. Tools like Godot bake
/// the version into every asset and executable name.
pub struct GithubReleaseAdapter {
    client: reqwest::Client,
    name: String,
    display_name: String,
    /// "owner/name" slug.
    repo: String,
    /// Prefix stripped from tag names to form version ids.
    tag_prefix: String,
    /// Release asset file name, e.g. `bun-windows-x64.zip`.
    asset: String,
    shims: Vec<ShimSpec>,
    shortcuts: Vec<ShortcutSpec>,
}

fn expand(template: &str, version: &str) -> String {
    template.replace("{version}", version)
}

impl GithubReleaseAdapter {
    pub fn new(
        client: reqwest::Client,
        name: impl Into<String>,
        display_name: impl Into<String>,
        repo: impl Into<String>,
        tag_prefix: impl Into<String>,
        asset: impl Into<String>,
        shims: Vec<ShimSpec>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            display_name: display_name.into(),
            repo: repo.into(),
            tag_prefix: tag_prefix.into(),
            asset: asset.into(),
            shims,
            shortcuts: Vec::new(),
        }
    }

    /// Launcher shortcuts every installed version publishes.
    #[must_use]
    pub fn with_shortcuts(mut self, shortcuts: Vec<ShortcutSpec>) -> Self {
        self.shortcuts = shortcuts;
        self
    }

    fn releases_url(&self) -> String {
        format!("{GITHUB_API}/repos/{}/releases?per_page=100", self.repo)
    }

    fn asset_for(&self, version: &str) -> String {
        expand(&self.asset, version)
    }

    fn asset_url(&self, version: &str) -> String {
        format!(
            "https://github.com/{}/releases/download/{}{version}/{}",
            self.repo,
            self.tag_prefix,
            self.asset_for(version)
        )
    }

    /// Directory name the archive unpacks into, conventionally the
    /// asset name without its archive extension.
    fn asset_stem(&self, version: &str) -> String {
        let asset = self.asset_for(version);
        for suffix in [".zip", ".tar.gz", ".tgz"] {
            if let Some(stem) = asset.strip_suffix(suffix) {
                return stem.to_string();
            }
        }
        asset
    }
}

#[async_trait]
impl ManagedAdapter for GithubReleaseAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn list_available(&self) -> Result<Vec<VersionDescriptor>, AdapterError> {
        let url = self.releases_url();
        debug!("fetching release listing from {url}");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| AdapterError::network_from("listing releases", &e))?;
        if !response.status().is_success() {
            return Err(AdapterError::download(url, response.status().as_u16()));
        }
        let releases: Vec<Release> = response
            .json()
            .await
            .map_err(|e| AdapterError::network_from("decoding release listing", &e))?;
        Ok(descriptors_from_releases(&releases, &self.tag_prefix))
    }

    async fn fetch_and_unpack(
        &self,
        version: &str,
        dest: &Path,
    ) -> Result<PathBuf, AdapterError> {
        let url = self.asset_url(version);
        let archive = dest.join(self.asset_for(version));

        tokio::fs::create_dir_all(dest).await?;
        info!("downloading {} {version} from {url}", self.name);
        download_to(&self.client, &url, &archive).await?;
        unpack_archive(archive.clone(), dest.to_path_buf()).await?;
        tokio::fs::remove_file(&archive).await?;

        Ok(dest.to_path_buf())
    }

    fn shim_specs(&self, version: &str) -> Vec<ShimSpec> {
        let stem = self.asset_stem(version);
        self.shims
            .iter()
            .map(|spec| ShimSpec {
                executable_name: expand(&spec.executable_name, version),
                subpath: expand(&spec.subpath.replace("{stem}", &stem), version),
                shim_alias: spec.shim_alias.clone(),
            })
            .collect()
    }

    fn shortcut_specs(&self, _version: &str) -> Vec<ShortcutSpec> {
        self.shortcuts.clone()
    }
}

#[cfg(windows)]
const BUN_ASSET: &str = "bun-windows-x64.zip";
#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
const BUN_ASSET: &str = "bun-darwin-x64.zip";
#[cfg(all(target_os = "macos", target_arch = "aarch64"))]
const BUN_ASSET: &str = "bun-darwin-aarch64.zip";
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const BUN_ASSET: &str = "bun-linux-x64.zip";
#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
const BUN_ASSET: &str = "bun-linux-aarch64.zip";

#[cfg(windows)]
const BUN_EXECUTABLE: &str = "bun.exe";
#[cfg(not(windows))]
const BUN_EXECUTABLE: &str = "bun";

/// Built-in Bun configuration. The zip expands into a directory
/// named after the asset, hence the `{stem}` subpath.
#[must_use]
pub fn bun(client: reqwest::Client) -> GithubReleaseAdapter {
    GithubReleaseAdapter::new(
        client,
        "bun",
        "Bun",
        "oven-sh/bun",
        "bun-",
        BUN_ASSET,
        vec![ShimSpec::new(BUN_EXECUTABLE, "{stem}", "bun")],
    )
}

#[cfg(windows)]
const GODOT_ASSET: &str = "Godot_v{version}_win64.exe.zip";
#[cfg(target_os = "macos")]
const GODOT_ASSET: &str = "Godot_v{version}_macos.universal.zip";
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const GODOT_ASSET: &str = "Godot_v{version}_linux.x86_64.zip";
#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
const GODOT_ASSET: &str = "Godot_v{version}_linux.arm64.zip";

#[cfg(windows)]
const GODOT_EXECUTABLE: &str = "Godot_v{version}_win64.exe";
#[cfg(target_os = "macos")]
const GODOT_EXECUTABLE: &str = "Godot";
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
const GODOT_EXECUTABLE: &str = "Godot_v{version}_linux.x86_64";
#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
const GODOT_EXECUTABLE: &str = "Godot_v{version}_linux.arm64";

#[cfg(target_os = "macos")]
const GODOT_SUBPATH: &str = "Godot.app/Contents/MacOS";
#[cfg(not(target_os = "macos"))]
const GODOT_SUBPATH: &str = "";

/// Built-in Godot configuration. Tags carry no prefix and read like
/// `4.2.1-stable`, the executable sits at the archive root, and a
/// desktop shortcut is published alongside the shim.
#[must_use]
pub fn godot(client: reqwest::Client) -> GithubReleaseAdapter {
    GithubReleaseAdapter::new(
        client,
        "godot",
        "Godot",
        "godotengine/godot",
        "",
        GODOT_ASSET,
        vec![ShimSpec::new(GODOT_EXECUTABLE, GODOT_SUBPATH, "godot")],
    )
    .with_shortcuts(vec![ShortcutSpec::new("Godot", "godot")])
}
