mod adapter;
mod manifest;
mod release;

pub use adapter::{GithubReleaseAdapter, bun, godot};
pub use manifest::{Manifest, ManifestError};
pub use release::{Release, descriptors_from_releases};
