use serde::Deserialize;

use polyver_adapter::VersionDescriptor;

/// Subset of the GitHub releases API a listing needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
}

/// Turn a release listing into descriptors: drafts and prereleases
/// are skipped, the configured tag prefix is stripped to form the
/// version id, and the newest surviving entry is annotated for
/// display. API order (newest first) is preserved.
#[must_use]
pub fn descriptors_from_releases(releases: &[Release], tag_prefix: &str) -> Vec<VersionDescriptor> {
    let mut descriptors = Vec::new();
    for release in releases {
        if release.draft || release.prerelease {
            continue;
        }
        let version = release
            .tag_name
            .strip_prefix(tag_prefix)
            .unwrap_or(&release.tag_name)
            .to_string();
        let display = if descriptors.is_empty() {
            format!("{version} (Latest)")
        } else {
            version.clone()
        };
        descriptors.push(VersionDescriptor::new(version, display));
    }
    descriptors
}

#[cfg(test)]
mod tests {
    use super::{Release, descriptors_from_releases};

    fn release(tag: &str, draft: bool, prerelease: bool) -> Release {
        Release {
            tag_name: tag.to_string(),
            draft,
            prerelease,
        }
    }

    #[test]
    fn drafts_and_prereleases_are_skipped() {
        let releases = vec![
            release("bun-v1.3.0", true, false),
            release("bun-v1.2.9", false, true),
            release("bun-v1.2.8", false, false),
        ];

        let descriptors = descriptors_from_releases(&releases, "bun-v");
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].real_name, "1.2.8");
    }

    #[test]
    fn newest_surviving_entry_is_annotated_latest() {
        let releases = vec![
            release("v2.1.0", false, false),
            release("v2.0.0", false, false),
        ];

        let descriptors = descriptors_from_releases(&releases, "v");
        assert_eq!(descriptors[0].display_name, "2.1.0 (Latest)");
        assert_eq!(descriptors[1].display_name, "2.0.0");
    }

    #[test]
    fn unprefixed_tags_pass_through_unchanged() {
        let releases = vec![release("nightly-build", false, false)];
        let descriptors = descriptors_from_releases(&releases, "v");
        assert_eq!(descriptors[0].real_name, "nightly-build");
    }
}
