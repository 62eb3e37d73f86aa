use serde::Deserialize;

use polyver_adapter::VersionDescriptor;

/// One row of the Node.js dist `index.json`. The `lts` field is
/// either `false` or the LTS codename.
#[derive(Debug, Clone, Deserialize)]
pub struct DistEntry {
    pub version: String,
    #[serde(default)]
    pub lts: LtsField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LtsField {
    Codename(String),
    Flag(bool),
    #[default]
    Absent,
}

impl LtsField {
    fn label(&self) -> Option<&str> {
        match self {
            Self::Codename(name) => Some(name.as_str()),
            Self::Flag(true) => Some("LTS"),
            Self::Flag(false) | Self::Absent => None,
        }
    }
}

/// Map the dist index to descriptors, annotating LTS lines for
/// display. Upstream order (newest first) is preserved.
#[must_use]
pub fn descriptors_from_index(entries: &[DistEntry]) -> Vec<VersionDescriptor> {
    entries
        .iter()
        .map(|entry| {
            let display = match entry.lts.label() {
                Some(codename) => format!("{} ({codename})", entry.version),
                None => entry.version.clone(),
            };
            VersionDescriptor::new(entry.version.clone(), display)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{DistEntry, LtsField, descriptors_from_index};

    #[test]
    fn lts_field_accepts_false_and_codename() {
        let entries: Vec<DistEntry> = serde_json::from_str(
            r#"[
                {"version":"v23.0.0","lts":false},
                {"version":"v22.11.0","lts":"Jod"},
                {"version":"v0.8.6"}
            ]"#,
        )
        .expect("index rows should deserialize");

        assert_eq!(entries[0].lts, LtsField::Flag(false));
        assert_eq!(entries[1].lts, LtsField::Codename("Jod".to_string()));
        assert_eq!(entries[2].lts, LtsField::Absent);
    }

    #[test]
    fn descriptors_annotate_lts_and_keep_order() {
        let entries = vec![
            DistEntry {
                version: "v23.0.0".to_string(),
                lts: LtsField::Flag(false),
            },
            DistEntry {
                version: "v22.11.0".to_string(),
                lts: LtsField::Codename("Jod".to_string()),
            },
            DistEntry {
                version: "v20.9.0".to_string(),
                lts: LtsField::Flag(true),
            },
        ];

        let descriptors = descriptors_from_index(&entries);

        assert_eq!(descriptors[0].real_name, "v23.0.0");
        assert_eq!(descriptors[0].display_name, "v23.0.0");
        assert_eq!(descriptors[1].display_name, "v22.11.0 (Jod)");
        assert_eq!(descriptors[2].display_name, "v20.9.0 (LTS)");
    }
}
