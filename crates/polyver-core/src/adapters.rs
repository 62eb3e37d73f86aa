use std::collections::BTreeMap;

use thiserror::Error;

use polyver_adapter::AppAdapter;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("An adapter named {name} is already registered")]
    DuplicateName { name: String },

    #[error("Adapter names must not be empty")]
    EmptyName,
}

/// Process-wide table mapping application name to its registered
/// adapter. Populated explicitly at startup (built-ins first, then
/// discovered plugin manifests); entries are validated when they are
/// registered, not probed later.
#[derive(Default)]
pub struct AdapterRegistry {
    table: BTreeMap<String, AppAdapter>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name.
    ///
    /// # Errors
    /// Rejects empty names and names already taken; registration is
    /// the single point where adapter identity is validated.
    pub fn register(&mut self, adapter: AppAdapter) -> Result<(), RegistryError> {
        let name = adapter.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.table.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }
        self.table.insert(name, adapter);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AppAdapter> {
        self.table.get(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.table.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AppAdapter)> {
        self.table
            .iter()
            .map(|(name, adapter)| (name.as_str(), adapter))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use async_trait::async_trait;

    use polyver_adapter::{
        AdapterError, AppAdapter, ManagedAdapter, ShimSpec, VersionDescriptor,
    };

    use super::{AdapterRegistry, RegistryError};

    struct NamedAdapter(&'static str);

    #[async_trait]
    impl ManagedAdapter for NamedAdapter {
        fn name(&self) -> &str {
            self.0
        }

        fn display_name(&self) -> &str {
            self.0
        }

        async fn list_available(&self) -> Result<Vec<VersionDescriptor>, AdapterError> {
            Ok(Vec::new())
        }

        async fn fetch_and_unpack(
            &self,
            _version: &str,
            dest: &Path,
        ) -> Result<PathBuf, AdapterError> {
            Ok(dest.to_path_buf())
        }

        fn shim_specs(&self, _version: &str) -> Vec<ShimSpec> {
            Vec::new()
        }
    }

    fn managed(name: &'static str) -> AppAdapter {
        AppAdapter::Managed(Arc::new(NamedAdapter(name)))
    }

    #[test]
    fn register_then_get_round_trips() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(managed("nodejs"))
            .expect("registration should succeed");

        assert!(registry.get("nodejs").is_some());
        assert!(registry.get("bun").is_none());
        assert_eq!(registry.names(), ["nodejs"]);
    }

    #[test]
    fn duplicate_names_are_rejected_at_registration() {
        let mut registry = AdapterRegistry::new();
        registry
            .register(managed("nodejs"))
            .expect("first registration should succeed");

        let error = registry
            .register(managed("nodejs"))
            .expect_err("duplicate should be rejected");
        assert_eq!(
            error,
            RegistryError::DuplicateName {
                name: "nodejs".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut registry = AdapterRegistry::new();
        let error = registry
            .register(managed(""))
            .expect_err("empty name should be rejected");
        assert_eq!(error, RegistryError::EmptyName);
        assert!(registry.is_empty());
    }
}
