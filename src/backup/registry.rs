use crate::backup::{BackupStorage, StorageParams};
use crate::config::OpsConfig;
use crate::error::{OpsError, ResourceType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Name-keyed table of backup storage backends.
///
/// Write-once per name: backends register during startup and a duplicate
/// name is an unrecoverable configuration error, never a silent overwrite.
/// After startup the registry is read-many; entries are never replaced or
/// removed. The active backend is picked by
/// [`OpsConfig::backup_storage_implementation`], resolved lazily at first
/// use.
#[derive(Default)]
pub struct BackupStorageRegistry {
    backends: RwLock<HashMap<String, Arc<dyn BackupStorage>>>,
}

impl BackupStorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `storage` under `name`. Fails loudly on a duplicate name
    /// so configuration mistakes surface at startup, not mid-backup.
    pub fn register(
        &self,
        name: impl Into<String>,
        storage: Arc<dyn BackupStorage>,
    ) -> Result<(), OpsError> {
        let name = name.into();
        let mut backends = self.backends.write();
        if backends.contains_key(&name) {
            return Err(OpsError::AlreadyExists {
                resource_type: ResourceType::StorageBackend,
                resource_id: name,
            });
        }
        info!(backend = %name, "registered backup storage backend");
        backends.insert(name, storage);
        Ok(())
    }

    /// Returns the backend selected by the config, or a configuration
    /// error naming the selector and the registered set.
    pub fn resolve(&self, config: &OpsConfig) -> Result<Arc<dyn BackupStorage>, OpsError> {
        let selected = &config.backup_storage_implementation;
        if selected.is_empty() {
            return Err(OpsError::InvalidConfig {
                message: "no backup storage implementation configured".into(),
            });
        }
        let backends = self.backends.read();
        backends.get(selected).cloned().ok_or_else(|| {
            let mut names = backends.keys().cloned().collect::<Vec<_>>();
            names.sort();
            OpsError::InvalidConfig {
                message: format!(
                    "unknown backup storage implementation '{selected}', registered: [{}]",
                    names.join(", ")
                ),
            }
        })
    }

    /// Resolves the configured backend and derives an annotated view from
    /// it. The shared registry entry is left untouched.
    pub fn resolve_with_params(
        &self,
        config: &OpsConfig,
        params: StorageParams,
    ) -> Result<Arc<dyn BackupStorage>, OpsError> {
        Ok(self.resolve(config)?.with_params(params))
    }

    /// Registered backend names, sorted, for diagnostics.
    pub fn registered_names(&self) -> Vec<String> {
        let mut names = self.backends.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::BackupStorageRegistry;
    use crate::backup::{
        BackupHandle, BackupStorage, StorageParams,
    };
    use crate::config::OpsConfig;
    use crate::error::{OpsError, OpsErrorCode};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Minimal backend stub: every operation reports unavailable.
    struct StubStorage {
        label: &'static str,
    }

    #[async_trait]
    impl BackupStorage for StubStorage {
        async fn list_backups(
            &self,
            _directory: &str,
        ) -> Result<Vec<Arc<dyn BackupHandle>>, OpsError> {
            Err(OpsError::Backend(format!("{} is a stub", self.label)))
        }

        async fn start_backup(
            &self,
            _directory: &str,
            _name: &str,
        ) -> Result<Arc<dyn BackupHandle>, OpsError> {
            Err(OpsError::Backend(format!("{} is a stub", self.label)))
        }

        async fn remove_backup(&self, _directory: &str, _name: &str) -> Result<(), OpsError> {
            Err(OpsError::Backend(format!("{} is a stub", self.label)))
        }

        async fn release(&self) -> Result<(), OpsError> {
            Ok(())
        }

        fn with_params(self: Arc<Self>, _params: StorageParams) -> Arc<dyn BackupStorage> {
            self
        }
    }

    #[test]
    fn duplicate_registration_is_fatal() {
        let registry = BackupStorageRegistry::new();
        registry
            .register("file", Arc::new(StubStorage { label: "first" }))
            .expect("first registration");
        let err = registry
            .register("file", Arc::new(StubStorage { label: "second" }))
            .expect_err("duplicate must fail");
        assert_eq!(err.code(), OpsErrorCode::StorageBackendAlreadyExists);
        // Losing registration did not clobber the entry.
        assert_eq!(registry.registered_names(), vec!["file".to_string()]);
    }

    #[test]
    fn resolve_rejects_unconfigured_selector() {
        let registry = BackupStorageRegistry::new();
        let err = registry
            .resolve(&OpsConfig::default())
            .err().expect("empty selector");
        assert_eq!(err.code(), OpsErrorCode::InvalidConfig);
    }

    #[test]
    fn resolve_names_registered_backends_on_mismatch() {
        let registry = BackupStorageRegistry::new();
        registry
            .register("file", Arc::new(StubStorage { label: "file" }))
            .expect("register file");
        registry
            .register("s3", Arc::new(StubStorage { label: "s3" }))
            .expect("register s3");
        let config = OpsConfig::default().with_backup_storage("gcs");
        let err = registry.resolve(&config).err().expect("unknown backend");
        let message = format!("{err}");
        assert!(message.contains("'gcs'"), "{message}");
        assert!(message.contains("[file, s3]"), "{message}");
    }

    #[tokio::test]
    async fn resolve_returns_registered_backend() {
        let registry = BackupStorageRegistry::new();
        registry
            .register("file", Arc::new(StubStorage { label: "file" }))
            .expect("register");
        let config = OpsConfig::default().with_backup_storage("file");
        let storage = registry.resolve(&config).expect("resolve");
        let err = storage
            .list_backups("ks/0")
            .await
            .err().expect("stub lists nothing");
        assert!(format!("{err}").contains("file is a stub"));
    }
}
