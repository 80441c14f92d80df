/// Runtime configuration for the operational tooling.
///
/// Holds the name selectors that pick the active pluggable implementations.
/// Names are resolved lazily at first use by the matching registry, not
/// validated at construction time, so a config can be built before all
/// backends have registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpsConfig {
    /// Name of the registered backup storage backend to use.
    pub backup_storage_implementation: String,
    /// Name of the registered binlog client protocol to use.
    pub binlog_client_protocol: String,
    /// Name of the registered schema-change controller to use.
    pub schema_change_controller: String,
}

impl Default for OpsConfig {
    fn default() -> Self {
        Self {
            backup_storage_implementation: String::new(),
            binlog_client_protocol: "grpc".to_string(),
            schema_change_controller: String::new(),
        }
    }
}

impl OpsConfig {
    pub fn with_backup_storage(mut self, name: impl Into<String>) -> Self {
        self.backup_storage_implementation = name.into();
        self
    }

    pub fn with_binlog_protocol(mut self, name: impl Into<String>) -> Self {
        self.binlog_client_protocol = name.into();
        self
    }

    pub fn with_schema_change_controller(mut self, name: impl Into<String>) -> Self {
        self.schema_change_controller = name.into();
        self
    }
}
