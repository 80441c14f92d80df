use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Backup,
    BackupFile,
    StorageBackend,
    Controller,
    BinlogProtocol,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Backup => write!(f, "backup"),
            ResourceType::BackupFile => write!(f, "backup file"),
            ResourceType::StorageBackend => write!(f, "backup storage backend"),
            ResourceType::Controller => write!(f, "schema change controller"),
            ResourceType::BinlogProtocol => write!(f, "binlog client protocol"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpsErrorCode {
    Io,
    InvalidConfig,
    Usage,
    Validation,
    Backend,
    Canceled,
    RecordedFailures,
    SchemaChangeFailed,
    BackupAlreadyExists,
    BackupFileAlreadyExists,
    StorageBackendAlreadyExists,
    ControllerAlreadyExists,
    BinlogProtocolAlreadyExists,
    BackupNotFound,
    BackupFileNotFound,
    StorageBackendNotFound,
    ControllerNotFound,
    BinlogProtocolNotFound,
}

impl OpsErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            OpsErrorCode::Io => "io",
            OpsErrorCode::InvalidConfig => "invalid_config",
            OpsErrorCode::Usage => "usage",
            OpsErrorCode::Validation => "validation",
            OpsErrorCode::Backend => "backend",
            OpsErrorCode::Canceled => "canceled",
            OpsErrorCode::RecordedFailures => "recorded_failures",
            OpsErrorCode::SchemaChangeFailed => "schema_change_failed",
            OpsErrorCode::BackupAlreadyExists => "backup_already_exists",
            OpsErrorCode::BackupFileAlreadyExists => "backup_file_already_exists",
            OpsErrorCode::StorageBackendAlreadyExists => "storage_backend_already_exists",
            OpsErrorCode::ControllerAlreadyExists => "controller_already_exists",
            OpsErrorCode::BinlogProtocolAlreadyExists => "binlog_protocol_already_exists",
            OpsErrorCode::BackupNotFound => "backup_not_found",
            OpsErrorCode::BackupFileNotFound => "backup_file_not_found",
            OpsErrorCode::StorageBackendNotFound => "storage_backend_not_found",
            OpsErrorCode::ControllerNotFound => "controller_not_found",
            OpsErrorCode::BinlogProtocolNotFound => "binlog_protocol_not_found",
        }
    }
}

#[derive(Debug, Error)]
pub enum OpsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("usage error: {0}")]
    Usage(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("operation canceled")]
    Canceled,
    #[error("{count} failure(s) recorded during backup session: {detail}")]
    RecordedFailures { count: usize, detail: String },
    #[error("schema change failed, execute result: {result_json}")]
    SchemaChangeFailed { result_json: String },
    #[error("{resource_type} '{resource_id}' already exists")]
    AlreadyExists {
        resource_type: ResourceType,
        resource_id: String,
    },
    #[error("{resource_type} '{resource_id}' not found")]
    NotFound {
        resource_type: ResourceType,
        resource_id: String,
    },
}

impl OpsError {
    pub fn code(&self) -> OpsErrorCode {
        match self {
            OpsError::Io(_) => OpsErrorCode::Io,
            OpsError::InvalidConfig { .. } => OpsErrorCode::InvalidConfig,
            OpsError::Usage(_) => OpsErrorCode::Usage,
            OpsError::Validation(_) => OpsErrorCode::Validation,
            OpsError::Backend(_) => OpsErrorCode::Backend,
            OpsError::Canceled => OpsErrorCode::Canceled,
            OpsError::RecordedFailures { .. } => OpsErrorCode::RecordedFailures,
            OpsError::SchemaChangeFailed { .. } => OpsErrorCode::SchemaChangeFailed,
            OpsError::AlreadyExists { resource_type, .. } => match resource_type {
                ResourceType::Backup => OpsErrorCode::BackupAlreadyExists,
                ResourceType::BackupFile => OpsErrorCode::BackupFileAlreadyExists,
                ResourceType::StorageBackend => OpsErrorCode::StorageBackendAlreadyExists,
                ResourceType::Controller => OpsErrorCode::ControllerAlreadyExists,
                ResourceType::BinlogProtocol => OpsErrorCode::BinlogProtocolAlreadyExists,
            },
            OpsError::NotFound { resource_type, .. } => match resource_type {
                ResourceType::Backup => OpsErrorCode::BackupNotFound,
                ResourceType::BackupFile => OpsErrorCode::BackupFileNotFound,
                ResourceType::StorageBackend => OpsErrorCode::StorageBackendNotFound,
                ResourceType::Controller => OpsErrorCode::ControllerNotFound,
                ResourceType::BinlogProtocol => OpsErrorCode::BinlogProtocolNotFound,
            },
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }
}
