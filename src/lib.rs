pub mod backup;
pub mod binlog;
pub mod config;
pub mod error;
pub mod schema;

pub use crate::backup::recorder::ErrorRecorder;
pub use crate::backup::registry::BackupStorageRegistry;
pub use crate::backup::{
    BackupHandle, BackupStorage, FileReader, FileSizeHint, FileWriter, HandleMode, StorageParams,
};
pub use crate::binlog::{BinlogClient, BinlogClientRegistry, BinlogTransaction, KeyRange};
pub use crate::config::OpsConfig;
pub use crate::error::{OpsError, OpsErrorCode, ResourceType};
pub use crate::schema::pipeline::{run_schema_changes, PipelineState};
pub use crate::schema::{
    Controller, ControllerRegistry, Executor, SchemaChangeResult, ShardError, ShardSuccess,
};
