//! Binlog streaming client seam.
//!
//! Backup and resharding pipelines consume replication data through a
//! [`BinlogClient`] picked by name from a [`BinlogClientRegistry`], the
//! same selection pattern as backup storage. Only the interface lives
//! here; the wire protocol and transaction encoding belong to the client
//! implementations, and the payload stays opaque bytes in this crate.

use async_trait::async_trait;
use crate::config::OpsConfig;
use crate::error::{OpsError, ResourceType};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::info;

/// Half-open key range, start inclusive, end exclusive. Empty `end` means
/// unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

/// One replication transaction as delivered by a client. The payload
/// encoding is the client's concern; `position` is the opaque marker the
/// transaction brings the stream to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinlogTransaction {
    pub position: String,
    pub payload: Vec<u8>,
}

/// Pull side of an open stream. Cancellation is per call: dropping the
/// `next_transaction` future abandons that pull only, and dropping the
/// stream itself tears the stream down.
#[async_trait]
pub trait BinlogTransactionStream: Send {
    /// Next transaction, or `None` once the server ends the stream.
    async fn next_transaction(&mut self) -> Result<Option<BinlogTransaction>, OpsError>;
}

pub type BinlogStream = Box<dyn BinlogTransactionStream>;

/// A connection to one replication source.
#[async_trait]
pub trait BinlogClient: Send + Sync {
    async fn dial(&mut self, endpoint: &str) -> Result<(), OpsError>;

    async fn close(&mut self);

    /// Streams transactions touching any of `tables`, from `position`.
    async fn stream_tables(
        &self,
        position: &str,
        tables: &[String],
    ) -> Result<BinlogStream, OpsError>;

    /// Streams transactions for rows inside `key_range`, from `position`.
    async fn stream_key_range(
        &self,
        position: &str,
        key_range: &KeyRange,
    ) -> Result<BinlogStream, OpsError>;
}

/// Builds a fresh, undialed client per resolution.
pub type BinlogClientFactory = Box<dyn Fn() -> Box<dyn BinlogClient> + Send + Sync>;

/// Name-keyed binlog client factories, write-once per name. The active
/// protocol is picked by [`OpsConfig::binlog_client_protocol`], resolved
/// lazily at first use.
#[derive(Default)]
pub struct BinlogClientRegistry {
    factories: RwLock<HashMap<String, BinlogClientFactory>>,
}

impl BinlogClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        factory: BinlogClientFactory,
    ) -> Result<(), OpsError> {
        let name = name.into();
        let mut factories = self.factories.write();
        if factories.contains_key(&name) {
            return Err(OpsError::AlreadyExists {
                resource_type: ResourceType::BinlogProtocol,
                resource_id: name,
            });
        }
        info!(protocol = %name, "registered binlog client protocol");
        factories.insert(name, factory);
        Ok(())
    }

    /// Creates a new client of the configured protocol. Each resolution is
    /// a fresh client; dialing is the caller's job.
    pub fn resolve(&self, config: &OpsConfig) -> Result<Box<dyn BinlogClient>, OpsError> {
        let selected = &config.binlog_client_protocol;
        if selected.is_empty() {
            return Err(OpsError::InvalidConfig {
                message: "no binlog client protocol configured".into(),
            });
        }
        let factories = self.factories.read();
        let factory = factories.get(selected).ok_or_else(|| {
            let mut names = factories.keys().cloned().collect::<Vec<_>>();
            names.sort();
            OpsError::InvalidConfig {
                message: format!(
                    "unknown binlog client protocol '{selected}', registered: [{}]",
                    names.join(", ")
                ),
            }
        })?;
        Ok(factory())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BinlogClient, BinlogClientRegistry, BinlogStream, BinlogTransaction,
        BinlogTransactionStream, KeyRange,
    };
    use crate::config::OpsConfig;
    use crate::error::{OpsError, OpsErrorCode};
    use async_trait::async_trait;

    struct ScriptedStream {
        transactions: Vec<BinlogTransaction>,
    }

    #[async_trait]
    impl BinlogTransactionStream for ScriptedStream {
        async fn next_transaction(&mut self) -> Result<Option<BinlogTransaction>, OpsError> {
            if self.transactions.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.transactions.remove(0)))
            }
        }
    }

    #[derive(Default)]
    struct ScriptedClient {
        dialed: Option<String>,
    }

    #[async_trait]
    impl BinlogClient for ScriptedClient {
        async fn dial(&mut self, endpoint: &str) -> Result<(), OpsError> {
            self.dialed = Some(endpoint.to_string());
            Ok(())
        }

        async fn close(&mut self) {
            self.dialed = None;
        }

        async fn stream_tables(
            &self,
            position: &str,
            tables: &[String],
        ) -> Result<BinlogStream, OpsError> {
            Ok(Box::new(ScriptedStream {
                transactions: vec![BinlogTransaction {
                    position: format!("{position}+1"),
                    payload: tables.join(",").into_bytes(),
                }],
            }))
        }

        async fn stream_key_range(
            &self,
            position: &str,
            _key_range: &KeyRange,
        ) -> Result<BinlogStream, OpsError> {
            Ok(Box::new(ScriptedStream {
                transactions: vec![BinlogTransaction {
                    position: format!("{position}+1"),
                    payload: Vec::new(),
                }],
            }))
        }
    }

    fn scripted_factory() -> super::BinlogClientFactory {
        Box::new(|| Box::new(ScriptedClient::default()) as Box<dyn BinlogClient>)
    }

    #[test]
    fn duplicate_protocol_registration_is_fatal() {
        let registry = BinlogClientRegistry::new();
        registry
            .register("fake", scripted_factory())
            .expect("first registration");
        let err = registry
            .register("fake", scripted_factory())
            .expect_err("duplicate must fail");
        assert_eq!(err.code(), OpsErrorCode::BinlogProtocolAlreadyExists);
    }

    #[test]
    fn resolve_rejects_unregistered_protocol() {
        let registry = BinlogClientRegistry::new();
        let config = OpsConfig::default(); // selects "grpc", never registered
        let err = registry.resolve(&config).err().expect("unregistered");
        assert_eq!(err.code(), OpsErrorCode::InvalidConfig);
        assert!(format!("{err}").contains("'grpc'"));
    }

    #[tokio::test]
    async fn resolved_client_streams_until_end() {
        let registry = BinlogClientRegistry::new();
        registry
            .register("fake", scripted_factory())
            .expect("register");
        let config = OpsConfig::default().with_binlog_protocol("fake");
        let mut client = registry.resolve(&config).expect("resolve");
        client.dial("tablet-0001").await.expect("dial");

        let tables = vec!["users".to_string(), "orders".to_string()];
        let mut stream = client
            .stream_tables("MariaDB/0-1-7", &tables)
            .await
            .expect("stream");
        let tx = stream
            .next_transaction()
            .await
            .expect("pull")
            .expect("one transaction");
        assert_eq!(tx.position, "MariaDB/0-1-7+1");
        assert_eq!(tx.payload, b"users,orders");
        assert!(stream.next_transaction().await.expect("pull").is_none());
        client.close().await;
    }
}
