//! Error types for replication and catalog operations.

use corelib::Endpoint;

/// Errors raised by replication strategies and the keyspace catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationError {
    /// The strategy is configured with a replication factor it cannot honour.
    #[error("{strategy} cannot use replication factor {factor}")]
    InvalidReplicationFactor {
        strategy: &'static str,
        factor: usize,
    },

    /// Pending ranges were requested for an endpoint with no tokens.
    #[error("no tokens given for pending endpoint {0}")]
    NoPendingTokens(Endpoint),

    /// A keyspace with this name already exists.
    #[error("keyspace {0} already exists")]
    KeyspaceExists(String),

    /// The keyspace is not in the catalog.
    #[error("keyspace {0} does not exist")]
    NoSuchKeyspace(String),
}
