//! Simple replication strategy.
//!
//! Places N replicas sequentially around the ring (clockwise from the
//! primary). Works well for single data center deployments.
//!
//! # Algorithm
//!
//! 1. Find the first ring token at or after the requested token (wrapping)
//! 2. Continue clockwise collecting distinct endpoints
//! 3. Stop at N endpoints or when the ring is exhausted
//!
//! # Performance
//!
//! - **Time**: O(t) worst case where t = tokens, usually O(r * vnodes)
//! - **Space**: O(r)

use corelib::{Endpoint, Murmur3Token, TokenMetadata};

use crate::error::ReplicationError;
use crate::strategy::ReplicationStrategy;

/// Simple replication strategy: N replicas placed sequentially around the ring.
#[derive(Debug, Clone)]
pub struct SimpleStrategy {
    /// Number of replicas to create (including primary).
    replication_factor: usize,
}

impl SimpleStrategy {
    /// Create a new simple strategy with the given replication factor.
    ///
    /// A factor of 0 is accepted here and rejected by
    /// [`ReplicationStrategy::validate`] when ranges are computed.
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }
}

impl Default for SimpleStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ReplicationStrategy for SimpleStrategy {
    fn replication_factor(&self, _ring: &TokenMetadata) -> usize {
        self.replication_factor
    }

    fn natural_endpoints(&self, ring: &TokenMetadata, token: &Murmur3Token) -> Vec<Endpoint> {
        let mut replicas = Vec::with_capacity(self.replication_factor);
        if self.replication_factor == 0 {
            return replicas;
        }

        for (_, endpoint) in ring.ring_from(token) {
            if replicas.contains(endpoint) {
                continue;
            }
            replicas.push(*endpoint);
            if replicas.len() == self.replication_factor {
                break;
            }
        }
        replicas
    }

    fn name(&self) -> &'static str {
        "SimpleStrategy"
    }

    fn validate(&self) -> Result<(), ReplicationError> {
        if self.replication_factor == 0 {
            return Err(ReplicationError::InvalidReplicationFactor {
                strategy: self.name(),
                factor: self.replication_factor,
            });
        }
        Ok(())
    }
}
