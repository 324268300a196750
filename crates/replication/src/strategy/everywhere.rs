//! Replication strategy that places a replica on every endpoint.

use corelib::{Endpoint, Murmur3Token, TokenMetadata};

use crate::strategy::ReplicationStrategy;

/// Every endpoint replicates every range.
#[derive(Debug, Clone, Default)]
pub struct EverywhereStrategy;

impl ReplicationStrategy for EverywhereStrategy {
    fn replication_factor(&self, ring: &TokenMetadata) -> usize {
        ring.endpoints().len()
    }

    fn natural_endpoints(&self, ring: &TokenMetadata, token: &Murmur3Token) -> Vec<Endpoint> {
        let mut replicas: Vec<Endpoint> = Vec::new();
        for (_, endpoint) in ring.ring_from(token) {
            if !replicas.contains(endpoint) {
                replicas.push(*endpoint);
            }
        }
        replicas
    }

    fn name(&self) -> &'static str {
        "EverywhereStrategy"
    }
}
