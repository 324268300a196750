//! Replication strategy abstractions.
//!
//! Replication strategies determine which endpoints replicate each token
//! range, and therefore which ranges move when ownership changes:
//!
//! - **SimpleStrategy**: N replicas placed sequentially around the ring
//! - **EverywhereStrategy**: every endpoint replicates every range

pub mod everywhere;
pub mod simple;

pub use everywhere::EverywhereStrategy;
pub use simple::SimpleStrategy;

use std::collections::BTreeSet;

use async_trait::async_trait;
use corelib::{Endpoint, Murmur3Token, TokenMetadata, TokenRange};
use tracing::debug;

use crate::error::ReplicationError;

/// Ranges examined between scheduler yields while computing pending ranges.
const YIELD_EVERY_RANGES: usize = 256;

/// Trait for replication strategies.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync). A keyspace hands out
/// its strategy as an `Arc`, and the handle may outlive the keyspace while a
/// pending-range computation is in flight.
#[async_trait]
pub trait ReplicationStrategy: Send + Sync + 'static {
    /// Number of replicas kept for each range on the given ring.
    fn replication_factor(&self, ring: &TokenMetadata) -> usize;

    /// Endpoints replicating the range that ends at or after `token`,
    /// primary first.
    fn natural_endpoints(&self, ring: &TokenMetadata, token: &Murmur3Token) -> Vec<Endpoint>;

    /// Strategy name (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Rejects configurations the strategy cannot place replicas for.
    fn validate(&self) -> Result<(), ReplicationError> {
        Ok(())
    }

    /// Every range `endpoint` replicates on `ring`, in ring order.
    fn address_ranges(&self, ring: &TokenMetadata, endpoint: &Endpoint) -> Vec<TokenRange> {
        ring.sorted_tokens()
            .iter()
            .filter(|token| self.natural_endpoints(ring, token).contains(endpoint))
            .filter_map(|token| ring.primary_range(token))
            .collect()
    }

    /// Ranges `endpoint` will replicate once it owns `tokens`.
    ///
    /// This is a long computation on large rings, so it yields to the
    /// scheduler periodically.
    async fn get_pending_address_ranges(
        &self,
        ring: &TokenMetadata,
        tokens: &BTreeSet<Murmur3Token>,
        endpoint: Endpoint,
    ) -> Result<Vec<TokenRange>, ReplicationError> {
        self.validate()?;
        if tokens.is_empty() {
            return Err(ReplicationError::NoPendingTokens(endpoint));
        }

        let pending = ring.with_tokens(tokens, endpoint);
        let mut ranges = Vec::new();
        for (idx, token) in pending.sorted_tokens().iter().enumerate() {
            if idx > 0 && idx % YIELD_EVERY_RANGES == 0 {
                tokio::task::yield_now().await;
            }
            if !self.natural_endpoints(&pending, token).contains(&endpoint) {
                continue;
            }
            if let Some(range) = pending.primary_range(token) {
                ranges.push(range);
            }
        }

        debug!(
            strategy = self.name(),
            %endpoint,
            ranges = ranges.len(),
            "computed pending ranges"
        );
        Ok(ranges)
    }
}
