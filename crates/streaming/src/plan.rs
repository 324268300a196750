//! The range plan contract.
//!
//! Bootstrap drives a plan through three calls: install source filters,
//! add the ranges of each keyspace, then stream. The plan is created through
//! a factory so that the orchestrator can be exercised against spies.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use corelib::{Endpoint, MembershipView, Murmur3Token, TokenMetadata, TokenRange};
use replication::ReplicationStrategy;

use crate::error::StreamingError;
use crate::filter::SourceFilter;
use crate::reason::StreamReason;

/// Totals reported once a plan has been streamed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Keyspaces that had at least one range planned.
    pub keyspaces: usize,
    pub ranges: usize,
    pub bytes: u64,
}

/// A per-operation plan of ranges to fetch, and its execution.
#[async_trait]
pub trait RangePlan: Send {
    /// Adds a source filter. Filters apply to ranges added afterwards.
    fn add_source_filter(&mut self, filter: Box<dyn SourceFilter>);

    /// Plans `ranges` of `keyspace`, choosing a source for each.
    ///
    /// Replicas are resolved through `strategy`, the same handle the ranges
    /// were computed with, so a keyspace dropped from the catalog after its
    /// ranges were computed is still planned consistently.
    async fn add_ranges(
        &mut self,
        keyspace: &str,
        strategy: Arc<dyn ReplicationStrategy>,
        ranges: Vec<TokenRange>,
        membership: &dyn MembershipView,
        is_replace: bool,
    ) -> Result<(), StreamingError>;

    /// Fetches every planned range.
    async fn stream_async(&mut self) -> Result<StreamSummary, StreamingError>;
}

/// Creates the range plan for one bootstrap or replace operation.
pub trait RangePlanFactory: Send + Sync {
    fn create_plan(
        &self,
        ring: Arc<TokenMetadata>,
        tokens: BTreeSet<Murmur3Token>,
        address: Endpoint,
        description: &str,
        reason: StreamReason,
    ) -> Box<dyn RangePlan>;
}
