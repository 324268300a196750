//! Range streamer: the concrete range plan.
//!
//! For every range a joining node must receive, the streamer picks one
//! source among the range's current replicas, then fetches everything
//! through a [`StreamTransport`].
//!
//! # Source selection
//!
//! - **Consistent range movement** (bootstrap only, when the endpoint count
//!   differs from the replication factor): if the range already has a full
//!   replica set, the source must be the single endpoint that stops
//!   replicating it once the new node owns its tokens. A range with fewer
//!   replicas than the replication factor loses none, so its first current
//!   replica is used. Either way the chosen source must be alive and pass
//!   every filter, or the plan fails.
//! - **Otherwise**: the first current replica, in ring order, that passes
//!   every source filter.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use corelib::{Endpoint, MembershipView, Murmur3Token, TokenMetadata, TokenRange};
use futures_util::future::try_join_all;
use replication::ReplicationStrategy;
use tracing::{debug, info, warn};

use crate::error::StreamingError;
use crate::filter::{ExcludeLocalNodeFilter, SourceFilter};
use crate::plan::{RangePlan, RangePlanFactory, StreamSummary};
use crate::reason::StreamReason;
use crate::transport::StreamTransport;

/// Ranges to fetch for one keyspace, grouped by source.
type FetchMap = BTreeMap<Endpoint, Vec<TokenRange>>;

/// Plans and streams the ranges a joining or replacing node must receive.
pub struct RangeStreamer {
    transport: Arc<dyn StreamTransport>,
    ring: Arc<TokenMetadata>,
    tokens: BTreeSet<Murmur3Token>,
    address: Endpoint,
    description: String,
    reason: StreamReason,
    consistent_range_movement: bool,
    source_filters: Vec<Box<dyn SourceFilter>>,
    to_fetch: Vec<(String, FetchMap)>,
}

impl std::fmt::Debug for RangeStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeStreamer")
            .field("address", &self.address)
            .field("description", &self.description)
            .field("reason", &self.reason)
            .field("consistent_range_movement", &self.consistent_range_movement)
            .finish_non_exhaustive()
    }
}

impl RangeStreamer {
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        ring: Arc<TokenMetadata>,
        tokens: BTreeSet<Murmur3Token>,
        address: Endpoint,
        description: impl Into<String>,
        reason: StreamReason,
        consistent_range_movement: bool,
    ) -> Self {
        Self {
            transport,
            ring,
            tokens,
            address,
            description: description.into(),
            reason,
            consistent_range_movement,
            source_filters: vec![Box::new(ExcludeLocalNodeFilter::new(address))],
            to_fetch: Vec::new(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn reason(&self) -> StreamReason {
        self.reason
    }

    /// Keyspaces planned so far, in the order they were added.
    pub fn planned_keyspaces(&self) -> Vec<&str> {
        self.to_fetch.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Ranges planned for `keyspace`, grouped by source.
    pub fn fetch_map(&self, keyspace: &str) -> Option<&FetchMap> {
        self.to_fetch
            .iter()
            .find(|(name, _)| name == keyspace)
            .map(|(_, fetch)| fetch)
    }

    fn passes_filters(&self, endpoint: &Endpoint) -> bool {
        self.source_filters
            .iter()
            .all(|filter| filter.should_include(endpoint))
    }

    fn use_strict_sources(&self, replication_factor: usize, is_replace: bool) -> bool {
        self.consistent_range_movement
            && !is_replace
            && self.ring.endpoints().len() != replication_factor
    }

    fn strict_source(
        &self,
        keyspace: &str,
        range: &TokenRange,
        current: &[Endpoint],
        pending: &[Endpoint],
        replication_factor: usize,
        membership: &dyn MembershipView,
    ) -> Result<Endpoint, StreamingError> {
        let source = if current.len() == replication_factor {
            let losing: Vec<Endpoint> = current
                .iter()
                .filter(|endpoint| !pending.contains(endpoint))
                .copied()
                .collect();
            let [source] = *losing.as_slice() else {
                return Err(StreamingError::AmbiguousSource {
                    keyspace: keyspace.to_string(),
                    range: *range,
                    found: losing.len(),
                });
            };
            source
        } else {
            // Replica set not full yet: nobody gives the range up.
            let Some(&first) = current.first() else {
                return Err(StreamingError::NoSources {
                    keyspace: keyspace.to_string(),
                    range: *range,
                });
            };
            first
        };
        if !membership.is_alive(&source) || !self.passes_filters(&source) {
            return Err(StreamingError::SourceUnavailable {
                keyspace: keyspace.to_string(),
                range: *range,
                endpoint: source,
            });
        }
        Ok(source)
    }
}

#[async_trait]
impl RangePlan for RangeStreamer {
    fn add_source_filter(&mut self, filter: Box<dyn SourceFilter>) {
        debug!(description = %self.description, filter = filter.name(), "added source filter");
        self.source_filters.push(filter);
    }

    async fn add_ranges(
        &mut self,
        keyspace: &str,
        strategy: Arc<dyn ReplicationStrategy>,
        ranges: Vec<TokenRange>,
        membership: &dyn MembershipView,
        is_replace: bool,
    ) -> Result<(), StreamingError> {
        let replication_factor = strategy.replication_factor(&self.ring);
        let pending_ring = self
            .use_strict_sources(replication_factor, is_replace)
            .then(|| self.ring.with_tokens(&self.tokens, self.address));

        let mut fetch = FetchMap::new();
        let mut planned = 0usize;
        for range in &ranges {
            let current = strategy.natural_endpoints(&self.ring, &range.end());
            if current.is_empty() {
                warn!(keyspace, %range, "no current replicas for range, nothing to stream");
                continue;
            }

            let source = match &pending_ring {
                Some(pending) => {
                    let future = strategy.natural_endpoints(pending, &range.end());
                    self.strict_source(
                        keyspace,
                        range,
                        &current,
                        &future,
                        replication_factor,
                        membership,
                    )?
                }
                None => current
                    .iter()
                    .copied()
                    .find(|endpoint| self.passes_filters(endpoint))
                    .ok_or_else(|| StreamingError::NoSources {
                        keyspace: keyspace.to_string(),
                        range: *range,
                    })?,
            };

            debug!(keyspace, %range, %source, "planned range");
            fetch.entry(source).or_default().push(*range);
            planned += 1;
        }

        metrics::counter!("bootstrap_ranges_planned_total").increment(planned as u64);
        info!(
            description = %self.description,
            keyspace,
            ranges = planned,
            sources = fetch.len(),
            strict = pending_ring.is_some(),
            "planned keyspace"
        );
        self.to_fetch.push((keyspace.to_string(), fetch));
        Ok(())
    }

    async fn stream_async(&mut self) -> Result<StreamSummary, StreamingError> {
        let plan = std::mem::take(&mut self.to_fetch);
        let mut summary = StreamSummary::default();
        info!(
            description = %self.description,
            reason = %self.reason,
            keyspaces = plan.len(),
            "starting streaming"
        );

        for (keyspace, sources) in plan {
            if sources.is_empty() {
                continue;
            }

            let fetches = sources.into_iter().map(|(source, ranges)| {
                let transport = Arc::clone(&self.transport);
                let keyspace = keyspace.clone();
                async move {
                    let mut bytes = 0u64;
                    for range in &ranges {
                        let data = transport.fetch_range(source, &keyspace, range).await?;
                        bytes += data.len() as u64;
                    }
                    debug!(keyspace = %keyspace, %source, ranges = ranges.len(), bytes, "fetched from source");
                    Ok::<_, StreamingError>((ranges.len(), bytes))
                }
            });

            let (ranges, bytes) = try_join_all(fetches)
                .await?
                .into_iter()
                .fold((0usize, 0u64), |(r, b), (ranges, bytes)| (r + ranges, b + bytes));

            metrics::counter!("bootstrap_ranges_streamed_total").increment(ranges as u64);
            metrics::counter!("bootstrap_bytes_streamed_total").increment(bytes);
            info!(keyspace = %keyspace, ranges, bytes, "streamed keyspace");

            summary.keyspaces += 1;
            summary.ranges += ranges;
            summary.bytes += bytes;
        }

        info!(
            description = %self.description,
            keyspaces = summary.keyspaces,
            ranges = summary.ranges,
            bytes = summary.bytes,
            "streaming complete"
        );
        Ok(summary)
    }
}

/// Builds [`RangeStreamer`]s over a shared transport.
pub struct RangeStreamerFactory {
    transport: Arc<dyn StreamTransport>,
    consistent_range_movement: bool,
}

impl RangeStreamerFactory {
    pub fn new(transport: Arc<dyn StreamTransport>, consistent_range_movement: bool) -> Self {
        Self {
            transport,
            consistent_range_movement,
        }
    }
}

impl RangePlanFactory for RangeStreamerFactory {
    fn create_plan(
        &self,
        ring: Arc<TokenMetadata>,
        tokens: BTreeSet<Murmur3Token>,
        address: Endpoint,
        description: &str,
        reason: StreamReason,
    ) -> Box<dyn RangePlan> {
        Box::new(RangeStreamer::new(
            Arc::clone(&self.transport),
            ring,
            tokens,
            address,
            description,
            reason,
            self.consistent_range_movement,
        ))
    }
}
