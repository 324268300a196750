//! Bootstrap orchestration.
//!
//! Drives one bootstrap or replace operation from start to finish:
//!
//! ```text
//! Init -> FilterBuilt -> PerKeyspace* -> AbortChecked -> Streaming -> Done
//!   \___________________________________________________________/-> Failed
//! ```
//!
//! Keyspaces are processed one at a time in catalog order. The abort source
//! is checked once, after every keyspace has been planned and before any
//! data moves. Nothing is retried or rolled back here; a failed bootstrap is
//! restarted from the beginning by the caller.

use std::sync::Arc;

use corelib::{MembershipView, TokenMetadata};
use replication::{Catalog, ReplicationStrategy};
use streaming::{
    FailureDetectorSourceFilter, RangePlan, RangePlanFactory, StreamReason, StreamSummary,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{BootstrapError, Result};
use crate::intent::BootstrapIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootstrapPhase {
    FilterBuilt,
    PerKeyspace,
    AbortChecked,
    Streaming,
}

/// Runs bootstrap and replace operations against one ring snapshot.
pub struct Bootstrapper<F> {
    catalog: Arc<Catalog>,
    ring: Arc<TokenMetadata>,
    abort: CancellationToken,
    plan_factory: F,
}

impl<F: RangePlanFactory> Bootstrapper<F> {
    pub fn new(
        catalog: Arc<Catalog>,
        ring: Arc<TokenMetadata>,
        abort: CancellationToken,
        plan_factory: F,
    ) -> Self {
        Self {
            catalog,
            ring,
            abort,
            plan_factory,
        }
    }

    /// Streams into `intent.address()` every range it will own.
    ///
    /// Fails with [`BootstrapError::InvalidReason`] before touching anything
    /// unless the intent is a bootstrap or a replace with a replace address.
    pub async fn bootstrap(
        &self,
        intent: &BootstrapIntent,
        membership: &dyn MembershipView,
    ) -> Result<StreamSummary> {
        let description = describe(intent)?;
        debug!(
            sorted_tokens = ?self.ring.sorted_tokens(),
            "beginning {} process",
            description.to_lowercase()
        );

        let mut keyspace = None;
        match self.run(intent, description, membership, &mut keyspace).await {
            Ok(summary) => {
                info!(
                    description,
                    address = %intent.address(),
                    ranges = summary.ranges,
                    bytes = summary.bytes,
                    "{} finished",
                    description.to_lowercase()
                );
                Ok(summary)
            }
            Err(err) => {
                metrics::counter!("bootstrap_failures_total").increment(1);
                warn!(
                    description,
                    address = %intent.address(),
                    keyspace = keyspace.as_deref().unwrap_or("-"),
                    ring_size = self.ring.token_count(),
                    error = %err,
                    "error during {}",
                    description.to_lowercase()
                );
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        intent: &BootstrapIntent,
        description: &str,
        membership: &dyn MembershipView,
        current_keyspace: &mut Option<String>,
    ) -> Result<StreamSummary> {
        let mut plan = self.plan_factory.create_plan(
            Arc::clone(&self.ring),
            intent.tokens().clone(),
            intent.address(),
            description,
            intent.reason(),
        );

        let mut nodes_to_filter = membership.unreachable_members();
        if let Some(replaced) = intent.replace_address().filter(|_| intent.is_replace()) {
            nodes_to_filter.insert(replaced);
        }
        debug!(nodes_to_filter = ?nodes_to_filter, phase = ?BootstrapPhase::FilterBuilt);
        plan.add_source_filter(Box::new(FailureDetectorSourceFilter::new(nodes_to_filter)));

        for keyspace_name in self.catalog.non_system_keyspaces() {
            // Only the strategy handle is held across the awaits below, and
            // the plan resolves replicas through it; the keyspace itself may
            // be dropped in the meantime.
            let Some(strategy) = self
                .catalog
                .get_keyspace(&keyspace_name)
                .map(|ks| ks.replication_strategy())
            else {
                debug!(keyspace = %keyspace_name, "keyspace was dropped while looping");
                continue;
            };
            *current_keyspace = Some(keyspace_name.clone());
            debug!(keyspace = %keyspace_name, strategy = strategy.name(), phase = ?BootstrapPhase::PerKeyspace);

            let ranges = strategy
                .get_pending_address_ranges(&self.ring, intent.tokens(), intent.address())
                .await?;
            debug!(keyspace = %keyspace_name, ranges = ?ranges, "will stream keyspace");

            plan.add_ranges(
                &keyspace_name,
                strategy,
                ranges,
                membership,
                intent.is_replace(),
            )
            .await?;
        }
        *current_keyspace = None;

        let cancelled = self.abort.is_cancelled();
        debug!(cancelled, phase = ?BootstrapPhase::AbortChecked);
        if cancelled {
            return Err(BootstrapError::Aborted);
        }

        debug!(phase = ?BootstrapPhase::Streaming);
        Ok(plan.stream_async().await?)
    }
}

/// Validates the intent and names the operation for logs and the plan.
fn describe(intent: &BootstrapIntent) -> Result<&'static str> {
    match intent.reason() {
        StreamReason::Bootstrap => Ok("Bootstrap"),
        StreamReason::Replace if intent.replace_address().is_some() => Ok("Replace"),
        StreamReason::Replace => Err(BootstrapError::InvalidReason(
            "replace requires the address of the node being replaced".to_string(),
        )),
        other => Err(BootstrapError::InvalidReason(format!(
            "{}: it can only be replace or bootstrap",
            other
        ))),
    }
}
