//! Tests for bootstrap orchestration.
//!
//! # Test Strategy
//!
//! 1. **Validation**: rejected intents never create a range plan
//! 2. **Source filters**: unreachable and replaced endpoints are excluded
//! 3. **Catalog races**: keyspaces dropped while the loop runs
//! 4. **Cancellation and failures**: abort before streaming, errors pass through
//! 5. **End to end**: real streamer over the in-memory transport

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use bootstrap::{
    bootstrap_tokens, BootstrapConfig, BootstrapError, BootstrapIntent, Bootstrapper,
    CheckTokenEndpoint,
};
use corelib::{
    Endpoint, MembershipView, Murmur3Token, RingBuilder, StaticMembership, TokenMetadata,
    TokenRange,
};
use parking_lot::Mutex;
use replication::{Catalog, EverywhereStrategy, ReplicationError, ReplicationStrategy, SimpleStrategy};
use streaming::{
    MemoryTransport, RangePlan, RangePlanFactory, RangeStreamerFactory, SourceFilter,
    StreamReason, StreamSummary, StreamingError,
};
use tokio_util::sync::CancellationToken;

fn ep(last: u8) -> Endpoint {
    format!("10.0.0.{}", last).parse().unwrap()
}

fn t(value: i64) -> Murmur3Token {
    Murmur3Token(value)
}

fn tokens(values: &[i64]) -> BTreeSet<Murmur3Token> {
    values.iter().copied().map(Murmur3Token).collect()
}

/// Three endpoints with one token each: 100 -> .1, 200 -> .2, 300 -> .3.
fn ring() -> Arc<TokenMetadata> {
    Arc::new(
        RingBuilder::new()
            .add_tokens(ep(1), [t(100)])
            .add_tokens(ep(2), [t(200)])
            .add_tokens(ep(3), [t(300)])
            .build()
            .unwrap(),
    )
}

// ============================================================================
// Collaborator spies
// ============================================================================

#[derive(Default)]
struct SpyLog {
    plans_created: usize,
    filters: Vec<Box<dyn SourceFilter>>,
    added: Vec<(String, usize, bool)>,
    strategies: Vec<&'static str>,
    streamed: usize,
}

#[derive(Clone, Default)]
struct SpyFactory {
    log: Arc<Mutex<SpyLog>>,
}

struct SpyPlan {
    log: Arc<Mutex<SpyLog>>,
}

impl RangePlanFactory for SpyFactory {
    fn create_plan(
        &self,
        _ring: Arc<TokenMetadata>,
        _tokens: BTreeSet<Murmur3Token>,
        _address: Endpoint,
        _description: &str,
        _reason: StreamReason,
    ) -> Box<dyn RangePlan> {
        self.log.lock().plans_created += 1;
        Box::new(SpyPlan {
            log: Arc::clone(&self.log),
        })
    }
}

#[async_trait]
impl RangePlan for SpyPlan {
    fn add_source_filter(&mut self, filter: Box<dyn SourceFilter>) {
        self.log.lock().filters.push(filter);
    }

    async fn add_ranges(
        &mut self,
        keyspace: &str,
        strategy: Arc<dyn ReplicationStrategy>,
        ranges: Vec<TokenRange>,
        _membership: &dyn MembershipView,
        is_replace: bool,
    ) -> Result<(), StreamingError> {
        let mut log = self.log.lock();
        log.added.push((keyspace.to_string(), ranges.len(), is_replace));
        log.strategies.push(strategy.name());
        Ok(())
    }

    async fn stream_async(&mut self) -> Result<StreamSummary, StreamingError> {
        self.log.lock().streamed += 1;
        Ok(StreamSummary::default())
    }
}

/// Drops a keyspace from the catalog in the middle of its own range
/// computation, then finishes the computation as `SimpleStrategy` would.
struct DroppingStrategy {
    inner: SimpleStrategy,
    catalog: Weak<Catalog>,
    victim: String,
    completed: Arc<AtomicUsize>,
}

#[async_trait]
impl ReplicationStrategy for DroppingStrategy {
    fn replication_factor(&self, ring: &TokenMetadata) -> usize {
        self.inner.replication_factor(ring)
    }

    fn natural_endpoints(&self, ring: &TokenMetadata, token: &Murmur3Token) -> Vec<Endpoint> {
        self.inner.natural_endpoints(ring, token)
    }

    fn name(&self) -> &'static str {
        "DroppingStrategy"
    }

    async fn get_pending_address_ranges(
        &self,
        ring: &TokenMetadata,
        tokens: &BTreeSet<Murmur3Token>,
        endpoint: Endpoint,
    ) -> Result<Vec<TokenRange>, ReplicationError> {
        if let Some(catalog) = self.catalog.upgrade() {
            let _ = catalog.drop_keyspace(&self.victim);
        }
        tokio::task::yield_now().await;
        let ranges = self
            .inner
            .get_pending_address_ranges(ring, tokens, endpoint)
            .await?;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(ranges)
    }
}

fn dropping(catalog: &Arc<Catalog>, victim: &str, rf: usize) -> (Arc<DroppingStrategy>, Arc<AtomicUsize>) {
    let completed = Arc::new(AtomicUsize::new(0));
    let strategy = Arc::new(DroppingStrategy {
        inner: SimpleStrategy::new(rf),
        catalog: Arc::downgrade(catalog),
        victim: victim.to_string(),
        completed: Arc::clone(&completed),
    });
    (strategy, completed)
}

fn spy_bootstrapper(catalog: Arc<Catalog>, abort: CancellationToken) -> (Bootstrapper<SpyFactory>, SpyFactory) {
    let factory = SpyFactory::default();
    let bootstrapper = Bootstrapper::new(catalog, ring(), abort, factory.clone());
    (bootstrapper, factory)
}

// ============================================================================
// Validation Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_reason_creates_no_plan() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("ks", Arc::new(SimpleStrategy::new(2))).unwrap();
    let (bootstrapper, spy) = spy_bootstrapper(catalog, CancellationToken::new());

    let intent = BootstrapIntent::new(StreamReason::Rebuild, ep(4), tokens(&[250]));
    let err = bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::InvalidReason(msg) if msg.contains("rebuild")));
    let log = spy.log.lock();
    assert_eq!(log.plans_created, 0, "No plan may exist for a rejected intent");
    assert!(log.filters.is_empty());
    assert!(log.added.is_empty());
    assert_eq!(log.streamed, 0);
}

#[tokio::test]
async fn test_replace_without_address_rejected() {
    let (bootstrapper, spy) = spy_bootstrapper(Arc::new(Catalog::new()), CancellationToken::new());

    let intent = BootstrapIntent::new(StreamReason::Replace, ep(4), tokens(&[300]));
    let err = bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap_err();

    assert!(matches!(err, BootstrapError::InvalidReason(_)));
    assert_eq!(spy.log.lock().plans_created, 0);
}

// ============================================================================
// Source Filter Tests
// ============================================================================

#[tokio::test]
async fn test_replace_excludes_replaced_node_and_unreachable() {
    let (bootstrapper, spy) = spy_bootstrapper(Arc::new(Catalog::new()), CancellationToken::new());
    let membership = StaticMembership::with_down([ep(2)]);

    // .3 is reachable but is the node being replaced.
    let intent = BootstrapIntent::replace(ep(4), ep(3), tokens(&[300]));
    bootstrapper.bootstrap(&intent, &membership).await.unwrap();

    let log = spy.log.lock();
    assert_eq!(log.plans_created, 1);
    assert_eq!(log.filters.len(), 1);
    let filter = &log.filters[0];
    assert!(!filter.should_include(&ep(3)), "Replaced node is never a source");
    assert!(!filter.should_include(&ep(2)), "Unreachable node is never a source");
    assert!(filter.should_include(&ep(1)));
    assert_eq!(log.streamed, 1);
}

#[tokio::test]
async fn test_bootstrap_only_excludes_unreachable() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("ks", Arc::new(SimpleStrategy::new(2))).unwrap();
    let (bootstrapper, spy) = spy_bootstrapper(catalog, CancellationToken::new());
    let membership = StaticMembership::with_down([ep(1)]);

    let intent = BootstrapIntent::bootstrap(ep(4), tokens(&[250]));
    bootstrapper.bootstrap(&intent, &membership).await.unwrap();

    let log = spy.log.lock();
    assert!(!log.filters[0].should_include(&ep(1)));
    assert!(log.filters[0].should_include(&ep(3)));
    assert_eq!(log.added, vec![("ks".to_string(), 2, false)]);
}

// ============================================================================
// Catalog Race Tests
// ============================================================================

#[tokio::test]
async fn test_keyspace_dropped_mid_loop_is_skipped() {
    let catalog = Arc::new(Catalog::new());
    let (strategy, _) = dropping(&catalog, "b", 2);
    catalog.create_keyspace("a", strategy).unwrap();
    catalog.create_keyspace("b", Arc::new(SimpleStrategy::new(2))).unwrap();
    catalog.create_keyspace("c", Arc::new(SimpleStrategy::new(1))).unwrap();
    let (bootstrapper, spy) = spy_bootstrapper(Arc::clone(&catalog), CancellationToken::new());

    let intent = BootstrapIntent::bootstrap(ep(4), tokens(&[250]));
    bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap();

    let log = spy.log.lock();
    let keyspaces: Vec<&str> = log.added.iter().map(|(name, _, _)| name.as_str()).collect();
    assert_eq!(keyspaces, vec!["a", "c"]);
    assert_eq!(log.streamed, 1, "Remaining keyspaces are still streamed");
}

#[tokio::test]
async fn test_strategy_survives_its_own_keyspace_drop() {
    let catalog = Arc::new(Catalog::new());
    let (strategy, completed) = dropping(&catalog, "a", 2);
    catalog.create_keyspace("a", strategy).unwrap();
    let (bootstrapper, spy) = spy_bootstrapper(Arc::clone(&catalog), CancellationToken::new());

    let intent = BootstrapIntent::bootstrap(ep(4), tokens(&[250]));
    bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap();

    assert!(!catalog.has_keyspace("a"));
    assert_eq!(completed.load(Ordering::SeqCst), 1, "Computation ran to completion");
    let log = spy.log.lock();
    assert_eq!(log.added, vec![("a".to_string(), 2, false)]);
    assert_eq!(log.strategies, vec!["DroppingStrategy"], "Plan gets the held handle");
}

#[tokio::test]
async fn test_system_keyspaces_not_streamed() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_system_keyspace("system", Arc::new(EverywhereStrategy)).unwrap();
    catalog.create_keyspace("ks", Arc::new(SimpleStrategy::new(1))).unwrap();
    let (bootstrapper, spy) = spy_bootstrapper(catalog, CancellationToken::new());

    let intent = BootstrapIntent::bootstrap(ep(4), tokens(&[250]));
    bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap();

    assert_eq!(spy.log.lock().added, vec![("ks".to_string(), 1, false)]);
}

// ============================================================================
// Cancellation and Failure Tests
// ============================================================================

#[tokio::test]
async fn test_abort_prevents_streaming() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("ks", Arc::new(SimpleStrategy::new(2))).unwrap();
    let abort = CancellationToken::new();
    let (bootstrapper, spy) = spy_bootstrapper(catalog, abort.clone());
    abort.cancel();

    let intent = BootstrapIntent::bootstrap(ep(4), tokens(&[250]));
    let err = bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap_err();

    assert_eq!(err, BootstrapError::Aborted);
    let log = spy.log.lock();
    assert_eq!(log.added.len(), 1, "Ranges are planned before the abort check");
    assert_eq!(log.streamed, 0, "stream_async must never run after an abort");
}

#[tokio::test]
async fn test_strategy_failure_propagates_unchanged() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("broken", Arc::new(SimpleStrategy::new(0))).unwrap();
    let (bootstrapper, spy) = spy_bootstrapper(catalog, CancellationToken::new());

    let intent = BootstrapIntent::bootstrap(ep(4), tokens(&[250]));
    let err = bootstrapper
        .bootstrap(&intent, &StaticMembership::new())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BootstrapError::Replication(ReplicationError::InvalidReplicationFactor {
            strategy: "SimpleStrategy",
            factor: 0,
        })
    );
    assert_eq!(spy.log.lock().streamed, 0);
}

// ============================================================================
// End-to-End Tests
// ============================================================================

fn real_bootstrapper(
    catalog: Arc<Catalog>,
    transport: Arc<MemoryTransport>,
    config: &BootstrapConfig,
) -> Bootstrapper<RangeStreamerFactory> {
    real_bootstrapper_on(catalog, ring(), transport, config)
}

fn real_bootstrapper_on(
    catalog: Arc<Catalog>,
    ring: Arc<TokenMetadata>,
    transport: Arc<MemoryTransport>,
    config: &BootstrapConfig,
) -> Bootstrapper<RangeStreamerFactory> {
    let factory = RangeStreamerFactory::new(transport, config.consistent_range_movement);
    Bootstrapper::new(catalog, ring, CancellationToken::new(), factory)
}

#[tokio::test]
async fn test_bootstrap_streams_every_keyspace() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("a", Arc::new(SimpleStrategy::new(2))).unwrap();
    catalog.create_keyspace("b", Arc::new(SimpleStrategy::new(1))).unwrap();
    catalog.create_system_keyspace("system", Arc::new(EverywhereStrategy)).unwrap();

    let transport = Arc::new(MemoryTransport::new());
    transport.insert_row(ep(3), "a", t(150), &b"x"[..]);
    transport.insert_row(ep(1), "a", t(240), &b"yy"[..]);
    transport.insert_row(ep(3), "b", t(240), &b"zzz"[..]);

    let config = BootstrapConfig::default().with_initial_token("250");
    let chosen = bootstrap_tokens(&ring(), &config, CheckTokenEndpoint::Yes).unwrap();
    let bootstrapper = real_bootstrapper(Arc::clone(&catalog), Arc::clone(&transport), &config);

    let summary = bootstrapper
        .bootstrap(&BootstrapIntent::bootstrap(ep(4), chosen), &StaticMembership::new())
        .await
        .unwrap();

    assert_eq!(summary.keyspaces, 2);
    assert_eq!(summary.ranges, 3);
    assert_eq!(summary.bytes, 6);
    assert!(transport.requests().iter().all(|req| req.source != ep(4)));
    assert!(transport.requests().iter().all(|req| req.keyspace != "system"));
}

#[tokio::test]
async fn test_bootstrap_with_dropped_keyspace_streams_the_rest() {
    let catalog = Arc::new(Catalog::new());
    let (strategy, _) = dropping(&catalog, "b", 2);
    catalog.create_keyspace("a", strategy).unwrap();
    catalog.create_keyspace("b", Arc::new(SimpleStrategy::new(2))).unwrap();

    let transport = Arc::new(MemoryTransport::new());
    transport.insert_row(ep(3), "a", t(150), &b"x"[..]);
    transport.insert_row(ep(3), "b", t(150), &b"lost"[..]);

    let config = BootstrapConfig::default();
    let bootstrapper = real_bootstrapper(Arc::clone(&catalog), Arc::clone(&transport), &config);

    let summary = bootstrapper
        .bootstrap(
            &BootstrapIntent::bootstrap(ep(4), tokens(&[250])),
            &StaticMembership::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.keyspaces, 1);
    assert_eq!(summary.bytes, 1);
    assert!(transport.requests().iter().all(|req| req.keyspace == "a"));
}

#[tokio::test]
async fn test_bootstrap_streams_keyspace_dropped_during_its_computation() {
    let catalog = Arc::new(Catalog::new());
    let (strategy, _) = dropping(&catalog, "a", 2);
    catalog.create_keyspace("a", strategy).unwrap();

    let transport = Arc::new(MemoryTransport::new());
    transport.insert_row(ep(3), "a", t(150), &b"x"[..]);

    let config = BootstrapConfig::default();
    let bootstrapper = real_bootstrapper(Arc::clone(&catalog), Arc::clone(&transport), &config);

    let summary = bootstrapper
        .bootstrap(
            &BootstrapIntent::bootstrap(ep(4), tokens(&[250])),
            &StaticMembership::new(),
        )
        .await
        .unwrap();

    assert!(!catalog.has_keyspace("a"));
    assert_eq!(summary.keyspaces, 1);
    assert_eq!(summary.ranges, 2);
    assert_eq!(summary.bytes, 1);
}

#[tokio::test]
async fn test_bootstrap_grows_ring_smaller_than_replication_factor() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("ks", Arc::new(SimpleStrategy::default())).unwrap();
    let small_ring = Arc::new(
        RingBuilder::new()
            .add_tokens(ep(1), [t(100)])
            .add_tokens(ep(2), [t(200)])
            .build()
            .unwrap(),
    );

    let transport = Arc::new(MemoryTransport::new());
    transport.insert_row(ep(1), "ks", t(50), &b"a"[..]);
    transport.insert_row(ep(2), "ks", t(120), &b"bb"[..]);
    transport.insert_row(ep(2), "ks", t(180), &b"ccc"[..]);

    let config = BootstrapConfig::default();
    assert!(config.consistent_range_movement);
    let bootstrapper =
        real_bootstrapper_on(catalog, small_ring, Arc::clone(&transport), &config);

    let summary = bootstrapper
        .bootstrap(
            &BootstrapIntent::bootstrap(ep(3), tokens(&[150])),
            &StaticMembership::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.keyspaces, 1);
    assert_eq!(summary.ranges, 3);
    assert_eq!(summary.bytes, 6);
    assert!(transport.requests().iter().all(|req| req.source != ep(3)));
}

#[tokio::test]
async fn test_streaming_failure_propagates_unchanged() {
    let catalog = Arc::new(Catalog::new());
    catalog.create_keyspace("a", Arc::new(SimpleStrategy::new(2))).unwrap();
    let transport = Arc::new(MemoryTransport::new());
    transport.fail_source(ep(1));

    let config = BootstrapConfig::default();
    let bootstrapper = real_bootstrapper(catalog, transport, &config);

    let err = bootstrapper
        .bootstrap(
            &BootstrapIntent::bootstrap(ep(4), tokens(&[250])),
            &StaticMembership::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BootstrapError::Streaming(StreamingError::Transport { endpoint, .. }) if endpoint == ep(1)
    ));
}

#[tokio::test]
async fn test_random_tokens_on_empty_ring() {
    let config = BootstrapConfig::default().with_num_tokens(4);
    let chosen = bootstrap_tokens(&TokenMetadata::new(), &config, CheckTokenEndpoint::Yes).unwrap();
    assert_eq!(chosen.len(), 4);
}
