//! Source filters.
//!
//! A source filter decides whether an endpoint may serve data for a range.
//! Filters compose by conjunction: an endpoint is a valid source only if
//! every installed filter includes it.

use std::collections::HashSet;
use std::fmt::Debug;

use corelib::Endpoint;

/// Predicate over candidate source endpoints.
pub trait SourceFilter: Send + Sync + Debug {
    fn should_include(&self, endpoint: &Endpoint) -> bool;

    /// Filter name (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Excludes endpoints the failure detector reports down, plus any extra
/// endpoints the caller adds (such as the node being replaced).
#[derive(Debug, Clone, Default)]
pub struct FailureDetectorSourceFilter {
    excluded: HashSet<Endpoint>,
}

impl FailureDetectorSourceFilter {
    pub fn new(excluded: HashSet<Endpoint>) -> Self {
        Self { excluded }
    }

    pub fn excluded(&self) -> &HashSet<Endpoint> {
        &self.excluded
    }
}

impl SourceFilter for FailureDetectorSourceFilter {
    fn should_include(&self, endpoint: &Endpoint) -> bool {
        !self.excluded.contains(endpoint)
    }

    fn name(&self) -> &'static str {
        "failure_detector"
    }
}

/// Excludes the local node; a node never streams from itself.
#[derive(Debug, Clone, Copy)]
pub struct ExcludeLocalNodeFilter {
    local: Endpoint,
}

impl ExcludeLocalNodeFilter {
    pub fn new(local: Endpoint) -> Self {
        Self { local }
    }
}

impl SourceFilter for ExcludeLocalNodeFilter {
    fn should_include(&self, endpoint: &Endpoint) -> bool {
        *endpoint != self.local
    }

    fn name(&self) -> &'static str {
        "exclude_local_node"
    }
}
