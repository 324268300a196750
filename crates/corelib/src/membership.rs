//! Membership view consumed from the failure detector.
//!
//! Gossip itself lives outside this workspace. Bootstrap and streaming only
//! need to know which endpoints are currently considered down.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::node::Endpoint;

/// Read-only view over cluster liveness.
pub trait MembershipView: Send + Sync {
    /// Endpoints the failure detector currently reports as unreachable.
    fn unreachable_members(&self) -> HashSet<Endpoint>;

    /// True unless the endpoint is reported unreachable.
    fn is_alive(&self, endpoint: &Endpoint) -> bool {
        !self.unreachable_members().contains(endpoint)
    }
}

/// Membership view backed by an explicit set of down endpoints.
///
/// Useful when the caller already holds a liveness snapshot, and in tests.
#[derive(Debug, Default)]
pub struct StaticMembership {
    down: RwLock<HashSet<Endpoint>>,
}

impl StaticMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_down(down: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            down: RwLock::new(down.into_iter().collect()),
        }
    }

    pub fn mark_down(&self, endpoint: Endpoint) {
        self.down.write().insert(endpoint);
    }

    pub fn mark_up(&self, endpoint: &Endpoint) {
        self.down.write().remove(endpoint);
    }
}

impl MembershipView for StaticMembership {
    fn unreachable_members(&self) -> HashSet<Endpoint> {
        self.down.read().clone()
    }

    fn is_alive(&self, endpoint: &Endpoint) -> bool {
        !self.down.read().contains(endpoint)
    }
}
