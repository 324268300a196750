//! What a bootstrap operation is asked to do.

use std::collections::BTreeSet;

use corelib::{Endpoint, Murmur3Token};
use streaming::StreamReason;

/// An immutable request to bring a node into the ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapIntent {
    reason: StreamReason,
    address: Endpoint,
    replace_address: Option<Endpoint>,
    tokens: BTreeSet<Murmur3Token>,
}

impl BootstrapIntent {
    /// An intent for any stream reason. Only bootstrap and replace are
    /// accepted when the intent is run.
    pub fn new(reason: StreamReason, address: Endpoint, tokens: BTreeSet<Murmur3Token>) -> Self {
        Self {
            reason,
            address,
            replace_address: None,
            tokens,
        }
    }

    /// A brand-new node joining with `tokens`.
    pub fn bootstrap(address: Endpoint, tokens: BTreeSet<Murmur3Token>) -> Self {
        Self::new(StreamReason::Bootstrap, address, tokens)
    }

    /// A new node at `address` taking over the ownership of `replaced`.
    pub fn replace(
        address: Endpoint,
        replaced: Endpoint,
        tokens: BTreeSet<Murmur3Token>,
    ) -> Self {
        Self::new(StreamReason::Replace, address, tokens).with_replace_address(replaced)
    }

    pub fn with_replace_address(mut self, replaced: Endpoint) -> Self {
        self.replace_address = Some(replaced);
        self
    }

    pub fn reason(&self) -> StreamReason {
        self.reason
    }

    /// The joining node.
    pub fn address(&self) -> Endpoint {
        self.address
    }

    pub fn replace_address(&self) -> Option<Endpoint> {
        self.replace_address
    }

    /// Tokens the joining node will own.
    pub fn tokens(&self) -> &BTreeSet<Murmur3Token> {
        &self.tokens
    }

    pub fn is_replace(&self) -> bool {
        self.reason == StreamReason::Replace
    }
}
