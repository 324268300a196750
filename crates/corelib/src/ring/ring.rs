//! Ring snapshot: token ownership at a point in time.
//!
//! A `TokenMetadata` is never mutated once it has been shared. Callers that
//! need the ring as it would look after a node joins derive a new snapshot
//! with [`TokenMetadata::with_tokens`].

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::node::Endpoint;
use crate::ring::range::TokenRange;
use crate::token::Murmur3Token;

/// Read-only mapping of token to owning endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMetadata {
    tokens: BTreeMap<Murmur3Token, Endpoint>,
}

impl TokenMetadata {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// All tokens in ring order.
    pub fn sorted_tokens(&self) -> Vec<Murmur3Token> {
        self.tokens.keys().copied().collect()
    }

    /// The endpoint owning exactly `token`, if any.
    pub fn get_endpoint(&self, token: &Murmur3Token) -> Option<Endpoint> {
        self.tokens.get(token).copied()
    }

    /// Tokens owned by `endpoint`, in ring order.
    pub fn tokens_of(&self, endpoint: &Endpoint) -> Vec<Murmur3Token> {
        self.tokens
            .iter()
            .filter(|(_, owner)| *owner == endpoint)
            .map(|(token, _)| *token)
            .collect()
    }

    /// Every endpoint that owns at least one token.
    pub fn endpoints(&self) -> BTreeSet<Endpoint> {
        self.tokens.values().copied().collect()
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Walks the ring clockwise starting at the first token `>= token`,
    /// visiting every token exactly once.
    pub fn ring_from(
        &self,
        token: &Murmur3Token,
    ) -> impl Iterator<Item = (&Murmur3Token, &Endpoint)> + '_ {
        let token = *token;
        self.tokens.range(token..).chain(self.tokens.range(..token))
    }

    /// The token immediately counter-clockwise of `token`, wrapping.
    pub fn predecessor(&self, token: &Murmur3Token) -> Option<Murmur3Token> {
        self.tokens
            .range(..*token)
            .next_back()
            .or_else(|| self.tokens.iter().next_back())
            .map(|(t, _)| *t)
    }

    /// The range whose primary owner is the owner of `token`.
    pub fn primary_range(&self, token: &Murmur3Token) -> Option<TokenRange> {
        let start = self.predecessor(token)?;
        Some(TokenRange::new(start, *token))
    }

    /// Records `endpoint` as owner of `token`, rejecting a token that
    /// another endpoint already owns.
    pub fn insert(&mut self, token: Murmur3Token, endpoint: Endpoint) -> Result<()> {
        match self.tokens.get(&token) {
            Some(owner) if *owner != endpoint => Err(Error::TokenOwned {
                token,
                owner: *owner,
            }),
            _ => {
                self.tokens.insert(token, endpoint);
                Ok(())
            }
        }
    }

    /// Returns a copy of this ring in which `endpoint` owns `tokens`.
    ///
    /// Tokens already owned by another endpoint change hands, which is how
    /// a replacing node takes over the ranges of the node it replaces.
    pub fn with_tokens<'a>(
        &self,
        tokens: impl IntoIterator<Item = &'a Murmur3Token>,
        endpoint: Endpoint,
    ) -> TokenMetadata {
        let mut next = self.clone();
        for token in tokens {
            if let Some(previous) = next.tokens.insert(*token, endpoint) {
                if previous != endpoint {
                    debug!(%token, from = %previous, to = %endpoint, "token changes owner");
                }
            }
        }
        next
    }
}

/// Builder for ring snapshots.
#[derive(Debug, Default)]
pub struct RingBuilder {
    entries: Vec<(Endpoint, Vec<Murmur3Token>)>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tokens` owned by `endpoint`.
    pub fn add_tokens(
        mut self,
        endpoint: Endpoint,
        tokens: impl IntoIterator<Item = Murmur3Token>,
    ) -> Self {
        self.entries.push((endpoint, tokens.into_iter().collect()));
        self
    }

    /// Builds the snapshot, failing if two endpoints claim the same token.
    pub fn build(self) -> Result<TokenMetadata> {
        let mut ring = TokenMetadata::new();
        for (endpoint, tokens) in self.entries {
            for token in tokens {
                ring.insert(token, endpoint)?;
            }
        }
        Ok(ring)
    }
}
