//! Token assignment for a joining node.
//!
//! # Algorithm
//!
//! 1. If `initial_token` lists tokens, use exactly those (duplicates collapse
//!    silently), optionally refusing any token the ring already assigns.
//! 2. Otherwise pick `num_tokens` random tokens nobody owns yet.
//!
//! Assignment is synchronous and performs no I/O, so every error it raises
//! surfaces before any streaming starts.

use std::collections::BTreeSet;

use corelib::{Murmur3Token, Token, TokenMetadata};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::BootstrapConfig;
use crate::error::{BootstrapError, Result};

/// Random draws allowed per requested token before giving up.
///
/// The token space is 2^64 wide, so hitting this limit means the ring is
/// pathologically dense or the random source is broken.
pub const RANDOM_TOKEN_ATTEMPTS_PER_TOKEN: usize = 1024;

/// Whether operator-supplied tokens are checked against the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTokenEndpoint {
    Yes,
    No,
}

/// Picks the tokens a joining node will own.
pub fn bootstrap_tokens(
    ring: &TokenMetadata,
    config: &BootstrapConfig,
    check: CheckTokenEndpoint,
) -> Result<BTreeSet<Murmur3Token>> {
    let initial_tokens = parse_initial_tokens(config.initial_token())?;

    if !initial_tokens.is_empty() {
        debug!(tokens = ?initial_tokens, "tokens manually specified");
        if check == CheckTokenEndpoint::Yes {
            if let Some(token) = initial_tokens
                .iter()
                .find(|token| ring.get_endpoint(token).is_some())
            {
                return Err(BootstrapError::Collision { token: *token });
            }
        }
        info!(tokens = ?initial_tokens, "using manually specified bootstrap tokens");
        return Ok(initial_tokens);
    }

    let num_tokens = config.num_tokens();
    if num_tokens < 1 {
        return Err(BootstrapError::Config(format!(
            "num_tokens must be >= 1, got {}",
            num_tokens
        )));
    }
    if num_tokens == 1 {
        warn!(
            "picking random token for a single vnode; you should probably add more vnodes, \
             failing that, you should probably specify the token manually"
        );
    }

    let count = usize::try_from(num_tokens)
        .map_err(|_| BootstrapError::Config(format!("num_tokens {} is too large", num_tokens)))?;
    let tokens = random_tokens(ring, count)?;
    info!(tokens = ?tokens, "using random bootstrap tokens");
    Ok(tokens)
}

/// Splits and parses an `initial_token` value.
///
/// Fragments are separated by commas and/or whitespace; empty fragments are
/// dropped. Any fragment that is not a token fails the whole list.
pub fn parse_initial_tokens(text: &str) -> Result<BTreeSet<Murmur3Token>> {
    let fragments: BTreeSet<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|fragment| !fragment.is_empty())
        .collect();

    fragments
        .into_iter()
        .map(|fragment| {
            fragment.parse::<Murmur3Token>().map_err(|e| {
                BootstrapError::Config(format!("unable to parse initial_token={}: {}", text, e))
            })
        })
        .collect()
}

/// Draws `count` distinct random tokens that no endpoint in `ring` owns.
pub fn random_tokens(ring: &TokenMetadata, count: usize) -> Result<BTreeSet<Murmur3Token>> {
    random_tokens_with(ring, count, &mut rand::thread_rng())
}

/// [`random_tokens`] with an explicit random source.
pub fn random_tokens_with<R: Rng + ?Sized>(
    ring: &TokenMetadata,
    count: usize,
    rng: &mut R,
) -> Result<BTreeSet<Murmur3Token>> {
    let max_attempts = count.saturating_mul(RANDOM_TOKEN_ATTEMPTS_PER_TOKEN);
    let mut tokens = BTreeSet::new();
    let mut attempts = 0usize;

    while tokens.len() < count {
        if attempts == max_attempts {
            return Err(BootstrapError::TokenSpaceExhausted {
                requested: count,
                found: tokens.len(),
                attempts,
            });
        }
        attempts += 1;

        let token = Murmur3Token::random(rng);
        if ring.get_endpoint(&token).is_none() {
            tokens.insert(token);
        }
    }
    Ok(tokens)
}
