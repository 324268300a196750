//! Error types for token assignment and bootstrap.

use corelib::Murmur3Token;
use replication::ReplicationError;
use streaming::StreamingError;

/// Result type alias for the bootstrap crate.
pub type Result<T> = std::result::Result<T, BootstrapError>;

/// Errors that can occur while assigning tokens or bootstrapping.
///
/// `InvalidReason`, `Config` and `Collision` are raised before any I/O.
/// Streaming and replication failures are passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    /// The operation was asked to run for something other than bootstrap
    /// or replace.
    #[error("wrong stream reason provided: {0}")]
    InvalidReason(String),

    /// Malformed or out-of-range token configuration.
    #[error("{0}")]
    Config(String),

    /// A requested token is already owned by a ring member.
    #[error(
        "bootstrapping to existing token {token} is not allowed (decommission/removenode the old node first)"
    )]
    Collision { token: Murmur3Token },

    /// Random generation kept drawing tokens that were already taken.
    #[error("found only {found} of {requested} free tokens after {attempts} random draws")]
    TokenSpaceExhausted {
        requested: usize,
        found: usize,
        attempts: usize,
    },

    /// The abort source fired before streaming started.
    #[error("bootstrap aborted")]
    Aborted,

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error(transparent)]
    Replication(#[from] ReplicationError),
}
