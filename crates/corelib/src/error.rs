//! Error types for the core library.

use crate::node::Endpoint;
use crate::token::{Murmur3Token, TokenError};

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid token value
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    /// Invalid endpoint address
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// A token is already owned by another endpoint
    #[error("token {token} is already owned by {owner}")]
    TokenOwned {
        token: Murmur3Token,
        owner: Endpoint,
    },
}
