//! Core token trait definitions.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use rand::Rng;

/// Errors that can occur when parsing or manipulating tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Text that does not denote a token of this type
    #[error("unable to parse token from {0:?}")]
    Unparsable(String),
}

/// Token trait for the ring.
///
/// Tokens are immutable, comparable positions. Implementations must be
/// thread-safe and cheap to compare/hash. The text form is what operators
/// write in `initial_token`.
pub trait Token:
    Clone + Ord + Hash + Send + Sync + Debug + Display + FromStr<Err = TokenError> + 'static
{
    /// Draws a token uniformly from the token space.
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self;
}
