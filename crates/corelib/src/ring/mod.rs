//! Ring snapshot and token ranges.
//!
//! The snapshot maps tokens to the endpoints that own them and provides
//! the clockwise walks replication strategies are built on.

pub mod range;
pub mod ring;

pub use range::TokenRange;
pub use ring::{RingBuilder, TokenMetadata};
