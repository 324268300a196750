//! Core library for the token ring.
//!
//! This crate provides the fundamental abstractions shared by the rest of
//! the workspace:
//! - Token types and their text form
//! - Endpoints (node addresses)
//! - The read-only ring snapshot (`TokenMetadata`) and token ranges
//! - The membership view consumed by bootstrap and streaming

pub mod error;
pub mod membership;
pub mod node;
pub mod ring;
pub mod token;

pub use error::{Error, Result};
pub use membership::{MembershipView, StaticMembership};
pub use node::Endpoint;
pub use ring::{RingBuilder, TokenMetadata, TokenRange};
pub use token::{Murmur3Token, Token, TokenError};
