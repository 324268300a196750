//! Node join: token assignment and bootstrap orchestration.
//!
//! A joining node first picks its tokens ([`bootstrap_tokens`]), either
//! from the operator's `initial_token` list or at random. The
//! [`Bootstrapper`] then computes, keyspace by keyspace, which ranges the
//! node must receive and streams them in.
//!
//! Persisting and gossiping the chosen tokens is left to the caller.

pub mod bootstrapper;
pub mod config;
pub mod error;
pub mod intent;
pub mod tokens;

pub use bootstrapper::Bootstrapper;
pub use config::BootstrapConfig;
pub use error::{BootstrapError, Result};
pub use intent::BootstrapIntent;
pub use tokens::{bootstrap_tokens, random_tokens, CheckTokenEndpoint};
