//! Replication strategies and the keyspace catalog.
//!
//! This crate provides:
//! - Pluggable replication strategies that decide which endpoints replicate
//!   which token ranges, and which ranges a joining node must receive
//! - The catalog of keyspaces, each holding a shared handle to its strategy

pub mod catalog;
pub mod error;
pub mod strategy;

pub use catalog::{Catalog, Keyspace};
pub use error::ReplicationError;
pub use strategy::{EverywhereStrategy, ReplicationStrategy, SimpleStrategy};
