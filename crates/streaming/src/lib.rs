//! Range streaming for bootstrap and replace.
//!
//! This crate provides the streaming side of a node join:
//! - Source filters deciding which endpoints may serve data
//! - The range plan: per keyspace, which ranges to fetch from which source
//! - Execution of the plan over a pluggable transport

pub mod error;
pub mod filter;
pub mod plan;
pub mod reason;
pub mod streamer;
pub mod transport;

pub use error::StreamingError;
pub use filter::{ExcludeLocalNodeFilter, FailureDetectorSourceFilter, SourceFilter};
pub use plan::{RangePlan, RangePlanFactory, StreamSummary};
pub use reason::StreamReason;
pub use streamer::{RangeStreamer, RangeStreamerFactory};
pub use transport::{FetchRequest, MemoryTransport, StreamTransport};
