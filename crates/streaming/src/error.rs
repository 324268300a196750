//! Error types for range planning and streaming.

use corelib::{Endpoint, TokenRange};

/// Errors that can occur while planning or executing a stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamingError {
    /// Every replica of the range was excluded by the source filters.
    #[error("unable to find sufficient sources for streaming range {range} in keyspace {keyspace}")]
    NoSources { keyspace: String, range: TokenRange },

    /// Consistent range movement requires one specific source, and it is
    /// down or filtered out.
    #[error(
        "a node required to move range {range} of keyspace {keyspace} consistently is unavailable ({endpoint})"
    )]
    SourceUnavailable {
        keyspace: String,
        range: TokenRange,
        endpoint: Endpoint,
    },

    /// Consistent range movement expects exactly one endpoint to lose the range.
    #[error("expected 1 endpoint losing range {range} of keyspace {keyspace} but found {found}")]
    AmbiguousSource {
        keyspace: String,
        range: TokenRange,
        found: usize,
    },

    /// The transport failed to fetch a range.
    #[error("failed to fetch {range} of keyspace {keyspace} from {endpoint}: {message}")]
    Transport {
        endpoint: Endpoint,
        keyspace: String,
        range: TokenRange,
        message: String,
    },
}
