//! Transport seam for fetching range data.
//!
//! The wire protocol is not part of this workspace. `MemoryTransport` serves
//! rows held in memory, which is enough to run a complete bootstrap inside a
//! single process.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use corelib::{Endpoint, Murmur3Token, TokenRange};
use parking_lot::{Mutex, RwLock};

use crate::error::StreamingError;

/// Fetches the data of one token range from one source endpoint.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn fetch_range(
        &self,
        source: Endpoint,
        keyspace: &str,
        range: &TokenRange,
    ) -> Result<Bytes, StreamingError>;
}

/// A fetch issued through a [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub source: Endpoint,
    pub keyspace: String,
    pub range: TokenRange,
}

type RowKey = (Endpoint, String);

/// In-memory transport: each endpoint holds rows keyed by token.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    rows: RwLock<BTreeMap<RowKey, BTreeMap<Murmur3Token, Bytes>>>,
    failing: RwLock<HashSet<Endpoint>>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a row on `endpoint`.
    pub fn insert_row(
        &self,
        endpoint: Endpoint,
        keyspace: &str,
        token: Murmur3Token,
        data: impl Into<Bytes>,
    ) {
        self.rows
            .write()
            .entry((endpoint, keyspace.to_string()))
            .or_default()
            .insert(token, data.into());
    }

    /// Makes every later fetch from `endpoint` fail.
    pub fn fail_source(&self, endpoint: Endpoint) {
        self.failing.write().insert(endpoint);
    }

    /// Fetches issued so far, in issue order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl StreamTransport for MemoryTransport {
    async fn fetch_range(
        &self,
        source: Endpoint,
        keyspace: &str,
        range: &TokenRange,
    ) -> Result<Bytes, StreamingError> {
        self.requests.lock().push(FetchRequest {
            source,
            keyspace: keyspace.to_string(),
            range: *range,
        });

        if self.failing.read().contains(&source) {
            return Err(StreamingError::Transport {
                endpoint: source,
                keyspace: keyspace.to_string(),
                range: *range,
                message: "connection refused".to_string(),
            });
        }

        let rows = self.rows.read();
        let mut out = BytesMut::new();
        if let Some(held) = rows.get(&(source, keyspace.to_string())) {
            for (_, data) in held.iter().filter(|(token, _)| range.contains(token)) {
                out.extend_from_slice(data);
            }
        }
        Ok(out.freeze())
    }
}
