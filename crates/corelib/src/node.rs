//! Endpoint identity for ring members.
//!
//! An endpoint is the address a node is reachable at. It is the owner
//! recorded against every token in the ring and the unit the failure
//! detector reports on.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Address of a node participating in the ring.
///
/// Newtype over `IpAddr` so comparisons and hashing stay cheap and the type
/// cannot be confused with client-facing socket addresses.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Endpoint(pub IpAddr);

impl Endpoint {
    pub fn new(addr: impl Into<IpAddr>) -> Self {
        Self(addr.into())
    }

    pub fn addr(&self) -> IpAddr {
        self.0
    }
}

impl From<IpAddr> for Endpoint {
    fn from(addr: IpAddr) -> Self {
        Self(addr)
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<IpAddr>()
            .map(Endpoint)
            .map_err(|_| Error::InvalidEndpoint(s.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
