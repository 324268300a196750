//! Why a stream is being run.

use std::fmt;
use std::str::FromStr;

/// Reason attached to a streaming operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamReason {
    Bootstrap,
    Decommission,
    RemoveNode,
    Rebuild,
    Repair,
    Replace,
}

impl StreamReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamReason::Bootstrap => "bootstrap",
            StreamReason::Decommission => "decommission",
            StreamReason::RemoveNode => "removenode",
            StreamReason::Rebuild => "rebuild",
            StreamReason::Repair => "repair",
            StreamReason::Replace => "replace",
        }
    }
}

impl fmt::Display for StreamReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bootstrap" => Ok(StreamReason::Bootstrap),
            "decommission" => Ok(StreamReason::Decommission),
            "removenode" => Ok(StreamReason::RemoveNode),
            "rebuild" => Ok(StreamReason::Rebuild),
            "repair" => Ok(StreamReason::Repair),
            "replace" => Ok(StreamReason::Replace),
            other => Err(format!("unknown stream reason {:?}", other)),
        }
    }
}
