//! Token ranges on the ring.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::Murmur3Token;

/// A range of tokens `(start, end]`.
///
/// When `start >= end` the range wraps past the maximum token back to the
/// minimum; `start == end` covers the whole ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TokenRange {
    start: Murmur3Token,
    end: Murmur3Token,
}

impl TokenRange {
    pub fn new(start: Murmur3Token, end: Murmur3Token) -> Self {
        Self { start, end }
    }

    /// Exclusive lower bound.
    pub fn start(&self) -> Murmur3Token {
        self.start
    }

    /// Inclusive upper bound.
    pub fn end(&self) -> Murmur3Token {
        self.end
    }

    pub fn is_wrap_around(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, token: &Murmur3Token) -> bool {
        if self.is_wrap_around() {
            *token > self.start || *token <= self.end
        } else {
            *token > self.start && *token <= self.end
        }
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{}]", self.start, self.end)
    }
}
