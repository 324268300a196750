//! Murmur3 token implementation (Cassandra-compatible token space).

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::token::traits::{Token, TokenError};

/// Murmur3 token using the full signed 64-bit space.
///
/// `i64::MIN` is the minimum token and marks the start of the ring.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Murmur3Token(pub i64);

impl Token for Murmur3Token {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Murmur3Token(rng.gen::<i64>())
    }
}

impl FromStr for Murmur3Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Murmur3Token)
            .map_err(|_| TokenError::Unparsable(s.to_string()))
    }
}

impl fmt::Display for Murmur3Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Tokens are written as strings so that JSON consumers do not lose
// precision on values outside the 53-bit integer range.
impl Serialize for Murmur3Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Murmur3Token {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
