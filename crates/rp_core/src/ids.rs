//! Newtypes and parsers for driver and report identifiers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Minimal error set for identifier parsing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdError {
    InvalidToken,
    InvalidId,
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdError::InvalidToken => write!(f, "invalid token (expected [A-Za-z0-9_.:-], len 1..=64)"),
            IdError::InvalidId => write!(f, "invalid id"),
        }
    }
}

impl std::error::Error for IdError {}

fn is_token(s: &str) -> bool {
    let len = s.len();
    if !(1..=64).contains(&len) { return false; }
    s.bytes().all(|b| matches!(b,
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' |
        b'_' | b'-' | b':' | b'.'
    ))
}

fn is_lower_hex_len(s: &str, n: usize) -> bool {
    s.len() == n && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

macro_rules! def_token {
    ($name:ident) => {
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_token(s) { Ok(Self(s.to_string())) } else { Err(IdError::InvalidToken) }
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;
            fn try_from(s: String) -> Result<Self, Self::Error> {
                if is_token(&s) { Ok(Self(s)) } else { Err(IdError::InvalidToken) }
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String { v.0 }
        }
    };
}

def_token!(DriverId);

/// "SIM:" + 64-hex (lowercase), derived from the canonical report body.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportId(String);

impl ReportId {
    pub fn as_str(&self) -> &str { &self.0 }

    /// Build from a lowercase 64-hex digest.
    pub fn from_digest_hex(hex64: &str) -> Result<Self, IdError> {
        if is_lower_hex_len(hex64, 64) {
            Ok(Self(format!("SIM:{hex64}")))
        } else {
            Err(IdError::InvalidId)
        }
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReportId {
    type Err = IdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix("SIM:").ok_or(IdError::InvalidId)?;
        if is_lower_hex_len(rest, 64) { Ok(Self(s.to_string())) } else { Err(IdError::InvalidId) }
    }
}

impl TryFrom<String> for ReportId {
    type Error = IdError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ReportId> for String {
    fn from(v: ReportId) -> String { v.0 }
}
