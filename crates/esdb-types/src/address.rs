use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// An unsigned symbol address inside a segment.
///
/// Addresses are the merge key for symbols: two symbols in matched segments
/// that share an `Address` are considered candidates for the same symbol.
/// The textual radix is irrelevant to the value; `Display` always renders
/// `0x`-prefixed lowercase hexadecimal.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Address(u64);

impl Address {
    /// Create an address from its raw value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw numeric value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Decimal rendering, for writers that opt out of hexadecimal output.
    pub fn to_decimal(self) -> String {
        self.0.to_string()
    }

    /// Parse an address written in any supported radix.
    ///
    /// Accepts `0x`/`0X` hexadecimal, `0o` octal, `0b` binary and plain
    /// decimal. Underscore digit separators are ignored.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let trimmed = s.trim();
        let cleaned: String = trimmed.chars().filter(|c| *c != '_').collect();

        let (digits, radix) = if let Some(rest) = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
        {
            (rest, 16)
        } else if let Some(rest) = cleaned.strip_prefix("0o") {
            (rest, 8)
        } else if let Some(rest) = cleaned.strip_prefix("0b") {
            (rest, 2)
        } else {
            (cleaned.as_str(), 10)
        };

        if digits.is_empty() {
            return Err(TypeError::InvalidAddress {
                input: s.to_string(),
                reason: "no digits".into(),
            });
        }

        // from_str_radix tolerates a leading '+', which is not an address.
        if digits.starts_with('+') {
            return Err(TypeError::InvalidAddress {
                input: s.to_string(),
                reason: "unexpected sign".into(),
            });
        }

        u64::from_str_radix(digits, radix)
            .map(Self)
            .map_err(|e| TypeError::InvalidAddress {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Address> for u64 {
    fn from(addr: Address) -> Self {
        addr.0
    }
}
