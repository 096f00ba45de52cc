//! Fixed-point currency amounts
//!
//! Every amount crossing a boundary is an integer count of the smallest
//! currency unit. Decimal ether strings only exist at the input/display edge.

use crate::error::{ChaincareError, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ETHER_DECIMALS: usize = 18;
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug)]
pub struct Wei(u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn as_u128(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Wei) -> Option<Wei> {
        self.0.checked_add(other.0).map(Wei)
    }

    pub fn checked_mul(self, factor: u64) -> Option<Wei> {
        self.0.checked_mul(factor as u128).map(Wei)
    }

    /// Parse a decimal ether string such as `"1.5"` or `"100"`.
    pub fn from_ether_str(input: &str) -> Result<Self> {
        let invalid = |reason: &str| ChaincareError::InvalidAmount {
            reason: format!("{reason}: {input:?}"),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty amount"));
        }

        let (whole, fraction) = match trimmed.split_once('.') {
            Some((w, f)) => (w, f),
            None => (trimmed, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected an unsigned decimal"));
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected an unsigned decimal"));
        }
        if fraction.len() > ETHER_DECIMALS {
            return Err(invalid("more than 18 fractional digits"));
        }

        let whole: u128 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let mut fraction_wei: u128 = 0;
        if !fraction.is_empty() {
            let padded = format!("{fraction:0<width$}", width = ETHER_DECIMALS);
            fraction_wei = padded.parse().map_err(|_| invalid("malformed fraction"))?;
        }

        whole
            .checked_mul(WEI_PER_ETHER)
            .and_then(|w| w.checked_add(fraction_wei))
            .map(Wei)
            .ok_or_else(|| invalid("amount too large"))
    }

    /// Render as a decimal ether string without trailing zeros.
    pub fn to_ether_string(&self) -> String {
        let whole = self.0 / WEI_PER_ETHER;
        let fraction = self.0 % WEI_PER_ETHER;
        if fraction == 0 {
            return whole.to_string();
        }
        let digits = format!("{fraction:0width$}", width = ETHER_DECIMALS);
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Wei(value as u128)
    }
}

impl From<u128> for Wei {
    fn from(value: u128) -> Self {
        Wei(value)
    }
}

impl FromStr for Wei {
    type Err = ChaincareError;

    /// Parses a base-unit integer string.
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u128>()
            .map(Wei)
            .map_err(|_| ChaincareError::InvalidAmount {
                reason: format!("expected an integer number of wei: {s:?}"),
            })
    }
}

impl fmt::Display for Wei {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct WeiVisitor;

impl<'de> Visitor<'de> for WeiVisitor {
    type Value = Wei;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an unsigned integer or an integer string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Wei, E> {
        Ok(Wei::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> std::result::Result<Wei, E> {
        Ok(Wei(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Wei, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(WeiVisitor)
    }
}
