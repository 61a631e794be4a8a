//! # Core Value Types
//!
//! - `Address`: 20-byte identifier used for owners and ring nodes alike
//! - `Coins`: value attached to a message, in nano-units
//! - `RootIdentity`: opaque key material anchoring a ring
//! - `Opcode`: the three ring-wide operations and their wire tags

use crate::errors::ValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ADDRESS (20 bytes)
// =============================================================================

/// A 20-byte address.
///
/// Owners (principals) and ring nodes share this representation, so a node
/// forwarding to its successor is indistinguishable on the wire from an
/// operator sending to the root.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 20] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Parses a hex address, with or without the `0x` prefix.
    pub fn from_hex(src: &str) -> Result<Self, ValueError> {
        let trimmed = src.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let raw = hex::decode(digits).map_err(|_| ValueError::InvalidAddress(src.to_string()))?;
        Self::from_slice(&raw).ok_or_else(|| ValueError::InvalidAddress(src.to_string()))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}...{}", hex::encode(&self.0[..4]), hex::encode(&self.0[18..]))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

// =============================================================================
// ROOT IDENTITY
// =============================================================================

/// Opaque key material identifying one ring instance.
///
/// Two rings with the same owner but different root identities never share
/// a node address.
#[derive(Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RootIdentity(pub Vec<u8>);

impl RootIdentity {
    /// Wraps raw key material.
    #[must_use]
    pub fn new(material: impl Into<Vec<u8>>) -> Self {
        Self(material.into())
    }

    /// Parses hex key material.
    pub fn from_hex(src: &str) -> Result<Self, ValueError> {
        let trimmed = src.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex::decode(digits)
            .map(Self)
            .map_err(|_| ValueError::InvalidRootIdentity(src.to_string()))
    }

    /// Returns the key material.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for RootIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootIdentity(0x{})", hex::encode(&self.0))
    }
}

// =============================================================================
// COINS
// =============================================================================

/// Number of decimal places between a whole coin and a nano-unit.
pub const COIN_DECIMALS: u32 = 9;

/// An amount of value in nano-units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coins(pub u64);

impl Coins {
    /// Zero value.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from nano-units.
    #[must_use]
    pub const fn from_nano(nano: u64) -> Self {
        Self(nano)
    }

    /// Returns the amount in nano-units.
    #[must_use]
    pub const fn as_nano(&self) -> u64 {
        self.0
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtracts `other`, or returns None if it would go negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Adds `other`, saturating at the maximum amount.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parses a decimal amount such as `"10"`, `"0.05"` or `".5"` into
    /// units with `decimals` fractional digits.
    ///
    /// Leading `-` signs toggle the sign; a negative result is rejected since
    /// amounts are unsigned.
    pub fn parse_decimal(src: &str, decimals: u32) -> Result<Self, ValueError> {
        let invalid = || ValueError::InvalidAmount(src.to_string());

        let mut rest = src.trim();
        let mut negative = false;
        while let Some(stripped) = rest.strip_prefix('-') {
            negative = !negative;
            rest = stripped;
        }

        if rest == "." {
            return Err(invalid());
        }
        let mut parts = rest.split('.');
        let whole = parts.next().unwrap_or_default();
        let frac = parts.next().unwrap_or_default();
        if parts.next().is_some() {
            return Err(invalid());
        }

        let whole = if whole.is_empty() { "0" } else { whole };
        let frac = if frac.is_empty() { "0" } else { frac };
        if frac.len() > decimals as usize && decimals != 0 {
            return Err(invalid());
        }

        let multiplier = 10u64.checked_pow(decimals).ok_or_else(invalid)?;
        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        let frac: u64 = if decimals == 0 {
            0
        } else {
            padded.parse().map_err(|_| invalid())?
        };

        let units = whole
            .checked_mul(multiplier)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(invalid)?;

        if negative && units != 0 {
            return Err(ValueError::Negative(src.to_string()));
        }
        Ok(Self(units))
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10u64.pow(COIN_DECIMALS);
        let whole = self.0 / scale;
        let frac = self.0 % scale;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let frac = format!("{frac:0width$}", width = COIN_DECIMALS as usize);
        write!(f, "{whole}.{}", frac.trim_end_matches('0'))
    }
}

// =============================================================================
// OPCODE
// =============================================================================

/// Ring-wide lifecycle operation carried by a control message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// Materialize nodes.
    Init,
    /// Compact node payloads.
    Clean,
    /// Dematerialize nodes.
    Destroy,
}

impl Opcode {
    /// Numeric wire tag.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::Init => 42,
            Self::Clean => 24,
            Self::Destroy => 3210,
        }
    }

    /// Looks up an opcode by its wire tag.
    #[must_use]
    pub const fn from_tag(tag: u32) -> Option<Self> {
        match tag {
            42 => Some(Self::Init),
            24 => Some(Self::Clean),
            3210 => Some(Self::Destroy),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Clean => "clean",
            Self::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

// =============================================================================
// TESTS
// =============================================================================
