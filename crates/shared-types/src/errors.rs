//! # Error Types
//!
//! Errors shared across the ring crates.

use thiserror::Error;

/// Errors raised while parsing or validating primitive values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// Address text was not 20 bytes of hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Root identity text was not hex.
    #[error("invalid root identity: {0}")]
    InvalidRootIdentity(String),

    /// Amount text was not a decimal number with the allowed precision.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount was negative.
    #[error("amount must not be negative: {0}")]
    Negative(String),
}

/// Errors related to envelope verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Envelope version not supported.
    #[error("Unsupported version: received {received}, supported {supported}")]
    UnsupportedVersion { received: u16, supported: u16 },
}
