//! # Shared Types Crate
//!
//! Value types used across the storage ring crates, plus the `RingEnvelope<T>`
//! wrapper carried by every hop.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: addresses and amounts are defined once here.
//! - **Envelope Authority**: the envelope's `sender` is the only identity a
//!   receiving node trusts. Payloads never repeat it.

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::*;
pub use envelope::RingEnvelope;
pub use errors::*;
