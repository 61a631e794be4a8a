//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete delivery substrate for the ring. Node activity is reported on the
//! shared event bus.

pub mod relay;

pub use relay::*;
