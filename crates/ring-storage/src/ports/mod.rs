//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Port (Inbound)**: `RingApi`
//! - **Driven Ports (Outbound)**: `MessageRelay`, `RingObserver`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
