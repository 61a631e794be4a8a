//! # Domain Layer (Inner Hexagon)
//!
//! Pure ring logic: address derivation, node state, authorization and the
//! per-message transition rules. No I/O, no async.

pub mod controller;
pub mod entities;
pub mod fees;
pub mod gate;
pub mod invariants;
pub mod payload;
pub mod services;
pub mod value_objects;

pub use controller::*;
pub use entities::*;
pub use fees::*;
pub use gate::*;
pub use invariants::*;
pub use payload::*;
pub use services::*;
pub use value_objects::*;
