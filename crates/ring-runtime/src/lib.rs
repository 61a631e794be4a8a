//! # Ring Runtime Library
//!
//! Operator tooling around a storage ring. The `main.rs` binary wires these
//! together; they are exposed here for tests.
//!
//! - `config` - environment configuration
//! - `driver` - owner-side sweep driver
//! - `report` - before/after comparisons for Clean and Destroy sweeps

#![warn(missing_docs)]

pub mod config;
pub mod driver;
pub mod report;

pub use config::{ConfigError, RuntimeConfig};
pub use driver::{DriverError, ItemClean, RingDriver};
pub use report::{CleanReport, DestroyReport};
