//! # Storage Ring Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (derivation, compaction, sweeps)
//! └── src/integration/  # Whole-ring scenarios over the in-memory relay
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ring-tests
//! cargo test -p ring-tests integration::ring_scenarios
//! cargo bench -p ring-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]
