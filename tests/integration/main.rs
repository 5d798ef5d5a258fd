//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no real
//! hardware required:
//!
//! ```text
//! cargo test --no-default-features --test integration
//! ```

mod controller_tests;
mod mock_hw;
mod scheduler_tests;
mod supervisor_tests;
mod transducer_tests;
