//! Integration tests for AMS backends
//!
//! End-to-end tests that drive backends the way the UI does: through the
//! manager or `dyn AmsBackend`, with printer status injected through the
//! mock Moonraker client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ams-tests
//! ```
//!
//! # Test Structure
//!
//! - `toolchanger_e2e_test.rs` - Tool changer lifecycle, commands and events
//! - `happy_hare_e2e_test.rs` - Happy Hare status parsing and commands
//! - `manager_e2e_test.rs` - Discovery, backend selection and teardown

// This crate only contains tests, no library code
