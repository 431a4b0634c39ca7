//! # Chaincode Shim Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # Registry, credential and provenance flows in-process
//!     └── transport.rs   # The same flows over HTTP against the dev node
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p cc-tests
//! cargo test -p cc-tests integration::transport::
//! ```

pub mod integration;
