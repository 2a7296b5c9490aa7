//! Logging setup shared by the debug-harness binaries and test suites.
//!
//! Session transcripts are emitted as ordinary `tracing` events, so whatever
//! subscriber is installed here decides where they end up.

pub mod logging;
