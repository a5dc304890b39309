//! # wsecho-core
//!
//! Shared building blocks for the wsecho server.
//!
//! - [`logging`]: `tracing` subscriber setup (compact or JSON, stderr)
//! - [`pretty`]: best-effort decode and indented rendering of JSON payloads

#![deny(unsafe_code)]

pub mod logging;
pub mod pretty;

pub use logging::{LogFormat, init_subscriber};
