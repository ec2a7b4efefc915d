//! Shared plumbing for keyprov binaries.

pub mod logging;
