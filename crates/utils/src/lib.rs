//! Helpers shared by the sidecar-terminator binaries.

pub mod logging;
pub mod version;
