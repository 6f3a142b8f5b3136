//! scribed: a long-form transcription job server with speaker attribution.
//!
//! Media files come in over HTTP, wait in a FIFO queue, and are processed
//! one at a time by a single background worker against models loaded once
//! at startup. Finished transcripts leave through a completion callback or
//! the poll endpoint.

pub mod cli;
pub mod config;
pub mod defaults;
pub mod delivery;
pub mod diagnostics;
pub mod error;
pub mod gateway;
pub mod server;
pub mod task;
pub mod transcript;
pub mod worker;

pub use error::{Result, ScribedError};

/// Version string for startup logging.
pub fn version_string() -> String {
    format!("scribed {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_includes_package_version() {
        assert!(version_string().starts_with("scribed "));
        assert!(version_string().contains(env!("CARGO_PKG_VERSION")));
    }
}
