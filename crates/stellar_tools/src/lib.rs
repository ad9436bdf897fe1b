//! # Stellar Development Tools
//!
//! Command-line tools for catalog authors:
//! - Catalog validator
//! - Cost and build time tables

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

use stellar_core::error::GameError;
use thiserror::Error;

pub mod costs;
pub mod validate;

/// Errors reported by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Failed to read file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        /// Path to the file.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse RON file.
    #[error("Failed to parse RON file '{path}': {source}")]
    ParseError {
        /// Path to the file.
        path: String,
        /// Underlying parse error.
        #[source]
        source: ron::error::SpannedError,
    },

    /// The engine rejected the data or the request.
    #[error(transparent)]
    Game(#[from] GameError),
}
