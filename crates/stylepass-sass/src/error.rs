//! Error types for SASS operations.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;

use stylepass_system_runtime::RuntimeError;
use thiserror::Error;

/// Errors that can occur during SASS operations
#[derive(Debug, Error)]
pub enum SassError {
    /// No file matched a stylesheet reference
    #[error("Can't resolve stylesheet '{reference}' from {}", .base_dir.display())]
    Unresolved { reference: String, base_dir: PathBuf },

    /// SASS compilation failed
    #[error("SASS compilation failed for {}: {message}", .path.display())]
    CompilationFailed { path: PathBuf, message: String },

    /// File I/O error
    #[error("Failed to read SASS file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },
}
