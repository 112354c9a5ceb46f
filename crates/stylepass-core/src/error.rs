//! Error types for stylepass-core

use std::path::PathBuf;

use stylepass_sass::SassError;
use stylepass_system_runtime::RuntimeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleImportError {
    /// The file named by a top-level style import does not exist
    #[error("Can't resolve style import '{specifier}' ({})", .path.display())]
    Resolution {
        specifier: String,
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// A `.module.` stylesheet imported without a default or namespace binding
    #[error("Style module '{specifier}' must be imported with a default or namespace binding")]
    UnsupportedImportShape { specifier: String },

    #[error(transparent)]
    Preprocessor(#[from] SassError),

    #[error("CSS transform failed for {}: {message}", .path.display())]
    CssTransform { path: PathBuf, message: String },

    /// An artifact path that would land outside the output directory
    #[error("Compiled stylesheet '{path}' would be written outside {}", .out_dir.display())]
    ArtifactOutsideOutput { path: String, out_dir: PathBuf },

    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to emit {}: {source}", .path.display())]
    Emit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StyleImportError {
    pub(crate) fn css_transform(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::CssTransform {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StyleImportError>;
