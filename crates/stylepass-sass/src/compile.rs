//! Sass compilation with locator-driven import resolution.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The compile flow is:
//! 1. Rewrite the top-level buffer's stylesheet URLs relative to the importer
//! 2. Hand the buffer to grass with a [`LocatorFs`] so every nested
//!    stylesheet is rewritten relative to its own location as it is loaded
//! 3. Return expanded CSS; minification is left to the CSS transformer
//!
//! # Example
//!
//! ```rust,ignore
//! use stylepass_sass::{SassCompiler, Syntax};
//! use stylepass_system_runtime::NativeRuntime;
//! use std::path::Path;
//!
//! let runtime = NativeRuntime::new();
//! let css = SassCompiler::new(&runtime)
//!     .compile(Path::new("/project/src/button.scss"), "@use 'tokens';", Syntax::Scss)?;
//! ```

use std::path::{Path, PathBuf};

use grass::{InputSyntax, Options, OutputStyle};
use stylepass_system_runtime::SystemRuntime;

use crate::error::SassError;
use crate::importer::{ImportRewriter, LocatorFs};
use crate::locator::ResolutionContext;

/// Source syntax of a Sass stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Block syntax (`.scss`)
    Scss,
    /// Indented syntax (`.sass`)
    Indented,
}

impl Syntax {
    /// Syntax for a file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "scss" => Some(Syntax::Scss),
            "sass" => Some(Syntax::Indented),
            _ => None,
        }
    }

    /// Syntax for a path, based on its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    fn input_syntax(self) -> InputSyntax {
        match self {
            Syntax::Scss => InputSyntax::Scss,
            Syntax::Indented => InputSyntax::Sass,
        }
    }
}

/// Compiles Sass buffers, resolving their imports with the [`ModuleLocator`](crate::ModuleLocator).
pub struct SassCompiler<'a> {
    runtime: &'a dyn SystemRuntime,
    load_paths: Vec<PathBuf>,
}

impl<'a> SassCompiler<'a> {
    pub fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self {
            runtime,
            load_paths: Vec::new(),
        }
    }

    /// Directories grass searches for references the locator leaves unresolved.
    pub fn with_load_paths(mut self, load_paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.load_paths.extend(load_paths);
        self
    }

    /// Compile `source`, the contents of `importer`, to CSS.
    ///
    /// # Errors
    ///
    /// Returns [`SassError::CompilationFailed`] when grass rejects the
    /// source, including when a referenced stylesheet cannot be found.
    pub fn compile(&self, importer: &Path, source: &str, syntax: Syntax) -> Result<String, SassError> {
        let context = ResolutionContext::new(importer);
        let rewriter = ImportRewriter::new(self.runtime);
        let entry = rewriter.rewrite(source, syntax, &context);

        let fs = LocatorFs::new(self.runtime, &rewriter, &context);
        let options = Options::default()
            .fs(&fs)
            .load_paths(self.load_paths.as_slice())
            .input_syntax(syntax.input_syntax())
            .style(OutputStyle::Expanded);

        grass::from_string(entry, &options).map_err(|e| SassError::CompilationFailed {
            path: importer.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Read and compile the stylesheet at `path`, picking the syntax from
    /// its extension (`.sass` is indented, anything else is SCSS).
    pub fn compile_file(&self, path: &Path) -> Result<String, SassError> {
        let source = self
            .runtime
            .file_read_string(path)
            .map_err(|source| SassError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let syntax = Syntax::from_path(path).unwrap_or(Syntax::Scss);
        self.compile(path, &source, syntax)
    }
}

/// Compile a Sass buffer read from `importer`.
///
/// Convenience wrapper around [`SassCompiler`].
pub fn compile_sass(
    runtime: &dyn SystemRuntime,
    importer: &Path,
    source: &str,
    syntax: Syntax,
    load_paths: &[PathBuf],
) -> Result<String, SassError> {
    SassCompiler::new(runtime)
        .with_load_paths(load_paths.iter().cloned())
        .compile(importer, source, syntax)
}
