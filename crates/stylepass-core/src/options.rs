//! Options for a style import transform run.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Options are plain data so hosts can deserialize them from their own
//! configuration files:
//!
//! ```json
//! {
//!   "root": "/project",
//!   "library-name": "ui",
//!   "load-paths": ["node_modules/bootstrap/scss"],
//!   "minify": true
//! }
//! ```
//!
//! Every field is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TransformOptions {
    /// Project root. Artifact paths are relative to it.
    ///
    /// When absent, the directory of the file being transformed is used.
    pub root: Option<PathBuf>,

    /// Prefix for generated CSS module class names.
    pub library_name: Option<String>,

    /// Extra directories searched by the Sass compiler.
    pub load_paths: Vec<PathBuf>,

    /// Minify emitted CSS.
    pub minify: bool,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    pub fn with_load_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.load_paths.push(path.into());
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    /// The project root, falling back to `directory`.
    pub fn root_or<'a>(&'a self, directory: &'a Path) -> &'a Path {
        self.root.as_deref().unwrap_or(directory)
    }

    /// CSS modules naming pattern: `{library}_[content-hash]__[local]`, or
    /// `[content-hash]__[local]` without a library name.
    pub fn class_name_pattern(&self) -> String {
        match self.library_name.as_deref() {
            Some(name) if !name.is_empty() => format!("{}_[content-hash]__[local]", name),
            _ => "[content-hash]__[local]".to_string(),
        }
    }
}
