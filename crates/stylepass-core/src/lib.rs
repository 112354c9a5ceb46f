//! Style import rewriting for JavaScript/TypeScript modules.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Every `import` of a `.css`, `.scss`, `.sass` or `.styl` file is replaced
//! so that it points at a compiled plain-CSS artifact. Imports of CSS
//! modules (`*.module.*`) become a side-effect import of the compiled CSS
//! plus a variable holding the class-name mapping.
//!
//! The crate is organized as:
//! - [`rewrite`] - the statement rewriter
//! - [`css_modules`] - CSS transformation and class scoping
//! - [`output_path`] - where compiled stylesheets go
//! - [`artifact`] - the sink compiled stylesheets are collected in
//! - [`transform`] - the transform pipeline and per-run context
//! - [`source`] - parsing and printing of whole source files

pub mod artifact;
pub mod css_modules;
pub mod error;
pub mod options;
pub mod output_path;
pub mod rewrite;
pub mod source;
pub mod transform;

pub use artifact::{CompiledStyle, StyleArtifacts};
pub use css_modules::{CssOptions, ExportTable, StyleKind, TransformedCss, transform_css};
pub use error::{Result, StyleImportError};
pub use options::TransformOptions;
pub use output_path::{OutputPath, derive_output_path};
pub use rewrite::{StyleExtension, StyleImportRewriter};
pub use source::{emit_module, parse_module, transform_source};
pub use transform::{ModuleTransform, StyleImportTransform, TransformContext, TransformPipeline};
