//! SASS compilation and stylesheet resolution for the style import pass.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate provides:
//! - Partial naming (`_name.scss`) and its precedence over plain files
//! - Stylesheet resolution against the filesystem and `node_modules` packages
//! - Sass compilation (grass) with nested imports resolved relative to the
//!   stylesheet that contains them

mod compile;
mod error;
mod importer;
mod locator;
mod manifest;
mod partial;

pub use compile::{SassCompiler, Syntax, compile_sass};
pub use error::SassError;
pub use locator::{EXTENSION_CANDIDATES, ModuleLocator, ResolutionContext, normalize_path};
pub use manifest::PackageManifest;
pub use partial::{is_partial, partial_reference};
