//! CSS transformation and CSS modules class renaming.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Every stylesheet goes through lightningcss. Stylesheets whose path
//! contains `.module.` additionally have their class names scoped: each
//! local name is rewritten to `{library}_[content-hash]__[local]`, and the
//! mapping from local to generated name is returned as an [`ExportTable`].
//!
//! The hash covers the stylesheet content only: identical CSS and an
//! identical library name give identical class names wherever the file lives.

use std::collections::BTreeMap;
use std::path::Path;

use lightningcss::css_modules::{self, CssModuleExports, CssModuleReference, Pattern};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::error::{Result, StyleImportError};

/// Marker that makes a stylesheet a CSS module.
pub const MODULE_MARKER: &str = ".module.";

/// Whether a stylesheet is scoped as a CSS module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Plain,
    Module,
}

impl StyleKind {
    /// Classify a resolved stylesheet path.
    pub fn classify(path: &Path) -> Self {
        if path.to_string_lossy().contains(MODULE_MARKER) {
            StyleKind::Module
        } else {
            StyleKind::Plain
        }
    }

    pub fn is_module(self) -> bool {
        self == StyleKind::Module
    }
}

/// Local class name to generated class name, ordered by local name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable(BTreeMap<String, String>);

impl ExportTable {
    pub fn get(&self, local: &str) -> Option<&str> {
        self.0.get(local).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn from_exports(exports: CssModuleExports) -> Self {
        let table = exports
            .into_iter()
            .map(|(local, export)| {
                let mut value = export.name;
                for composed in export.composes {
                    match composed {
                        CssModuleReference::Local { name } | CssModuleReference::Global { name } => {
                            value.push(' ');
                            value.push_str(&name);
                        }
                        CssModuleReference::Dependency { name, specifier } => {
                            tracing::warn!(
                                class = %local,
                                composes = %name,
                                from = %specifier,
                                "Ignoring composes from another stylesheet"
                            );
                        }
                    }
                }
                (local, value)
            })
            .collect();

        ExportTable(table)
    }
}

impl FromIterator<(String, String)> for ExportTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        ExportTable(iter.into_iter().collect())
    }
}

/// Options that affect CSS output.
#[derive(Debug, Clone, Copy)]
pub struct CssOptions<'a> {
    /// Root that printed file references are made relative to
    pub project_root: &'a Path,

    /// CSS modules naming pattern, e.g. `ui_[content-hash]__[local]`
    pub pattern: &'a str,

    pub minify: bool,
}

/// Output of [`transform_css`].
#[derive(Debug, Clone)]
pub struct TransformedCss {
    pub code: Vec<u8>,

    /// Present only for [`StyleKind::Module`]
    pub exports: Option<ExportTable>,
}

/// Run a stylesheet through the CSS engine.
///
/// # Errors
///
/// Returns [`StyleImportError::CssTransform`] when the pattern, the CSS, or
/// the printing step is rejected.
pub fn transform_css(path: &Path, css: &str, kind: StyleKind, options: &CssOptions<'_>) -> Result<TransformedCss> {
    let css_modules = match kind {
        StyleKind::Module => {
            let pattern = Pattern::parse(options.pattern).map_err(|e| StyleImportError::css_transform(path, e))?;
            Some(css_modules::Config {
                pattern,
                ..Default::default()
            })
        }
        StyleKind::Plain => None,
    };

    let parser_options = ParserOptions {
        filename: path.to_string_lossy().into_owned(),
        css_modules,
        ..ParserOptions::default()
    };

    let mut stylesheet = StyleSheet::parse(css, parser_options).map_err(|e| StyleImportError::css_transform(path, e))?;

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| StyleImportError::css_transform(path, e))?;

    let project_root = options.project_root.to_string_lossy();
    let printed = stylesheet
        .to_css(PrinterOptions {
            minify: options.minify,
            project_root: Some(project_root.as_ref()),
            ..PrinterOptions::default()
        })
        .map_err(|e| StyleImportError::css_transform(path, e))?;

    let exports = match kind {
        StyleKind::Module => Some(printed.exports.map(ExportTable::from_exports).unwrap_or_default()),
        StyleKind::Plain => None,
    };

    Ok(TransformedCss {
        code: printed.code.into_bytes(),
        exports,
    })
}
