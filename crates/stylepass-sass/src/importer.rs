//! Import resolution wiring between grass and the [`ModuleLocator`].
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! grass loads every stylesheet through a [`grass::Fs`] implementation but
//! does its own candidate search. To make the locator the resolution
//! strategy, each stylesheet is rewritten as it is loaded: the URLs of its
//! `@import`, `@use` and `@forward` rules are replaced by the absolute paths
//! the locator finds, relative to that stylesheet's own directory. grass then
//! only has to open the exact files it is given.
//!
//! A URL the locator cannot resolve is left as written, so grass's own lookup
//! runs and its "can't find stylesheet" diagnostic is what the user sees.
//!
//! A located `.css` file cannot be handed over under its own name: grass
//! would treat `@import "x.css"` as a plain CSS import, and without the
//! extension it would look for `x.scss` first. It is handed over as `x.css.scss`
//! instead, and [`LocatorFs`] serves the real `x.css` under that name.
//!
//! Rules are matched textually. Comments and string literals are not told
//! apart from real rules, so an `@import "..."` inside a comment is rewritten
//! too. Imports followed by a media query or `supports(...)` are plain CSS
//! imports and are left alone.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use stylepass_system_runtime::{RuntimeError, SystemRuntime};

use crate::compile::Syntax;
use crate::locator::{ModuleLocator, ResolutionContext};

/// `@import`, `@use` or `@forward` followed by one or more quoted URLs.
///
/// Captures the rule name, the whitespace after it, the URL list, an
/// optional `as` clause directly after the URL (possibly on the next line)
/// and the rest of the rule up to `;`, `{` or the end of the line.
static QUOTED_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@(?P<rule>import|use|forward)(?P<gap>[ \t]+)(?P<urls>(?:"[^"\n]*"|'[^'\n]*')(?:[ \t]*,[ \t]*(?:"[^"\n]*"|'[^'\n]*'))*)(?P<alias>\s+as\s)?(?P<tail>[^;{\n]*)"#,
    )
    .unwrap()
});

/// Rule tails that keep a Sass load: module configuration and visibility.
static SASS_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:(?:with|show|hide)\b.*|//.*|/\*.*)?$").unwrap());

/// Suffix that makes grass load a located `.css` file as a stylesheet.
const CSS_LOAD_SUFFIX: &str = ".scss";

/// One quoted URL within a rule's URL list.
static QUOTED_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(?P<double>[^"\n]*)"|'(?P<single>[^'\n]*)'"#).unwrap());

/// Indented syntax allows `@import a, b` without quotes.
static UNQUOTED_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^(?P<indent>[ \t]*)@import[ \t]+(?P<urls>[^"'\s][^"'\n]*?)[ \t]*$"#).unwrap()
});

/// Rewrites stylesheet URLs to located absolute paths.
pub(crate) struct ImportRewriter<'a> {
    locator: ModuleLocator<'a>,
    /// Load names handed to grass for located `.css` files, to the real file.
    css_loads: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl<'a> ImportRewriter<'a> {
    pub(crate) fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self {
            locator: ModuleLocator::new(runtime),
            css_loads: Mutex::new(HashMap::new()),
        }
    }

    /// The located `.css` file behind a load name produced by [`Self::rewrite`].
    pub(crate) fn css_source(&self, path: &Path) -> Option<PathBuf> {
        self.css_loads.lock().ok()?.get(path).cloned()
    }

    /// Rewrite every resolvable stylesheet URL in `source`.
    pub(crate) fn rewrite(&self, source: &str, syntax: Syntax, context: &ResolutionContext) -> String {
        let rewritten = QUOTED_RULE.replace_all(source, |caps: &Captures| self.rewrite_rule(caps, context));

        match syntax {
            Syntax::Scss => rewritten.into_owned(),
            Syntax::Indented => UNQUOTED_IMPORT
                .replace_all(&rewritten, |caps: &Captures| self.rewrite_unquoted(caps, context))
                .into_owned(),
        }
    }

    fn rewrite_rule(&self, caps: &Captures, context: &ResolutionContext) -> String {
        let rule = &caps["rule"];
        let tail = caps.name("tail").map_or("", |tail| tail.as_str());

        // `@import "x" screen;` and `@import "x" supports(...)` stay plain CSS.
        if caps.name("alias").is_none() && !SASS_TAIL.is_match(tail) {
            return caps[0].to_string();
        }

        let mut namespace = None;

        let urls = QUOTED_URL.replace_all(&caps["urls"], |url_caps: &Captures| {
            let (url, quote) = match url_caps.name("double") {
                Some(url) => (url.as_str(), '"'),
                None => (&url_caps["single"], '\''),
            };

            match self.resolve_url(rule, url, context) {
                Some(resolved) => {
                    if rule == "use" {
                        // Load names of `.css` files carry two extensions, so always alias them.
                        let implied = (!resolved.ends_with(&format!(".css{CSS_LOAD_SUFFIX}")))
                            .then(|| file_stem(&resolved).to_string());
                        namespace = Some((default_namespace(url).to_string(), implied));
                    }
                    format!("{quote}{resolved}{quote}")
                }
                None => url_caps[0].to_string(),
            }
        });

        let mut out = format!("@{}{}{}", rule, &caps["gap"], urls);
        match caps.name("alias") {
            Some(alias) => out.push_str(alias.as_str()),
            None => {
                // Keep the namespace the author wrote, not the one the absolute path implies.
                if let Some((original, implied)) = namespace {
                    if implied.as_deref() != Some(original.as_str()) {
                        out.push_str(" as ");
                        out.push_str(&original);
                    }
                }
            }
        }
        out.push_str(tail);
        out
    }

    fn rewrite_unquoted(&self, caps: &Captures, context: &ResolutionContext) -> String {
        let urls: Vec<String> = caps["urls"]
            .split(',')
            .map(str::trim)
            .map(|url| match self.resolve_url("import", url, context) {
                Some(resolved) => format!("\"{}\"", resolved),
                None => url.to_string(),
            })
            .collect();

        format!("{}@import {}", &caps["indent"], urls.join(", "))
    }

    fn resolve_url(&self, rule: &str, url: &str, context: &ResolutionContext) -> Option<String> {
        if !is_stylesheet_load(rule, url) {
            return None;
        }

        match self.locator.locate(url, context) {
            Ok(path) => Some(self.compiler_url(path)),
            Err(e) => {
                tracing::debug!(url, error = %e, "Leaving stylesheet reference to the compiler");
                None
            }
        }
    }

    /// Absolute path in the form handed back to grass.
    ///
    /// `.scss` and `.sass` files are handed over as located. A `.css` file
    /// gets [`CSS_LOAD_SUFFIX`] appended and is remembered so that
    /// [`LocatorFs`] can serve it.
    fn compiler_url(&self, path: PathBuf) -> String {
        let load = match path.extension() {
            Some(ext) if ext == "css" => {
                let mut name = OsString::from(path.as_os_str());
                name.push(CSS_LOAD_SUFFIX);
                let load = PathBuf::from(name);
                if let Ok(mut loads) = self.css_loads.lock() {
                    loads.insert(load.clone(), path);
                }
                load
            }
            _ => path,
        };
        load.to_string_lossy().replace('\\', "/")
    }
}

/// Whether a rule URL loads a stylesheet the locator should resolve.
///
/// Built-in modules, remote URLs and plain CSS `@import`s are passed through.
fn is_stylesheet_load(rule: &str, url: &str) -> bool {
    if url.is_empty()
        || url.starts_with("sass:")
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
        || url.starts_with("url(")
    {
        return false;
    }

    !(rule == "import" && url.ends_with(".css"))
}

/// Namespace Sass derives for a `@use` URL: the last path segment without
/// extension or leading underscore.
fn default_namespace(url: &str) -> &str {
    let base = url.rsplit('/').next().unwrap_or(url);
    let stem = base.split('.').next().unwrap_or(base);
    stem.strip_prefix('_').unwrap_or(stem)
}

/// File name of a resolved path up to its first dot, underscore kept.
fn file_stem(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    base.split('.').next().unwrap_or(base)
}

/// A [`grass::Fs`] that rewrites each stylesheet it loads so that nested
/// references resolve through the [`ModuleLocator`], relative to the file
/// that contains them.
pub(crate) struct LocatorFs<'a> {
    runtime: &'a dyn SystemRuntime,
    rewriter: &'a ImportRewriter<'a>,
    context: &'a ResolutionContext,
}

impl<'a> LocatorFs<'a> {
    pub(crate) fn new(
        runtime: &'a dyn SystemRuntime,
        rewriter: &'a ImportRewriter<'a>,
        context: &'a ResolutionContext,
    ) -> Self {
        Self {
            runtime,
            rewriter,
            context,
        }
    }
}

impl Debug for LocatorFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocatorFs")
            .field("runtime", &"<SystemRuntime>")
            .field("importer", &self.context.importer())
            .finish()
    }
}

impl grass::Fs for LocatorFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.runtime.is_dir(path).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        let path = self.rewriter.css_source(path).unwrap_or_else(|| path.to_path_buf());
        self.runtime.is_file(&path).unwrap_or(false)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if let Some(css) = self.rewriter.css_source(path) {
            return self.runtime.file_read(&css).map_err(RuntimeError::into_io);
        }

        let bytes = self.runtime.file_read(path).map_err(RuntimeError::into_io)?;

        let Some(syntax) = Syntax::from_path(path) else {
            return Ok(bytes);
        };

        let source =
            String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let nested = self.context.nested(path);

        Ok(self.rewriter.rewrite(&source, syntax, &nested).into_bytes())
    }
}
