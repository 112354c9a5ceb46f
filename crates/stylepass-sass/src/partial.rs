//! Partial file naming.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Sass partials are stylesheets meant only for inclusion. They are named with
//! a leading underscore and take precedence over a same-named non-partial.

use std::path::Path;

/// Compute the partial variant of a stylesheet reference.
///
/// The underscore goes in front of the final path segment:
///
/// ```
/// use stylepass_sass::partial_reference;
///
/// assert_eq!(partial_reference("dir/name.scss"), "dir/_name.scss");
/// assert_eq!(partial_reference("name"), "_name");
/// ```
///
/// A reference that already names a partial is returned unchanged.
pub fn partial_reference(reference: &str) -> String {
    let (dir, base) = match reference.rfind('/') {
        Some(index) => reference.split_at(index + 1),
        None => ("", reference),
    };

    if base.is_empty() || base.starts_with('_') {
        return reference.to_string();
    }

    format!("{}_{}", dir, base)
}

/// True when the file name of `path` follows the partial convention.
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('_'))
}
