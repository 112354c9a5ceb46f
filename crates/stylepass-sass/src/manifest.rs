//! Package manifest reading.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Only the fields that pick a package's stylesheet entry point are read.
//! Everything else in `package.json` is ignored.

use serde::Deserialize;

/// The subset of `package.json` consulted when resolving a package-qualified
/// stylesheet reference.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PackageManifest {
    /// Default entry point
    pub main: Option<String>,

    /// Conventional top-level stylesheet entry (e.g. Bootstrap's `"sass"` field)
    pub sass: Option<String>,

    /// Conditional exports map
    pub exports: Option<serde_json::Value>,
}

impl PackageManifest {
    pub const FILE_NAME: &'static str = "package.json";

    /// Parse a manifest from raw `package.json` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The `sass` export condition of the package root, if declared.
    ///
    /// Both `{"exports": {".": {"sass": ...}}}` and a root-level conditions
    /// object (`{"exports": {"sass": ...}}`) are recognized.
    pub fn sass_export(&self) -> Option<&str> {
        let exports = self.exports.as_ref()?.as_object()?;

        let conditions = match exports.get(".") {
            Some(root) => root.as_object()?,
            None if exports.keys().all(|key| !key.starts_with('.')) => exports,
            None => return None,
        };

        conditions.get("sass")?.as_str()
    }

    /// Candidate entry points in preference order: the `sass` export
    /// condition, then the `sass` field, then `main`.
    pub fn entries(&self) -> Vec<&str> {
        [self.sass_export(), self.sass.as_deref(), self.main.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> PackageManifest {
        PackageManifest::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_sass_export_under_root_subpath() {
        let manifest = parse(
            r#"{
                "name": "ui-kit",
                "main": "dist/index.js",
                "exports": { ".": { "sass": "./scss/index.scss", "default": "./dist/index.js" } }
            }"#,
        );

        assert_eq!(manifest.sass_export(), Some("./scss/index.scss"));
        assert_eq!(
            manifest.entries(),
            vec!["./scss/index.scss", "dist/index.js"]
        );
    }

    #[test]
    fn test_sass_export_as_bare_conditions() {
        let manifest = parse(r#"{ "exports": { "sass": "./theme", "import": "./index.mjs" } }"#);
        assert_eq!(manifest.sass_export(), Some("./theme"));
    }

    #[test]
    fn test_subpath_exports_without_root() {
        let manifest = parse(r#"{ "exports": { "./button": { "sass": "./button.scss" } } }"#);
        assert_eq!(manifest.sass_export(), None);
    }

    #[test]
    fn test_string_exports_have_no_sass_condition() {
        let manifest = parse(r#"{ "exports": "./index.js", "main": "index.js" }"#);
        assert_eq!(manifest.sass_export(), None);
        assert_eq!(manifest.entries(), vec!["index.js"]);
    }

    #[test]
    fn test_sass_field_before_main() {
        let manifest = parse(r#"{ "sass": "scss/bootstrap.scss", "main": "dist/js/bootstrap.js" }"#);
        assert_eq!(
            manifest.entries(),
            vec!["scss/bootstrap.scss", "dist/js/bootstrap.js"]
        );
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = parse("{}");
        assert!(manifest.entries().is_empty());
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        assert!(PackageManifest::from_slice(b"{ not json").is_err());
    }
}
