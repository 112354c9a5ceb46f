//! Filesystem resolution of stylesheet references.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Resolution order for a reference such as `theme/colors`:
//!
//! 1. The partial candidate `theme/_colors`, then the reference itself.
//! 2. Each candidate relative to the base directory, then (unless it starts
//!    with `./`, `../` or is absolute) inside `node_modules` directories found
//!    by walking up from the base directory.
//! 3. A path is accepted as-is when it names a file, otherwise with `.scss`,
//!    `.sass` and `.css` appended in that order.
//! 4. A directory resolves through its `package.json` entry, then through
//!    `_index` and `index` files.

use std::ffi::{OsStr, OsString};
use std::path::{Component, Path, PathBuf};

use stylepass_system_runtime::SystemRuntime;

use crate::error::SassError;
use crate::manifest::PackageManifest;
use crate::partial::{is_partial, partial_reference};

/// Extensions tried, in order, when a candidate does not name a file.
pub const EXTENSION_CANDIDATES: [&str; 3] = ["scss", "sass", "css"];

const INDEX_STEMS: [&str; 2] = ["_index", "index"];

/// Where a stylesheet reference is being resolved from.
///
/// The importer is the top-level file handed to the compiler. When the
/// compiler reports a containing stylesheet (an import nested inside an
/// already-resolved file), resolution is relative to that file instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    importer: PathBuf,
    containing: Option<PathBuf>,
}

impl ResolutionContext {
    /// Context for references made by the top-level `importer` file.
    pub fn new(importer: impl Into<PathBuf>) -> Self {
        Self {
            importer: importer.into(),
            containing: None,
        }
    }

    /// Context for references made inside `containing`, a stylesheet that
    /// was itself loaded while compiling the same importer.
    pub fn nested(&self, containing: impl Into<PathBuf>) -> Self {
        Self {
            importer: self.importer.clone(),
            containing: Some(containing.into()),
        }
    }

    pub fn importer(&self) -> &Path {
        &self.importer
    }

    pub fn containing(&self) -> Option<&Path> {
        self.containing.as_deref()
    }

    /// Directory relative references are resolved against.
    pub fn base_dir(&self) -> &Path {
        self.containing
            .as_deref()
            .unwrap_or(&self.importer)
            .parent()
            .unwrap_or_else(|| Path::new(""))
    }
}

/// Resolves stylesheet references to files through a [`SystemRuntime`].
pub struct ModuleLocator<'a> {
    runtime: &'a dyn SystemRuntime,
}

impl<'a> ModuleLocator<'a> {
    pub fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self { runtime }
    }

    /// Locate the file a reference points at.
    ///
    /// # Errors
    ///
    /// Returns [`SassError::Unresolved`] when neither the partial nor the
    /// plain candidate matches a file.
    pub fn locate(&self, reference: &str, context: &ResolutionContext) -> Result<PathBuf, SassError> {
        let base_dir = context.base_dir();
        let partial = partial_reference(reference);

        let found = self
            .resolve(&partial, base_dir)
            .or_else(|| self.resolve(reference, base_dir));

        match found {
            Some(path) => {
                tracing::trace!(
                    reference,
                    base_dir = %base_dir.display(),
                    resolved = %path.display(),
                    partial = is_partial(&path),
                    "Resolved stylesheet reference"
                );
                Ok(path)
            }
            None => Err(SassError::Unresolved {
                reference: reference.to_string(),
                base_dir: base_dir.to_path_buf(),
            }),
        }
    }

    fn resolve(&self, reference: &str, base_dir: &Path) -> Option<PathBuf> {
        let target = normalize_path(&base_dir.join(reference));
        if let Some(found) = self.load_as_file(&target).or_else(|| self.load_as_directory(&target)) {
            return Some(found);
        }

        if Path::new(reference).is_absolute() || is_explicitly_relative(reference) {
            return None;
        }

        self.load_package(reference, base_dir)
    }

    fn load_as_file(&self, path: &Path) -> Option<PathBuf> {
        if self.is_file(path) {
            return Some(path.to_path_buf());
        }

        EXTENSION_CANDIDATES
            .iter()
            .map(|ext| append_extension(path, ext))
            .find(|candidate| self.is_file(candidate))
    }

    fn load_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !self.is_dir(dir) {
            return None;
        }

        if let Some(manifest) = self.read_manifest(dir) {
            for entry in manifest.entries() {
                let target = normalize_path(&dir.join(entry));
                if let Some(found) = self.load_as_file(&target).or_else(|| self.load_index(&target)) {
                    return Some(found);
                }
            }
        }

        self.load_index(dir)
    }

    fn load_index(&self, dir: &Path) -> Option<PathBuf> {
        INDEX_STEMS
            .iter()
            .find_map(|stem| self.load_as_file(&dir.join(stem)))
    }

    fn load_package(&self, reference: &str, base_dir: &Path) -> Option<PathBuf> {
        let (name, subpath) = split_package_reference(reference);

        for ancestor in base_dir.ancestors() {
            if ancestor.file_name() == Some(OsStr::new("node_modules")) {
                continue;
            }

            let package_dir = ancestor.join("node_modules").join(name);
            if !self.is_dir(&package_dir) {
                continue;
            }

            let found = if subpath.is_empty() {
                self.load_as_directory(&package_dir)
            } else {
                let target = package_dir.join(subpath);
                self.load_as_file(&target)
                    .or_else(|| self.load_as_directory(&target))
            };

            if found.is_some() {
                return found;
            }
        }

        None
    }

    fn read_manifest(&self, dir: &Path) -> Option<PackageManifest> {
        let path = dir.join(PackageManifest::FILE_NAME);
        if !self.is_file(&path) {
            return None;
        }

        let bytes = match self.runtime.file_read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read package manifest");
                return None;
            }
        };

        match PackageManifest::from_slice(&bytes) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed package manifest");
                None
            }
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        self.runtime.is_file(path).unwrap_or(false)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.runtime.is_dir(path).unwrap_or(false)
    }
}

/// Lexically normalize a path, removing `.` and resolving `..` against
/// preceding components. The filesystem is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }

    normalized
}

fn is_explicitly_relative(reference: &str) -> bool {
    reference == "." || reference == ".." || reference.starts_with("./") || reference.starts_with("../")
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Split `@scope/pkg/sub/path` into (`@scope/pkg`, `sub/path`).
fn split_package_reference(reference: &str) -> (&str, &str) {
    let first = reference.find('/');
    let boundary = if reference.starts_with('@') {
        first.and_then(|first| reference[first + 1..].find('/').map(|second| first + 1 + second))
    } else {
        first
    };

    match boundary {
        Some(index) => (&reference[..index], &reference[index + 1..]),
        None => (reference, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stylepass_system_runtime::NativeRuntime;

    fn write(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_partial_preferred_over_plain() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "foo.scss", ".plain {}");
        let partial = write(root, "_foo.scss", ".partial {}");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("foo", &context).unwrap(), partial);
        assert_eq!(locator.locate("foo.scss", &context).unwrap(), partial);
    }

    #[test]
    fn test_extension_candidates_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "vars.css", "");
        let sass = write(root, "vars.sass", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("vars", &context).unwrap(), sass);
    }

    #[test]
    fn test_plain_css_candidate() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let css = write(root, "reset.css", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("./reset", &context).unwrap(), css);
    }

    #[test]
    fn test_nested_context_resolves_from_containing_file() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let containing = write(root, "lib/a.scss", "@import 'b';");
        let nested = write(root, "lib/_b.scss", ".b {}");
        write(root, "_b.scss", ".wrong {}");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let top = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("b", &top).unwrap(), root.join("_b.scss"));
        assert_eq!(locator.locate("b", &top.nested(&containing)).unwrap(), nested);
    }

    #[test]
    fn test_parent_relative_reference() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let shared = write(root, "shared/_mixins.scss", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("app/main.scss"));

        assert_eq!(locator.locate("../shared/mixins", &context).unwrap(), shared);
    }

    #[test]
    fn test_package_sass_export_preferred_over_main() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(
            root,
            "node_modules/ui-kit/package.json",
            r#"{ "main": "dist/index.css", "exports": { ".": { "sass": "./scss/index" } } }"#,
        );
        write(root, "node_modules/ui-kit/dist/index.css", "");
        let entry = write(root, "node_modules/ui-kit/scss/index.scss", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("src/deep/main.scss"));

        assert_eq!(locator.locate("ui-kit", &context).unwrap(), entry);
    }

    #[test]
    fn test_package_main_fallback() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "node_modules/plain/package.json", r#"{ "main": "plain.css" }"#);
        let main = write(root, "node_modules/plain/plain.css", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("plain", &context).unwrap(), main);
    }

    #[test]
    fn test_scoped_package_subpath() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let vars = write(root, "node_modules/@acme/tokens/scss/_vars.scss", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("@acme/tokens/scss/vars", &context).unwrap(), vars);
    }

    #[test]
    fn test_directory_index() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        let index = write(root, "components/_index.scss", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("components", &context).unwrap(), index);
    }

    #[test]
    fn test_malformed_manifest_falls_back_to_index() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "node_modules/broken/package.json", "{ nope");
        let index = write(root, "node_modules/broken/index.scss", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        assert_eq!(locator.locate("broken", &context).unwrap(), index);
    }

    #[test]
    fn test_explicitly_relative_skips_packages() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        write(root, "node_modules/theme/index.scss", "");

        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(root.join("main.scss"));

        let err = locator.locate("./theme", &context).unwrap_err();
        assert!(matches!(err, SassError::Unresolved { ref reference, .. } if reference == "./theme"));
    }

    #[test]
    fn test_unresolved_reports_base_dir() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = NativeRuntime::new();
        let locator = ModuleLocator::new(&runtime);
        let context = ResolutionContext::new(temp.path().join("main.scss"));

        match locator.locate("missing", &context) {
            Err(SassError::Unresolved { reference, base_dir }) => {
                assert_eq!(reference, "missing");
                assert_eq!(base_dir, temp.path());
            }
            other => panic!("expected Unresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_context_base_dir() {
        let context = ResolutionContext::new("/project/src/app.scss");
        assert_eq!(context.base_dir(), Path::new("/project/src"));
        assert_eq!(context.containing(), None);

        let nested = context.nested("/project/lib/theme/_a.scss");
        assert_eq!(nested.base_dir(), Path::new("/project/lib/theme"));
        assert_eq!(nested.importer(), Path::new("/project/src/app.scss"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize_path(Path::new("./x.css")), PathBuf::from("x.css"));
    }

    #[test]
    fn test_split_package_reference() {
        assert_eq!(split_package_reference("pkg"), ("pkg", ""));
        assert_eq!(split_package_reference("pkg/a/b"), ("pkg", "a/b"));
        assert_eq!(split_package_reference("@scope/pkg"), ("@scope/pkg", ""));
        assert_eq!(split_package_reference("@scope/pkg/a"), ("@scope/pkg", "a"));
    }
}
