//! Output locations for compiled stylesheets.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::{Component, Path, PathBuf};

use stylepass_sass::normalize_path;

/// Where a compiled stylesheet goes, seen from two places.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    /// Module specifier for the rewritten import, relative to the importing file
    pub specifier: String,

    /// Artifact path relative to the project root
    pub artifact: String,
}

/// Derive the output paths for the stylesheet at `resolved`.
///
/// The source extension becomes `.css` and one `.module.` marker is dropped
/// from the file name, so `btn.module.scss` compiles to `btn.css` next to
/// its source. Both paths use `/` separators and start with `./` or `../`.
pub fn derive_output_path(resolved: &Path, directory: &Path, root: &Path) -> OutputPath {
    let output = resolved.with_file_name(output_file_name(resolved));

    OutputPath {
        specifier: relative_specifier(&output, directory),
        artifact: relative_specifier(&output, root),
    }
}

fn output_file_name(resolved: &Path) -> String {
    let stem = resolved
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("{}.css", stem).replacen(".module.", ".", 1)
}

/// `path` relative to `base`, in module specifier form.
fn relative_specifier(path: &Path, base: &Path) -> String {
    let path = normalize_path(path);
    let base = normalize_path(base);

    let path_components: Vec<Component> = path.components().collect();
    let base_components: Vec<Component> = base.components().collect();

    let common = path_components
        .iter()
        .zip(&base_components)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push("..");
    }
    for component in &path_components[common..] {
        relative.push(component.as_os_str());
    }

    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    if joined.starts_with("../") {
        joined
    } else {
        format!("./{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_marker_removed() {
        let out = derive_output_path(
            Path::new("/p/src/btn.module.scss"),
            Path::new("/p/src"),
            Path::new("/p/src"),
        );
        assert_eq!(out.specifier, "./btn.css");
        assert_eq!(out.artifact, "./btn.css");
    }

    #[test]
    fn test_plain_extension_replaced() {
        let out = derive_output_path(
            Path::new("/p/src/theme/site.sass"),
            Path::new("/p/src"),
            Path::new("/p"),
        );
        assert_eq!(out.specifier, "./theme/site.css");
        assert_eq!(out.artifact, "./src/theme/site.css");
    }

    #[test]
    fn test_css_stays_css() {
        let out = derive_output_path(Path::new("/p/a.css"), Path::new("/p"), Path::new("/p"));
        assert_eq!(out.specifier, "./a.css");
    }

    #[test]
    fn test_parent_directory_specifier() {
        let out = derive_output_path(
            Path::new("/p/shared/card.module.css"),
            Path::new("/p/src/components"),
            Path::new("/p"),
        );
        assert_eq!(out.specifier, "../../shared/card.css");
        assert_eq!(out.artifact, "./shared/card.css");
    }

    #[test]
    fn test_only_one_module_marker_removed() {
        assert_eq!(
            output_file_name(Path::new("/p/a.module.module.css")),
            "a.module.css"
        );
        assert_eq!(output_file_name(Path::new("/p/a.styl")), "a.css");
    }

    #[test]
    fn test_module_directory_is_kept() {
        // Only the file name loses its marker.
        let out = derive_output_path(
            Path::new("/p/x.module.d/a.module.css"),
            Path::new("/p"),
            Path::new("/p"),
        );
        assert_eq!(out.specifier, "./x.module.d/a.css");
    }
}
