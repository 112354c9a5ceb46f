/*
 * artifact.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Compiled stylesheets collected during a transform run.
 */

//! Compiled CSS artifacts produced by the style import pass.
//!
//! Each processed style import yields one [`CompiledStyle`]. The pass only
//! appends; writing the artifacts to disk is left to the host, which can use
//! [`StyleArtifacts::write_all`].

use std::path::{Path, PathBuf};

use stylepass_sass::normalize_path;
use stylepass_system_runtime::SystemRuntime;

use crate::error::{Result, StyleImportError};

/// A compiled stylesheet and the project-relative path it should be written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStyle {
    /// Output path relative to the project root, e.g. `./components/btn.css`
    pub path: String,

    /// Compiled CSS
    pub code: Vec<u8>,
}

impl CompiledStyle {
    pub fn new(path: impl Into<String>, code: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            code,
        }
    }

    /// Get the CSS as UTF-8 if valid
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.code).ok()
    }
}

/// Append-only collection of compiled stylesheets, in processing order.
///
/// Paths are not deduplicated: importing the same stylesheet twice records
/// it twice.
#[derive(Debug, Default)]
pub struct StyleArtifacts {
    styles: Vec<CompiledStyle>,
}

impl StyleArtifacts {
    pub fn new() -> Self {
        Self { styles: Vec::new() }
    }

    pub fn push(&mut self, style: CompiledStyle) {
        self.styles.push(style);
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledStyle> {
        self.styles.iter()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// The first artifact recorded for `path`.
    pub fn get(&self, path: &str) -> Option<&CompiledStyle> {
        self.styles.iter().find(|style| style.path == path)
    }

    pub fn into_vec(self) -> Vec<CompiledStyle> {
        self.styles
    }

    /// Write every artifact below `out_dir`, creating directories as needed.
    ///
    /// Every target is checked before anything is written: an artifact path
    /// that normalizes to a location outside `out_dir` (a stylesheet above
    /// `root`, e.g. `../styles/x.css`) fails the whole call with
    /// [`StyleImportError::ArtifactOutsideOutput`].
    ///
    /// Returns the written paths in processing order.
    pub fn write_all(&self, runtime: &dyn SystemRuntime, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let out_root = normalize_path(out_dir);
        let targets = self
            .styles
            .iter()
            .map(|style| {
                let target = normalize_path(&out_root.join(style.path.trim_start_matches("./")));
                if target.starts_with(&out_root) && target != out_root {
                    Ok(target)
                } else {
                    Err(StyleImportError::ArtifactOutsideOutput {
                        path: style.path.clone(),
                        out_dir: out_root.clone(),
                    })
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut written = Vec::with_capacity(targets.len());

        for (style, target) in self.styles.iter().zip(targets) {
            if let Some(parent) = target.parent() {
                runtime
                    .dir_create(parent, true)
                    .map_err(|source| StyleImportError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }

            runtime
                .file_write(&target, &style.code)
                .map_err(|source| StyleImportError::Io {
                    path: target.clone(),
                    source,
                })?;

            tracing::debug!(path = %target.display(), bytes = style.code.len(), "Wrote compiled stylesheet");
            written.push(target);
        }

        Ok(written)
    }
}

impl IntoIterator for StyleArtifacts {
    type Item = CompiledStyle;
    type IntoIter = std::vec::IntoIter<CompiledStyle>;

    fn into_iter(self) -> Self::IntoIter {
        self.styles.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylepass_system_runtime::NativeRuntime;

    #[test]
    fn test_push_preserves_order_and_duplicates() {
        let mut artifacts = StyleArtifacts::new();
        assert!(artifacts.is_empty());

        artifacts.push(CompiledStyle::new("./a.css", b".a{}".to_vec()));
        artifacts.push(CompiledStyle::new("./b.css", b".b{}".to_vec()));
        artifacts.push(CompiledStyle::new("./a.css", b".a2{}".to_vec()));

        assert_eq!(artifacts.len(), 3);
        let paths: Vec<_> = artifacts.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(paths, vec!["./a.css", "./b.css", "./a.css"]);
        assert_eq!(artifacts.get("./a.css").and_then(|s| s.as_str()), Some(".a{}"));
        assert!(artifacts.get("./missing.css").is_none());
    }

    #[test]
    fn test_write_all_creates_directories() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = NativeRuntime::new();

        let mut artifacts = StyleArtifacts::new();
        artifacts.push(CompiledStyle::new("./components/btn.css", b".btn{color:red}".to_vec()));
        artifacts.push(CompiledStyle::new("./site.css", b"body{margin:0}".to_vec()));

        let written = artifacts.write_all(&runtime, temp.path()).unwrap();

        assert_eq!(
            written,
            vec![temp.path().join("components/btn.css"), temp.path().join("site.css")]
        );
        assert_eq!(
            std::fs::read_to_string(temp.path().join("components/btn.css")).unwrap(),
            ".btn{color:red}"
        );
    }

    #[test]
    fn test_write_all_rejects_paths_leaving_out_dir() {
        let temp = tempfile::tempdir().unwrap();
        let runtime = NativeRuntime::new();
        let out_dir = temp.path().join("dist");
        std::fs::write(temp.path().join("x.css"), ".x { color: blue }").unwrap();

        let mut artifacts = StyleArtifacts::new();
        artifacts.push(CompiledStyle::new("./ok.css", b".ok{}".to_vec()));
        artifacts.push(CompiledStyle::new("../x.css", b".x{}".to_vec()));

        let err = artifacts.write_all(&runtime, &out_dir).unwrap_err();
        assert!(matches!(
            err,
            StyleImportError::ArtifactOutsideOutput { ref path, .. } if path == "../x.css"
        ));

        // Nothing is written, and the file above out_dir is untouched.
        assert!(!out_dir.join("ok.css").exists());
        assert_eq!(
            std::fs::read_to_string(temp.path().join("x.css")).unwrap(),
            ".x { color: blue }"
        );
    }
}
