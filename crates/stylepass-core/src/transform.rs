/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Module transformation pipeline infrastructure.
 */

//! Module transformation pipeline infrastructure.
//!
//! - [`ModuleTransform`] - The trait implemented by all transformations
//! - [`TransformPipeline`] - Ordered collection of transforms to execute
//! - [`TransformContext`] - Per-run state shared by every file of a compilation
//!
//! # Example
//!
//! ```ignore
//! use stylepass_core::{StyleImportTransform, TransformContext, TransformOptions, TransformPipeline};
//! use stylepass_system_runtime::NativeRuntime;
//!
//! let runtime = NativeRuntime::new();
//! let mut ctx = TransformContext::new(&runtime, TransformOptions::new().with_library_name("ui"));
//!
//! let mut pipeline = TransformPipeline::new();
//! pipeline.push(Box::new(StyleImportTransform));
//!
//! for (file, module) in modules.iter_mut() {
//!     pipeline.execute(file, module, &mut ctx)?;
//! }
//!
//! ctx.artifacts.write_all(&runtime, &out_dir)?;
//! ```

use std::path::Path;

use stylepass_system_runtime::SystemRuntime;
use swc_core::ecma::ast::Module;

use crate::Result;
use crate::artifact::StyleArtifacts;
use crate::options::TransformOptions;
use crate::rewrite::StyleImportRewriter;

/// State for one compilation run.
///
/// Created once by the host and passed to every file's transforms, so the
/// artifacts of all files end up in the same sink.
pub struct TransformContext<'a> {
    pub runtime: &'a dyn SystemRuntime,
    pub options: TransformOptions,
    pub artifacts: StyleArtifacts,
}

impl<'a> TransformContext<'a> {
    pub fn new(runtime: &'a dyn SystemRuntime, options: TransformOptions) -> Self {
        Self {
            runtime,
            options,
            artifacts: StyleArtifacts::new(),
        }
    }

    /// Finish the run, handing back the collected artifacts.
    pub fn into_artifacts(self) -> StyleArtifacts {
        self.artifacts
    }
}

/// Trait for module transformations.
///
/// # Thread Safety
///
/// Transforms must be `Send + Sync` so a pipeline can be shared between
/// compilation runs on different threads.
pub trait ModuleTransform: Send + Sync {
    /// Human-readable name for this transform.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &str;

    /// Apply the transformation to `module`, parsed from `file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transformation fails.
    fn transform(&self, file: &Path, module: &mut Module, ctx: &mut TransformContext<'_>) -> Result<()>;
}

/// Rewrites style-file imports to compiled CSS artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleImportTransform;

impl ModuleTransform for StyleImportTransform {
    fn name(&self) -> &str {
        "style-imports"
    }

    fn transform(&self, file: &Path, module: &mut Module, ctx: &mut TransformContext<'_>) -> Result<()> {
        let directory = file.parent().unwrap_or_else(|| Path::new(""));
        let rewriter = StyleImportRewriter::new(ctx.runtime, &ctx.options);

        let body = std::mem::take(&mut module.body);
        module.body = rewriter.rewrite_items(directory, body, &mut ctx.artifacts)?;

        Ok(())
    }
}

/// A pipeline of module transforms to execute in order.
///
/// Transforms run in insertion order.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn ModuleTransform>>,
}

impl TransformPipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Pipeline that only rewrites style imports.
    pub fn style_imports() -> Self {
        let mut pipeline = Self::new();
        pipeline.push(Box::new(StyleImportTransform));
        pipeline
    }

    /// Add a transform to the pipeline.
    ///
    /// Transforms run in the order they are added.
    pub fn push(&mut self, transform: Box<dyn ModuleTransform>) {
        self.transforms.push(transform);
    }

    /// Add multiple transforms to the pipeline.
    pub fn extend(&mut self, transforms: impl IntoIterator<Item = Box<dyn ModuleTransform>>) {
        self.transforms.extend(transforms);
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Execute all transforms in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. Execution stops on error.
    pub fn execute(&self, file: &Path, module: &mut Module, ctx: &mut TransformContext<'_>) -> Result<()> {
        for transform in &self.transforms {
            tracing::debug!(transform = transform.name(), file = %file.display(), "Running transform");
            transform.transform(file, module, ctx)?;
        }

        Ok(())
    }

    /// List the names of all transforms in execution order.
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StyleImportError;
    use std::sync::{Arc, Mutex};
    use stylepass_system_runtime::NativeRuntime;

    /// Records its name into a shared log when run.
    struct RecordingTransform {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl ModuleTransform for RecordingTransform {
        fn name(&self) -> &str {
            self.name
        }

        fn transform(&self, _file: &Path, _module: &mut Module, _ctx: &mut TransformContext<'_>) -> Result<()> {
            self.log.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    struct FailingTransform;

    impl ModuleTransform for FailingTransform {
        fn name(&self) -> &str {
            "failing"
        }

        fn transform(&self, file: &Path, _module: &mut Module, _ctx: &mut TransformContext<'_>) -> Result<()> {
            Err(StyleImportError::Parse {
                path: file.to_path_buf(),
                message: "boom".to_string(),
            })
        }
    }

    fn empty_module() -> Module {
        Module {
            span: Default::default(),
            body: vec![],
            shebang: None,
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = TransformPipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.len(), 0);

        let runtime = NativeRuntime::new();
        let mut ctx = TransformContext::new(&runtime, TransformOptions::default());
        let mut module = empty_module();
        pipeline.execute(Path::new("/p/a.js"), &mut module, &mut ctx).unwrap();
        assert!(ctx.into_artifacts().is_empty());
    }

    #[test]
    fn test_transforms_run_in_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = TransformPipeline::new();
        pipeline.extend([
            Box::new(RecordingTransform {
                name: "first",
                log: log.clone(),
            }) as Box<dyn ModuleTransform>,
            Box::new(RecordingTransform {
                name: "second",
                log: log.clone(),
            }),
        ]);

        assert_eq!(pipeline.transform_names(), vec!["first", "second"]);

        let runtime = NativeRuntime::new();
        let mut ctx = TransformContext::new(&runtime, TransformOptions::default());
        let mut module = empty_module();
        pipeline.execute(Path::new("/p/a.js"), &mut module, &mut ctx).unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_error_stops_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Box::new(FailingTransform));
        pipeline.push(Box::new(RecordingTransform {
            name: "after",
            log: log.clone(),
        }));

        let runtime = NativeRuntime::new();
        let mut ctx = TransformContext::new(&runtime, TransformOptions::default());
        let mut module = empty_module();
        let result = pipeline.execute(Path::new("/p/a.js"), &mut module, &mut ctx);

        assert!(matches!(result, Err(StyleImportError::Parse { .. })));
        assert!(log.lock().unwrap().is_empty(), "later transforms must not run");
    }

    #[test]
    fn test_style_imports_pipeline() {
        let pipeline = TransformPipeline::style_imports();
        assert_eq!(pipeline.transform_names(), vec!["style-imports"]);
    }
}
