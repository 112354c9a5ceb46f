//! Rewriting of style-file imports in a module's statement list.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Given `import styles from "./btn.module.scss"`, the rewriter compiles the
//! stylesheet, records the CSS artifact and replaces the import with
//!
//! ```js
//! import "./btn.css";
//! var styles = { primary: "ui_xYz__primary" };
//! ```
//!
//! Plain stylesheets keep their import as written, pointed at the compiled
//! `.css` file instead. Every other statement is carried over unchanged.

use std::path::Path;

use stylepass_sass::{SassCompiler, Syntax, normalize_path};
use stylepass_system_runtime::SystemRuntime;
use swc_core::common::{DUMMY_SP, SyntaxContext};
use swc_core::ecma::ast::{
    BindingIdent, Decl, Expr, Ident, IdentName, ImportDecl, ImportPhase, ImportSpecifier, KeyValueProp, Lit,
    ModuleDecl, ModuleItem, ObjectLit, Pat, Prop, PropName, PropOrSpread, Stmt, Str, VarDecl, VarDeclKind,
    VarDeclarator,
};

use crate::artifact::{CompiledStyle, StyleArtifacts};
use crate::css_modules::{CssOptions, ExportTable, StyleKind, transform_css};
use crate::error::{Result, StyleImportError};
use crate::options::TransformOptions;
use crate::output_path::derive_output_path;

/// Stylesheet extensions the rewriter handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleExtension {
    Css,
    Scss,
    Sass,
    Styl,
}

impl StyleExtension {
    /// The style extension of an import specifier, if it has one.
    pub fn from_specifier(specifier: &str) -> Option<Self> {
        match Path::new(specifier).extension()?.to_str()? {
            "css" => Some(StyleExtension::Css),
            "scss" => Some(StyleExtension::Scss),
            "sass" => Some(StyleExtension::Sass),
            "styl" => Some(StyleExtension::Styl),
            _ => None,
        }
    }

    /// Syntax for extensions that need the Sass compiler.
    fn sass_syntax(self) -> Option<Syntax> {
        match self {
            StyleExtension::Scss => Some(Syntax::Scss),
            StyleExtension::Sass => Some(Syntax::Indented),
            StyleExtension::Css | StyleExtension::Styl => None,
        }
    }
}

/// How a module item relates to the rewriter.
enum ItemClass {
    NotAnImport(ModuleItem),
    ImportWithIrrelevantExtension(ImportDecl),
    ImportWithStyleExtension(ImportDecl, StyleExtension),
}

impl ItemClass {
    fn of(item: ModuleItem) -> Self {
        match item {
            ModuleItem::ModuleDecl(ModuleDecl::Import(import)) => {
                // Type-only imports are erased by TypeScript; they never load CSS.
                if import.type_only {
                    return ItemClass::ImportWithIrrelevantExtension(import);
                }
                match StyleExtension::from_specifier(&import.src.value) {
                    Some(ext) => ItemClass::ImportWithStyleExtension(import, ext),
                    None => ItemClass::ImportWithIrrelevantExtension(import),
                }
            }
            other => ItemClass::NotAnImport(other),
        }
    }
}

/// Rewrites the style imports of one module.
pub struct StyleImportRewriter<'a> {
    runtime: &'a dyn SystemRuntime,
    options: &'a TransformOptions,
}

impl<'a> StyleImportRewriter<'a> {
    pub fn new(runtime: &'a dyn SystemRuntime, options: &'a TransformOptions) -> Self {
        Self { runtime, options }
    }

    /// Rebuild `items`, replacing each style import.
    ///
    /// `directory` is the directory of the module the items came from. Compiled
    /// stylesheets are appended to `artifacts` in statement order.
    ///
    /// # Errors
    ///
    /// The first failing import aborts the rewrite. Artifacts recorded for
    /// earlier imports stay in `artifacts`.
    pub fn rewrite_items(
        &self,
        directory: &Path,
        items: Vec<ModuleItem>,
        artifacts: &mut StyleArtifacts,
    ) -> Result<Vec<ModuleItem>> {
        let mut rewritten = Vec::with_capacity(items.len());

        for item in items {
            match ItemClass::of(item) {
                ItemClass::NotAnImport(item) => rewritten.push(item),
                ItemClass::ImportWithIrrelevantExtension(import) => {
                    rewritten.push(ModuleItem::ModuleDecl(ModuleDecl::Import(import)))
                }
                ItemClass::ImportWithStyleExtension(import, ext) => {
                    rewritten.extend(self.rewrite_import(directory, import, ext, artifacts)?);
                }
            }
        }

        Ok(rewritten)
    }

    fn rewrite_import(
        &self,
        directory: &Path,
        import: ImportDecl,
        ext: StyleExtension,
        artifacts: &mut StyleArtifacts,
    ) -> Result<Vec<ModuleItem>> {
        let specifier = import.src.value.to_string();
        let resolved = normalize_path(&directory.join(&specifier));

        let source = self.read_style(&specifier, &resolved)?;
        let css = match ext.sass_syntax() {
            Some(syntax) => SassCompiler::new(self.runtime)
                .with_load_paths(self.options.load_paths.iter().cloned())
                .compile(&resolved, &source, syntax)?,
            None => source,
        };

        let kind = StyleKind::classify(&resolved);
        let binding = match kind {
            StyleKind::Module => Some(
                style_binding(&import)
                    .ok_or_else(|| StyleImportError::UnsupportedImportShape {
                        specifier: specifier.clone(),
                    })?,
            ),
            StyleKind::Plain => None,
        };

        let root = self.options.root_or(directory);
        let pattern = self.options.class_name_pattern();
        let transformed = transform_css(
            &resolved,
            &css,
            kind,
            &CssOptions {
                project_root: root,
                pattern: &pattern,
                minify: self.options.minify,
            },
        )?;

        let output = derive_output_path(&resolved, directory, root);
        tracing::debug!(
            import = %specifier,
            output = %output.specifier,
            artifact = %output.artifact,
            module = kind.is_module(),
            "Rewrote style import"
        );
        artifacts.push(CompiledStyle::new(output.artifact, transformed.code));

        match binding {
            Some(binding) => {
                let exports = transformed.exports.unwrap_or_default();
                Ok(vec![side_effect_import(&output.specifier), class_map(binding, &exports)])
            }
            None => Ok(vec![ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
                src: Box::new(Str {
                    span: import.src.span,
                    value: output.specifier.into(),
                    raw: None,
                }),
                ..import
            }))]),
        }
    }

    fn read_style(&self, specifier: &str, path: &Path) -> Result<String> {
        self.runtime.file_read_string(path).map_err(|source| {
            if source.is_not_found() {
                StyleImportError::Resolution {
                    specifier: specifier.to_string(),
                    path: path.to_path_buf(),
                    source,
                }
            } else {
                StyleImportError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }
}

/// The default binding, else the namespace binding, of an import.
fn style_binding(import: &ImportDecl) -> Option<Ident> {
    let default = import.specifiers.iter().find_map(|s| match s {
        ImportSpecifier::Default(default) => Some(default.local.clone()),
        _ => None,
    });

    default.or_else(|| {
        import.specifiers.iter().find_map(|s| match s {
            ImportSpecifier::Namespace(namespace) => Some(namespace.local.clone()),
            _ => None,
        })
    })
}

fn side_effect_import(specifier: &str) -> ModuleItem {
    ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
        span: DUMMY_SP,
        specifiers: vec![],
        src: Box::new(Str {
            span: DUMMY_SP,
            value: specifier.into(),
            raw: None,
        }),
        type_only: false,
        with: None,
        phase: ImportPhase::Evaluation,
    }))
}

/// `var <binding> = { <local>: "<generated>", ... };`
fn class_map(binding: Ident, exports: &ExportTable) -> ModuleItem {
    let props = exports
        .iter()
        .map(|(local, generated)| {
            PropOrSpread::Prop(Box::new(Prop::KeyValue(KeyValueProp {
                key: prop_name(local),
                value: Box::new(Expr::Lit(Lit::Str(Str {
                    span: DUMMY_SP,
                    value: generated.into(),
                    raw: None,
                }))),
            })))
        })
        .collect();

    let declarator = VarDeclarator {
        span: DUMMY_SP,
        name: Pat::Ident(BindingIdent {
            id: binding,
            type_ann: None,
        }),
        init: Some(Box::new(Expr::Object(ObjectLit { span: DUMMY_SP, props }))),
        definite: false,
    };

    ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind: VarDeclKind::Var,
        declare: false,
        decls: vec![declarator],
    }))))
}

fn prop_name(name: &str) -> PropName {
    if is_identifier_name(name) {
        PropName::Ident(IdentName::new(name.into(), DUMMY_SP))
    } else {
        PropName::Str(Str {
            span: DUMMY_SP,
            value: name.into(),
            raw: None,
        })
    }
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
