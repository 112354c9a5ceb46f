//! Source-level driver: parse a JavaScript/TypeScript file, run a pipeline
//! over it and print the result.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::Path;

use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, SourceMap};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config, Emitter};
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, StringInput, Syntax, TsSyntax};

use crate::error::{Result, StyleImportError};
use crate::transform::{TransformContext, TransformPipeline};

/// Parser syntax for a source file, chosen by extension.
///
/// `.ts`, `.mts` and `.cts` parse as TypeScript, `.tsx` as TypeScript with
/// JSX, everything else as JavaScript with JSX.
pub fn syntax_for(file: &Path) -> Syntax {
    match file.extension().and_then(|ext| ext.to_str()) {
        Some("ts" | "mts" | "cts") => Syntax::Typescript(TsSyntax::default()),
        Some("tsx") => Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        }),
    }
}

/// Parse `source` as an ES module.
pub fn parse_module(file: &Path, source: &str) -> Result<(Module, Lrc<SourceMap>)> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(Lrc::new(FileName::Real(file.to_path_buf())), source.to_string());

    let lexer = Lexer::new(syntax_for(file), EsVersion::EsNext, StringInput::from(&*fm), None);
    let mut parser = Parser::new_from(lexer);

    let module = parser.parse_module().map_err(|e| StyleImportError::Parse {
        path: file.to_path_buf(),
        message: e.into_kind().msg().into_owned(),
    })?;

    // Recoverable errors still mean the input was not valid.
    if let Some(e) = parser.take_errors().into_iter().next() {
        return Err(StyleImportError::Parse {
            path: file.to_path_buf(),
            message: e.into_kind().msg().into_owned(),
        });
    }

    Ok((module, cm))
}

/// Print `module` back to source text.
pub fn emit_module(file: &Path, module: &Module, cm: Lrc<SourceMap>) -> Result<String> {
    let mut buf = Vec::new();
    {
        let writer = JsWriter::new(cm.clone(), "\n", &mut buf, None);
        let mut emitter = Emitter {
            cfg: Config::default(),
            comments: None,
            cm,
            wr: writer,
        };
        emitter.emit_module(module).map_err(|source| StyleImportError::Emit {
            path: file.to_path_buf(),
            source,
        })?;
    }

    String::from_utf8(buf).map_err(|e| StyleImportError::Emit {
        path: file.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

/// Parse `source`, run `pipeline` over it and print the transformed module.
///
/// Artifacts produced by the pipeline are appended to `ctx`.
pub fn transform_source(
    file: &Path,
    source: &str,
    pipeline: &TransformPipeline,
    ctx: &mut TransformContext<'_>,
) -> Result<String> {
    let (mut module, cm) = parse_module(file, source)?;
    pipeline.execute(file, &mut module, ctx)?;
    emit_module(file, &module, cm)
}
