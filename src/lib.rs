//! `sysyc`: a whole-program SysY compiler.
//!
//! Source text goes in; Koopa-IR text or RISC-V assembly text comes out. The
//! pipeline is three stages, each its own module: [`lexer`]/[`parser`] build
//! an [`ast::CompUnit`], [`frontend`] lowers it to Koopa-IR text, and that
//! text is re-parsed by the real `koopa` crate into an object graph that
//! [`backend`] walks to emit assembly.

pub mod ast;
pub mod backend;
pub mod config;
pub mod error;
pub mod frontend;
pub mod lexer;
pub mod parser;
pub mod symbol;

use koopa::front::Driver;

use crate::ast::CompUnit;
use crate::error::{CompileError, CompileResult};

/// Parse SysY source into its AST, with no further lowering.
pub fn parse_only(src: &str) -> CompileResult<CompUnit> {
    tracing::debug!("parsing {} bytes of source", src.len());
    parser::parse(src)
}

/// Run the frontend: parse, then lower to Koopa-IR text.
pub fn compile_to_koopa(src: &str) -> CompileResult<String> {
    let unit = parse_only(src)?;
    tracing::debug!("lowering {} global item(s) to Koopa IR", unit.items.len());
    frontend::lower_program(&unit)
}

/// Run the full pipeline: parse, lower to Koopa-IR text, re-parse that text
/// into Koopa's object graph, then walk it to emit RISC-V assembly.
pub fn compile_to_riscv(src: &str) -> CompileResult<String> {
    let ir = compile_to_koopa(src)?;
    tracing::debug!("re-parsing lowered IR into the object graph");
    let program = Driver::from(ir)
        .generate_program()
        .map_err(|e| CompileError::Logic(format!("internal IR was rejected by koopa: {e:?}")))?;
    tracing::debug!("generating RISC-V assembly");
    backend::generate(&program)
}
