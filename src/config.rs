//! Compiler configuration.
//!
//! Unlike a project-manifest-driven compiler, `sysyc` has no external TOML
//! configuration surface: the only structured input is SysY source text, and the
//! only structured output is IR text or assembly text, both produced directly by
//! the frontend/backend printers. This module exists to hold the small set of
//! run-level choices (emit mode, verbosity) in one place rather than threading
//! raw booleans through every function, the way the CLI layer hands off to the
//! library layer.

use std::path::PathBuf;

/// What the pipeline should stop at and write out.
///
/// Named with the source language's own leading dash (`-koopa`, not `koopa`)
/// so the CLI's positional `mode` argument matches §6 exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmitMode {
    /// `-koopa`: stop after frontend lowering, write Koopa-IR text.
    #[value(name = "-koopa")]
    Koopa,
    /// `-riscv`: run the full pipeline, write RISC-V assembly.
    #[value(name = "-riscv")]
    Riscv,
    /// `-debug`: stop after parsing, write a textual AST dump.
    #[value(name = "-debug")]
    Debug,
}

/// Resolved configuration for a single compilation run.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    pub mode: EmitMode,
    pub input: PathBuf,
    pub output: PathBuf,
    pub verbose: bool,
}

impl CompilerConfig {
    pub fn new(mode: EmitMode, input: PathBuf, output: PathBuf) -> Self {
        CompilerConfig {
            mode,
            input,
            output,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_verbose() {
        let cfg = CompilerConfig::new(EmitMode::Riscv, "a.c".into(), "a.s".into())
            .with_verbose(true);
        assert!(cfg.verbose);
        assert_eq!(cfg.mode, EmitMode::Riscv);
    }
}
