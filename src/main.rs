//! Process entry point: `sysyc <mode> <input> -o <output> [-v]` (§6 CLI).

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use sysyc::config::{CompilerConfig, EmitMode};
use sysyc::{compile_to_koopa, compile_to_riscv, parse_only};

/// A whole-program SysY-to-RISC-V compiler.
#[derive(Parser, Debug)]
#[command(name = "sysyc")]
struct Cli {
    /// Which stage to stop at: `-koopa` (IR text), `-riscv` (assembly), or
    /// `-debug` (AST dump). Written with the source language's own leading
    /// dash, so `clap` needs `allow_hyphen_values` to accept it positionally.
    #[arg(value_enum, allow_hyphen_values = true)]
    mode: EmitMode,

    /// SysY source file.
    input: PathBuf,

    /// Output file.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Raise the tracing filter to `debug` regardless of `RUST_LOG`.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    let config = CompilerConfig::new(cli.mode, cli.input, cli.output).with_verbose(cli.verbose);

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("sysyc={default_level}"))),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&config) {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(config: &CompilerConfig) -> sysyc::error::CompileResult<()> {
    tracing::info!("reading {}", config.input.display());
    let src = fs::read_to_string(&config.input)?;

    let rendered = match config.mode {
        EmitMode::Debug => {
            let unit = parse_only(&src)?;
            format!("{:#?}\n", unit)
        }
        EmitMode::Koopa => compile_to_koopa(&src)?,
        EmitMode::Riscv => compile_to_riscv(&src)?,
    };

    tracing::info!("writing {}", config.output.display());
    fs::write(&config.output, rendered)?;
    Ok(())
}
