//! Typed IR Driver
//!
//! Builds the bundled sample modules, verifies them and emits either the
//! textual IR or its JSON encoding. JSON modules can be loaded back and
//! re-verified.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use tir_common::Diagnostic;
use tir_ir::samples::{find_sample, SAMPLES};
use tir_ir::{print_module, Module, VerifierConfig};

#[derive(Parser)]
#[command(name = "tirc")]
#[command(about = "Typed IR construction and verification toolkit")]
#[command(version = "0.1.0")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Emit {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in sample modules
    List,

    /// Build a sample module and print it
    Build {
        /// Sample name (see `tirc list`)
        sample: String,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        emit: Emit,

        /// Write the output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip verification before emitting
        #[arg(long)]
        no_verify: bool,

        /// Stop after this many diagnostics (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_diagnostics: usize,
    },

    /// Load a module from JSON and verify it
    Verify {
        /// JSON file produced by `tirc build --emit json`
        input: PathBuf,

        /// Stop after this many diagnostics (0 = unlimited)
        #[arg(long, default_value_t = 0)]
        max_diagnostics: usize,

        /// Do not warn about unreachable blocks
        #[arg(long)]
        no_unreachable: bool,

        /// Verify only this function
        #[arg(long)]
        function: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::init();
    }

    match cli.command {
        Commands::List => {
            for sample in SAMPLES {
                println!("{:<10} {}", sample.name, sample.description);
            }
            Ok(())
        }
        Commands::Build {
            sample,
            emit,
            output,
            no_verify,
            max_diagnostics,
        } => build_command(&sample, emit, output.as_deref(), no_verify, max_diagnostics),
        Commands::Verify {
            input,
            max_diagnostics,
            no_unreachable,
            function,
        } => verify_command(
            &input,
            function.as_deref(),
            &VerifierConfig {
                max_diagnostics,
                report_unreachable: !no_unreachable,
            },
        ),
    }
}

fn build_command(
    name: &str,
    emit: Emit,
    output_path: Option<&Path>,
    no_verify: bool,
    max_diagnostics: usize,
) -> Result<()> {
    let Some(sample) = find_sample(name) else {
        let known: Vec<_> = SAMPLES.iter().map(|s| s.name).collect();
        bail!("unknown sample '{}' (available: {})", name, known.join(", "));
    };
    let module = (sample.build)().with_context(|| format!("failed to build sample '{name}'"))?;
    debug!("built sample '{}' with {} functions", name, module.functions().len());

    if !no_verify {
        let config = VerifierConfig {
            max_diagnostics,
            ..VerifierConfig::default()
        };
        let report = module.verify_with(&config).map_err(|err| {
            print_diagnostics(err.diagnostics());
            err
        })?;
        print_diagnostics(report.diagnostics());
    }

    let text = match emit {
        Emit::Text => print_module(&module),
        Emit::Json => module.to_json()?,
    };

    match output_path {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
            info!("wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn verify_command(input: &Path, function: Option<&str>, config: &VerifierConfig) -> Result<()> {
    let json = fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let module = Module::from_json(&json).with_context(|| format!("failed to load {}", input.display()))?;

    let (subject, report) = match function {
        Some(name) => {
            let Some(func) = module.function_by_name(name) else {
                bail!("module '{}' has no function '@{}'", module.name(), name);
            };
            (format!("@{name}"), tir_ir::verify_function(&module, func, config))
        }
        None => (module.name().to_string(), tir_ir::verify_module(&module, config)),
    };
    print_diagnostics(report.diagnostics());
    println!("{}: {}", subject, report.summary());

    report.into_result()?;
    Ok(())
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}
