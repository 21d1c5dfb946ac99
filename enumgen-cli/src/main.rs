//! enumgen CLI - enum extension generator for Rust projects.
//!
//! Features:
//! - Marker-driven opt-in (`#[enumgen::enum_extensions]`)
//! - Rayon-powered parallel snapshot loading
//! - Incremental caching: unchanged enums are never re-emitted
//! - Deterministic output unit naming

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use enumgen_core::{init_structured_logging, print_json, print_plain, Emitter, Enumgen};

mod emit;

#[derive(Parser, Debug)]
#[command(author, version, about = "Enum extension generator for Rust sources")]
pub struct Cli {
    /// Path to the root of the project to analyze
    #[arg(default_value = ".")]
    path: String,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Directory generated units are written to, relative to the project root
    /// (overrides `[output] dir` from enumgen.toml; default "generated")
    #[arg(long)]
    out_dir: Option<String>,

    /// Disable the cross-pass description cache
    #[arg(long)]
    no_cache: bool,

    /// Report what would be generated without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Enum names or patterns to ignore
    #[arg(long, num_args = 1..)]
    ignore: Vec<String>,

    /// Directory names to exclude from scanning
    #[arg(long, num_args = 1..)]
    exclude: Vec<String>,
}

fn main() -> Result<()> {
    init_structured_logging();
    let cli = Cli::parse();
    let root = PathBuf::from(&cli.path);

    let result = Enumgen::new(&root)
        .with_cache(!cli.no_cache)
        .dry_run(cli.dry_run)
        .ignore_patterns(cli.ignore.iter().cloned())
        .exclude_dirs(cli.exclude.iter().cloned())
        .run()?;

    if !cli.dry_run {
        // Flag wins over enumgen.toml `[output] dir`.
        let out_dir = cli
            .out_dir
            .as_deref()
            .or(result.output.dir.as_deref())
            .unwrap_or("generated");
        let mut emitter = emit::FileEmitter::new(&root.join(out_dir))?;
        for unit in &result.units {
            emitter.emit(unit)?;
        }
    }

    if cli.json || result.output.format.as_deref() == Some("json") {
        print_json(&result);
    } else {
        print_plain(&result);
    }

    Ok(())
}
