use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;

use gridprep_core::{fingerprint, CanonConfig, Canonicalizer, Error, Mode, GRAMMAR_NAME};

/// gridprep - GridLang prepass canonicalizer
///
/// Rewrites GridLang source into canonical text for the main parser.
#[derive(Parser)]
#[command(name = "gridprep", version, about, long_about = None)]
struct Cli {
    /// Suppress informational output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonicalize a source file and print the result
    Canonicalize {
        /// Path to source file, or - for stdin
        file: PathBuf,
        /// Action table: lowercase or canonical-spelling
        #[arg(long)]
        mode: Option<Mode>,
        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Keep comment text ahead of its marker
        #[arg(long)]
        keep_comments: bool,
        /// Print the rule trace to stderr
        #[arg(long)]
        trace: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a source file canonicalizes
    Check {
        /// Path to source file, or - for stdin
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the SHA-256 fingerprint of the canonical output
    Hash {
        /// Path to source file, or - for stdin
        file: PathBuf,
        /// Action table: lowercase or canonical-spelling
        #[arg(long)]
        mode: Option<Mode>,
    },

    /// Show version information
    Version,
}

enum CliError {
    Io(String),
    Prepass(Error),
}

impl From<Error> for CliError {
    fn from(e: Error) -> Self {
        CliError::Prepass(e)
    }
}

fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let outcome = match cli.command {
        Commands::Canonicalize {
            file,
            mode,
            config,
            keep_comments,
            trace,
            json,
        } => load_config(config.as_deref(), mode).and_then(|mut cfg| {
            cfg.keep_comments |= keep_comments;
            cfg.trace |= trace;
            cmd_canonicalize(&file, cfg, json)
        }),
        Commands::Check { file, json } => cmd_check(&file, json, quiet),
        Commands::Hash { file, mode } => cmd_hash(&file, mode.unwrap_or_default()),
        Commands::Version => {
            println!(
                "gridprep {} (gridprep-core {})",
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_VERSION")
            );
            println!("Grammar: {}", GRAMMAR_NAME);
            Ok(())
        }
    };

    let exit_code = match outcome {
        Ok(()) => 0,
        Err(err) => {
            report(&err);
            1
        }
    };

    process::exit(exit_code);
}

// ── Commands ──────────────────────────────────────────────

fn cmd_canonicalize(file: &Path, config: CanonConfig, json: bool) -> Result<(), CliError> {
    let source = read_source(file)?;
    let result = Canonicalizer::new(config)?.run(&source)?;

    if json {
        let value = serde_json::json!({
            "text": result.text,
            "passes": result.passes,
            "lines": result.lines,
            "fingerprint": fingerprint(&result.text),
            "trace": result.trace,
        });
        print_json(&value)?;
    } else {
        for entry in &result.trace {
            eprintln!("{}", entry.to_string().dimmed());
        }
        println!("{}", result.text);
    }
    Ok(())
}

fn cmd_check(file: &Path, json: bool, quiet: bool) -> Result<(), CliError> {
    let source = read_source(file)?;
    let outcome = Canonicalizer::new(CanonConfig::default())?.run(&source);

    match (outcome, json) {
        (Ok(result), true) => print_json(&serde_json::json!({
            "valid": true,
            "passes": result.passes,
            "lines": result.lines,
        })),
        (Ok(result), false) => {
            if !quiet {
                println!(
                    "{} {} ({} lines)",
                    "✓".green(),
                    "valid".green(),
                    result.lines
                );
            }
            Ok(())
        }
        (Err(e), true) => {
            print_json(&serde_json::json!({
                "valid": false,
                "error": e,
                "message": e.to_string(),
            }))?;
            process::exit(1);
        }
        (Err(e), false) => Err(e.into()),
    }
}

fn cmd_hash(file: &Path, mode: Mode) -> Result<(), CliError> {
    let source = read_source(file)?;
    let result = Canonicalizer::new(CanonConfig::with_mode(mode))?.run(&source)?;
    println!("{}", fingerprint(&result.text));
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────

fn read_source(file: &Path) -> Result<String, CliError> {
    if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::Io(format!("cannot read stdin: {}", e)))?;
        return Ok(buf);
    }
    std::fs::read_to_string(file)
        .map_err(|e| CliError::Io(format!("cannot read {}: {}", file.display(), e)))
}

/// Configuration file first, then the --mode override
fn load_config(path: Option<&Path>, mode: Option<Mode>) -> Result<CanonConfig, CliError> {
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::Io(format!("cannot read {}: {}", path.display(), e)))?;
            CanonConfig::from_json(&text)?
        }
        None => CanonConfig::default(),
    };
    if let Some(mode) = mode {
        config.mode = mode;
    }
    Ok(config)
}

fn print_json(value: &serde_json::Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::Io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn report(err: &CliError) {
    match err {
        CliError::Io(message) => eprintln!("{} {}", "error:".red().bold(), message),
        CliError::Prepass(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            if matches!(e, Error::Syntax(_)) {
                eprintln!("grammar = {:?}", GRAMMAR_NAME);
            }
        }
    }
}
