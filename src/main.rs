//! protodiff: structural diff for protobuf-style schemas.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use protodiff::{
    cli::{self, exit_codes},
    config::{CompareTypeConfig, DiffConfig, OutputConfig, ReportFormat},
    DiffOptions,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "protodiff")]
#[command(version)]
#[command(about = "Structural diff for protobuf schemas", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  No changes detected (or no --fail-on-change)
    1  Changes detected (with --fail-on-change)
    3  Error occurred

EXAMPLES:
    # Source-compatibility diff (match by name)
    protodiff diff v1/api.proto v2/api.proto

    # Wire-compatibility diff (match by field number)
    protodiff diff v1/api.proto v2/api.proto --by-number

    # CI gate
    protodiff diff v1/api.proto v2/api.proto --fail-on-change -o json

    # Follow one type across a rename
    protodiff compare-type v1/api.proto v2/api.proto --old-type User --new-type Account")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments for the `diff` subcommand
#[derive(Parser)]
struct DiffArgs {
    /// Path to the old schema entry file
    old: PathBuf,

    /// Path to the new schema entry file
    new: PathBuf,

    /// Import search root (defaults to each entry file's directory)
    #[arg(long, env = "PROTODIFF_ROOT")]
    root: Option<PathBuf>,

    /// Match fields and enum values by wire number instead of by name
    #[arg(long = "by-number")]
    by_number: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if any structural changes are detected
    #[arg(long)]
    fail_on_change: bool,
}

/// Arguments for the `compare-type` subcommand
#[derive(Parser)]
struct CompareTypeArgs {
    /// Path to the old schema entry file
    old: PathBuf,

    /// Path to the new schema entry file
    new: PathBuf,

    /// Type name in the old schema (simple or fully qualified)
    #[arg(long)]
    old_type: String,

    /// Type name in the new schema (defaults to --old-type)
    #[arg(long)]
    new_type: Option<String>,

    /// Import search root (defaults to each entry file's directory)
    #[arg(long, env = "PROTODIFF_ROOT")]
    root: Option<PathBuf>,

    /// Match fields and enum values by wire number instead of by name
    #[arg(long = "by-number")]
    by_number: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    output: ReportFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Exit with code 1 if any structural changes are detected
    #[arg(long)]
    fail_on_change: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two schema files
    Diff(DiffArgs),

    /// Compare two explicitly named types
    CompareType(CompareTypeArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(cli.command) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            tracing::error!("{err:#}");
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Diff(args) => {
            let config = DiffConfig {
                old: args.old,
                new: args.new,
                root: args.root,
                options: DiffOptions {
                    match_by_number: args.by_number,
                },
                output: OutputConfig {
                    format: args.output,
                    file: args.output_file,
                },
                fail_on_change: args.fail_on_change,
            };
            cli::run_diff(config)
        }

        Commands::CompareType(args) => {
            let config = CompareTypeConfig {
                old: args.old,
                new: args.new,
                root: args.root,
                old_type: args.old_type,
                new_type: args.new_type,
                options: DiffOptions {
                    match_by_number: args.by_number,
                },
                output: OutputConfig {
                    format: args.output,
                    file: args.output_file,
                },
                fail_on_change: args.fail_on_change,
            };
            cli::run_compare_type(config)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "protodiff", &mut io::stdout());
            Ok(exit_codes::SUCCESS)
        }
    }
}
