use clap::Parser;
use filesort::cli::{RunOptions, SortCommand, run_cli_with_options};
use filesort::output::{OutputFormatter, Verbosity};
use std::path::PathBuf;
use std::process;

/// Sort a directory tree into category folders by file extension.
#[derive(Debug, Parser)]
#[command(name = "filesort", version, about)]
struct Args {
    /// Directory to sort
    path: PathBuf,

    /// Configuration file (default: ./.filesortrc.toml, then ~/.config/filesort/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show what would be moved without changing anything
    #[arg(long, conflicts_with = "report_only")]
    dry_run: bool,

    /// Only list the existing category directories
    #[arg(long)]
    report_only: bool,

    /// Do not unpack archives after sorting
    #[arg(long)]
    no_unpack: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,

    /// Append activity to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Also report skipped archives
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();

    let verbosity = if args.quiet {
        Verbosity::Quiet
    } else if args.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };

    if verbosity != Verbosity::Quiet && !args.json {
        OutputFormatter::header("filesort - sort a directory tree by file type");
    }

    let command = if args.report_only {
        SortCommand::Report
    } else {
        SortCommand::Sort {
            dry_run: args.dry_run,
        }
    };
    let options = RunOptions {
        config_path: args.config,
        no_unpack: args.no_unpack,
        json: args.json,
        verbosity,
        log_file: args.log_file,
    };

    if let Err(e) = run_cli_with_options(command, &args.path, &options) {
        OutputFormatter::error(&format!("Error: {}", e));
        process::exit(1);
    }
}
