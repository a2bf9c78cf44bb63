// StockFern CLI - reconcile picklists against a stock catalog

mod documents;
mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use stockfern_io::IoError;
use stockfern_recon::config::{ExtractionMode, DEFAULT_CONTEXT_WINDOW, DEFAULT_INLINE_LABEL};
use stockfern_recon::ReconError;

use exit_codes::{io_exit_code, recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "stockfern")]
#[command(about = "Reconcile picklist PDFs against a stock catalog spreadsheet")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// No progress or summary lines on stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full reconciliation from a TOML config file
    #[command(after_help = "\
Examples:
  stockfern run daily.toml
  stockfern run daily.toml --out-dir out/
  stockfern run daily.toml --json > result.json
  stockfern run daily.toml --fuzzy-min-score 75

Exit codes:
  0  every candidate resolved
  3  outputs written, some candidates quarantined (see unknown_sku.xlsx)")]
    Run {
        /// Path to the config file
        config: PathBuf,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the full result as JSON to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Directory for the workbooks (overrides [output].dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Lowest accepted fuzzy score, 0-100 (overrides [matching])
        #[arg(long)]
        fuzzy_min_score: Option<u8>,
    },

    /// Extract candidate records from picklists without matching
    #[command(after_help = "\
Examples:
  stockfern extract picklist.pdf
  stockfern extract a.pdf b.txt --out candidates.csv
  stockfern extract picklist.pdf --json --window 2
  stockfern extract layout.txt --mode inline --label 'Item:'")]
    Extract {
        /// Picklist files (.pdf, .txt, .json)
        #[arg(required = true)]
        documents: Vec<PathBuf>,

        /// Lines before a quantity joined into its context
        #[arg(long, default_value_t = DEFAULT_CONTEXT_WINDOW)]
        window: usize,

        /// Picklist layout: block, inline, or auto (inline on pages without blocks)
        #[arg(long, default_value = "auto", value_parser = parse_mode)]
        mode: ExtractionMode,

        /// Marker before the item on inline lines; empty matches any line
        #[arg(long, default_value = DEFAULT_INLINE_LABEL)]
        label: String,

        /// Write candidates to this file (.json, otherwise CSV)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print candidates as JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  stockfern validate daily.toml")]
    Validate {
        /// Path to the config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockfern-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockfern-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn parse_mode(s: &str) -> Result<ExtractionMode, String> {
    s.parse()
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            out_dir,
            fuzzy_min_score,
        } => recon::cmd_run(recon::RunArgs {
            config,
            json,
            output,
            out_dir,
            fuzzy_min_score,
            quiet: cli.quiet,
        }),
        Commands::Extract {
            documents,
            window,
            mode,
            label,
            out,
            json,
        } => recon::cmd_extract(recon::ExtractArgs {
            documents,
            window,
            mode,
            label,
            out,
            json,
            quiet: cli.quiet,
        }),
        Commands::Validate { config } => recon::cmd_validate(config, cli.quiet),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Engine error with its registered exit code.
    pub fn recon(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MalformedInput { .. } => {
                Some("check [catalog] code/attribute/quantity and the candidate files".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }

    /// Import/export error with its registered exit code.
    pub fn from_io(err: IoError) -> Self {
        let hint = match &err {
            IoError::UnsupportedFormat(_) => {
                Some("catalogs can be .csv, .tsv, .xlsx, .xlsm, .xls, .xlsb or .ods".to_string())
            }
            _ => None,
        };
        Self { code: io_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
