// qsogrid CLI - grid-locator resolution for amateur radio contact logs

mod exit_codes;
mod geo;
mod pass;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_INVALID_CONFIG, EXIT_NO_CREDENTIALS, EXIT_RUNTIME, EXIT_STORE_UNAVAILABLE, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "qsogrid")]
#[command(about = "Resolve the grid locator each station operated from")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Geolocation cache options shared by commands that may fall back to it.
#[derive(Args, Clone, Debug, Default)]
pub struct CacheArgs {
    /// SQLite location cache (default from settings.toml)
    #[arg(long, env = "QSOGRID_CACHE", value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Never query the external directory; local tiers only
    #[arg(long)]
    pub no_directory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full resolution pass from a .qsogrid.toml config
    #[command(after_help = "\
Examples:
  qsogrid run seqp2017.qsogrid.toml
  qsogrid run seqp2017.qsogrid.toml --json > result.json
  qsogrid run seqp2017.qsogrid.toml --output result.json --no-directory")]
    Run {
        /// Path to the .qsogrid.toml config file
        config: PathBuf,

        /// Print the pass result as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to file (overrides output.json)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Resolve selected callsigns against a config's evidence
    #[command(after_help = "\
Examples:
  qsogrid resolve seqp2017.qsogrid.toml K3JT NJ0P
  qsogrid resolve seqp2017.qsogrid.toml W1AW/P --json")]
    Resolve {
        /// Path to the .qsogrid.toml config file
        config: PathBuf,

        /// Callsigns to resolve
        #[arg(required = true, value_name = "CALL")]
        calls: Vec<String>,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Print the per-callsign QTH table or its precision statistics
    #[command(after_help = "\
Examples:
  qsogrid qths seqp2017.qsogrid.toml
  qsogrid qths seqp2017.qsogrid.toml --output qths.csv
  qsogrid qths seqp2017.qsogrid.toml --stats --json")]
    Qths {
        /// Path to the .qsogrid.toml config file
        config: PathBuf,

        /// Locator precision by provenance instead of the table
        #[arg(long)]
        stats: bool,

        /// Output JSON instead of CSV / table
        #[arg(long)]
        json: bool,

        /// Write to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Look callsigns up through the geolocation cache
    #[command(after_help = "\
Examples:
  qsogrid geolocate K3JT
  qsogrid geolocate K3JT VE3/K3JT --no-directory --json")]
    Geolocate {
        /// Callsigns to look up
        #[arg(required = true, value_name = "CALL")]
        calls: Vec<String>,

        /// Output JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Check locators for structural validity (exit 3 if any is invalid)
    #[command(after_help = "\
Examples:
  qsogrid check-grid FN20 EM29fx
  qsogrid check-grid 123456 --quiet || echo bad")]
    CheckGrid {
        /// Locators to check
        #[arg(required = true, value_name = "LOCATOR")]
        locators: Vec<String>,

        /// No output; exit code only
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Save directory (QRZ) credentials; the password is read from stdin
    #[command(after_help = "\
Examples:
  echo \"$QRZ_PASSWORD\" | qsogrid login --username K3JT")]
    Login {
        #[arg(long, short = 'u')]
        username: String,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")",
        "\nengine:  qsogrid-recon ",
        env!("CARGO_PKG_VERSION"),
        "\ntarget:  ",
        env!("TARGET"),
    )
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Also installs the `log` bridge, so library records come through.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            config,
            json,
            output,
            cache,
        } => pass::cmd_run(config, json, output, cache),
        Commands::Resolve {
            config,
            calls,
            json,
            cache,
        } => pass::cmd_resolve(config, calls, json, cache),
        Commands::Qths {
            config,
            stats,
            json,
            output,
        } => pass::cmd_qths(config, stats, json, output),
        Commands::Geolocate { calls, json, cache } => geo::cmd_geolocate(calls, json, cache),
        Commands::CheckGrid { locators, quiet } => geo::cmd_check_grid(locators, quiet),
        Commands::Login { username } => geo::cmd_login(username),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError {
            code,
            message,
            hint,
        }) => {
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

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            hint: None,
        }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, msg)
    }

    pub fn no_credentials() -> Self {
        Self::new(EXIT_NO_CREDENTIALS, "no directory credentials configured").with_hint(
            "run `qsogrid login --username CALL`, set QSOGRID_QRZ_USERNAME / QSOGRID_QRZ_PASSWORD, or pass --no-directory",
        )
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<qsogrid_recon::ReconError> for CliError {
    fn from(err: qsogrid_recon::ReconError) -> Self {
        use qsogrid_recon::ReconError;
        match err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                Self::config(err.to_string())
            }
            ReconError::Store(e) => e.into(),
        }
    }
}

impl From<qsogrid_geocache::CacheError> for CliError {
    fn from(err: qsogrid_geocache::CacheError) -> Self {
        Self::new(EXIT_STORE_UNAVAILABLE, err.to_string())
            .with_hint("check --cache / cache.path in settings.toml")
    }
}

impl From<qsogrid_io::IngestError> for CliError {
    fn from(err: qsogrid_io::IngestError) -> Self {
        Self::runtime(err.to_string())
    }
}

impl From<qsogrid_config::SettingsError> for CliError {
    fn from(err: qsogrid_config::SettingsError) -> Self {
        Self::config(err.to_string())
    }
}
