// catsync CLI - reconcile the UEX catalog against the Star Citizen Wiki

mod commands;
mod exit_codes;
mod outbox;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use catsync_config::{Settings, SettingsError};
use catsync_recon::ResourceType;

use commands::{ApplyArgs, Context, SyncOptions};
use exit_codes::{EXIT_CONFIG, EXIT_SUCCESS, EXIT_USAGE};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CATSYNC_BUILD_INFO"), ")");

#[derive(Parser)]
#[command(name = "catsync")]
#[command(about = "Reconcile the UEX catalog against the Star Citizen Wiki and queue corrections")]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    /// Settings file (default: <config dir>/catsync/settings.json)
    #[arg(long, global = true, env = "CATSYNC_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Cache directory, overriding `cache.dir`
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Warnings and errors only
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SyncFlags {
    /// TOML file overriding the built-in mapping
    #[arg(long, value_name = "FILE")]
    mapping: Option<PathBuf>,

    /// Neither read nor write cached responses
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args)]
struct ApplyFlags {
    /// Directory for submission requests, overriding `outbox.dir`
    #[arg(long, value_name = "DIR")]
    outbox: Option<PathBuf>,

    /// Exit 5 if any record failed
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both catalogs, diff them and queue corrections
    #[command(after_help = "\
Examples:
  catsync sync vehicles
  catsync sync items --no-cache
  catsync sync vehicles --mapping mapping.toml --dry-run")]
    Sync {
        /// vehicles or items
        resource: ResourceType,

        #[command(flatten)]
        flags: SyncFlags,

        /// Diff without writing the update queue
        #[arg(long)]
        dry_run: bool,
    },

    /// Replay pending corrections into the outbox
    #[command(after_help = "\
Examples:
  catsync apply vehicles
  catsync apply items --outbox ./requests --strict
  catsync apply vehicles --dry-run")]
    Apply {
        resource: ResourceType,

        #[command(flatten)]
        flags: ApplyFlags,

        /// Log each request without writing it or the queue
        #[arg(long)]
        dry_run: bool,
    },

    /// `sync` followed by `apply`
    Run {
        resource: ResourceType,

        #[command(flatten)]
        sync: SyncFlags,

        #[command(flatten)]
        apply: ApplyFlags,

        /// Write neither the queue nor the outbox
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the update queue
    Status {
        resource: ResourceType,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate and print the effective mapping
    Mapping {
        resource: ResourceType,

        /// TOML file overriding the built-in mapping
        #[arg(long, value_name = "FILE")]
        mapping: Option<PathBuf>,
    },

    /// Delete the persisted update queue
    Clear { resource: ResourceType },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn settings(err: SettingsError) -> Self {
        let hint = match &err {
            SettingsError::Parse { .. } => Some("settings.json is JSON; only whole-line // comments are allowed".to_string()),
            _ => None,
        };
        Self { code: EXIT_CONFIG, message: err.to_string(), hint }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = Settings::load(cli.config.as_deref()).map_err(CliError::settings)?;
    let ctx = Context::new(settings, cli.cache_dir);

    match cli.command {
        Commands::Sync { resource, flags, dry_run } => {
            let opts = SyncOptions { mapping: flags.mapping, no_cache: flags.no_cache, dry_run };
            commands::cmd_sync(&ctx, resource, &opts).map(|_| ())
        }
        Commands::Apply { resource, flags, dry_run } => {
            let args = ApplyArgs { outbox: flags.outbox, dry_run, strict: flags.strict };
            commands::cmd_apply(&ctx, resource, &args).map(|_| ())
        }
        Commands::Run { resource, sync, apply, dry_run } => {
            let sync = SyncOptions { mapping: sync.mapping, no_cache: sync.no_cache, dry_run };
            let apply = ApplyArgs { outbox: apply.outbox, dry_run, strict: apply.strict };
            commands::cmd_run(&ctx, resource, &sync, &apply)
        }
        Commands::Status { resource, json } => commands::cmd_status(&ctx, resource, json),
        Commands::Clear { resource } => commands::cmd_clear(&ctx, resource),
        Commands::Mapping { resource, mapping } => commands::cmd_mapping(resource, mapping),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, on stdout.
            let _ = e.print();
            return ExitCode::from(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
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
