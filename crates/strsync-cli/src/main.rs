use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use strsync_config::StrSyncConfig;
use tracing::{debug, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod ui;

#[derive(Parser)]
#[command(
    name = "strsync",
    version,
    about = "Keep translated .strings files in step with their base resources"
)]
struct Cli {
    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only log warnings and errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Also write daily-rolling debug logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile one translation file with its base and write it back
    Sync {
        #[arg(short, long)]
        file: PathBuf,
        /// Directory holding the base resource (default: sibling Base.lproj)
        #[arg(long)]
        base_dir: Option<PathBuf>,
        /// Print the reconciled file instead of writing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Report keys the translation is missing
    Check {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        base_dir: Option<PathBuf>,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        /// Exit with an error when any key is missing
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Reconcile every file of one language under a project tree
    Batch {
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Base language directory name, e.g. Base.lproj
        #[arg(long)]
        base: Option<String>,
        /// Target language directory name, e.g. de.lproj
        #[arg(long)]
        lang: Option<String>,
        #[arg(long, default_value_t = false)]
        write: bool,
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Remove machine-inserted English fallback entries
    Clean {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Dump JSON schemas of the report types
    Schema {
        #[arg(long, default_value = "./docs/schemas")]
        out_dir: PathBuf,
    },
}

/// Per-invocation context shared by all subcommands.
pub struct Ctx {
    pub use_color: bool,
    pub cfg: StrSyncConfig,
}

trait Runnable {
    fn run(self, ctx: &Ctx) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, ctx: &Ctx) -> Result<()> {
        let cmd_name = format!("{:?}", self);
        debug!(event = "command_start", command = %cmd_name);

        let result = match self {
            Commands::Sync {
                file,
                base_dir,
                dry_run,
                backup,
                format,
            } => commands::sync::run_sync(ctx, file, base_dir, dry_run, backup, &format),

            Commands::Check {
                file,
                base_dir,
                format,
                strict,
            } => commands::check::run_check(ctx, file, base_dir, &format, strict),

            Commands::Batch {
                root,
                base,
                lang,
                write,
                backup,
                format,
            } => commands::batch::run_batch(ctx, root, base, lang, write, backup, &format),

            Commands::Clean { file, format } => commands::clean::run_clean(ctx, file, &format),

            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };

        match &result {
            Ok(_) => info!(event = "command_done", command = %cmd_name),
            Err(e) => error!(event = "command_failed", command = %cmd_name, error = %e),
        }
        result
    }
}

/// Console layer on stderr (stdout carries command output) plus an optional
/// file layer. The returned guard must live until exit to flush the file writer.
fn init_tracing(quiet: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let file_appender = rolling::daily(dir, "strsync.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let cfg = strsync_config::load_config().unwrap_or_default();
    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| cfg.log_dir.as_ref().map(PathBuf::from));
    let _guard = init_tracing(cli.quiet, log_dir.as_deref());

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    let ctx = Ctx { use_color, cfg };
    cli.cmd.run(&ctx)
}
