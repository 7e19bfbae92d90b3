use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use projdash::cli::CommandContext;
use projdash::cli::commands;
use projdash::types::{Category, ProjectType};

#[derive(Parser)]
#[command(name = "projdash")]
#[command(
    version,
    about = "Discover, classify and catalogue the projects on your disk"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, global = true, help = "Extra config file merged over the defaults")]
    config: Option<PathBuf>,

    #[arg(long, global = true, env = "PROJDASH_ROOT", help = "Scan root override")]
    root: Option<PathBuf>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the root and sync discovered projects into the store
    Scan {
        #[arg(long = "dry-run", help = "Only list discovered locations")]
        dry_run: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Classify a single directory
    Detect {
        #[arg(help = "Directory to classify")]
        path: PathBuf,
        #[arg(long, help = "Save the result to the store")]
        save: bool,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// List stored projects
    List {
        #[arg(long, help = "Filter by category (personal, professional)")]
        category: Option<Category>,
        #[arg(long = "type", help = "Filter by project type")]
        project_type: Option<ProjectType>,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Show one stored project
    Show {
        #[arg(help = "Project id")]
        id: String,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Remove a project from the store
    Remove {
        #[arg(help = "Project id")]
        id: String,
    },

    /// Show store statistics
    Stats {
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
    },

    /// Write a timestamped copy of the store
    Backup,

    /// Watch the scan root for changes (Ctrl-C to stop)
    Watch {
        #[arg(long, help = "Resync the store when changes are seen")]
        sync: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mprojdash encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Default hook prints the backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Commands that must work even with a broken config file
    match &cli.command {
        Commands::Config {
            action: ConfigAction::Path,
        } => {
            commands::config::path()?;
            return Ok(());
        }
        Commands::Config {
            action: ConfigAction::Init { global, force },
        } => {
            commands::config::init(*global, *force)?;
            return Ok(());
        }
        _ => {}
    }

    let ctx = CommandContext::load(cli.config.as_deref(), cli.root)?;
    let rt = Runtime::new()?;

    match cli.command {
        Commands::Scan { dry_run, format } => {
            rt.block_on(commands::scan::run(&ctx, dry_run, &format))?;
        }
        Commands::Detect { path, save, format } => {
            rt.block_on(commands::detect::run(&ctx, &path, save, &format))?;
        }
        Commands::List {
            category,
            project_type,
            format,
        } => {
            rt.block_on(commands::list::run(&ctx, category, project_type, &format))?;
        }
        Commands::Show { id, format } => {
            rt.block_on(commands::show::run(&ctx, &id, &format))?;
        }
        Commands::Remove { id } => {
            rt.block_on(commands::remove::run(&ctx, &id))?;
        }
        Commands::Stats { format } => {
            rt.block_on(commands::stats::run(&ctx, &format))?;
        }
        Commands::Backup => {
            rt.block_on(commands::backup::run(&ctx))?;
        }
        Commands::Watch { sync } => {
            rt.block_on(commands::watch::run(&ctx, sync))?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(&ctx, &format)?,
            ConfigAction::Path | ConfigAction::Init { .. } => {}
        },
    }

    Ok(())
}
