use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mirrorsort::config::{expand_path, LoggingConfig};
use mirrorsort::tui;
use mirrorsort::{
    spawn_run, usage, version, Config, ConflictPolicy, HealthCheck, ReconcileSummary, RunEvent,
    ReconciliationTask,
};

#[derive(Parser)]
#[command(name = "mirrorsort")]
#[command(about = "Reorganize a folder tree to mirror the categories of a reference tree")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the configuration file
    Init {
        /// Default folder whose files get reorganized
        #[arg(long)]
        target: Option<String>,

        /// Default folder whose categories are mirrored
        #[arg(long)]
        reference: Option<String>,
    },

    /// Move target files into the categories found in the reference tree
    Run {
        /// Folder whose files get reorganized (defaults to config)
        target: Option<String>,

        /// Folder whose categories are mirrored (defaults to config)
        reference: Option<String>,

        /// Also move files whose category carries the exclusion marker
        #[arg(long)]
        include_marked: bool,

        /// Case-insensitive marker for excluded categories
        #[arg(long, conflicts_with = "pattern")]
        marker: Option<String>,

        /// Regex for excluded categories
        #[arg(long)]
        pattern: Option<String>,

        /// What to do when the destination file already exists
        #[arg(long, value_enum)]
        on_conflict: Option<ConflictPolicy>,

        /// Report planned moves without touching any file
        #[arg(long)]
        dry_run: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// System health check and diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone();
    let config = match (&cli.command, &config_path) {
        // init may point --config at a file that does not exist yet
        (Some(Commands::Init { .. }), Some(path)) if !path.exists() => Config::default(),
        _ => load_config(config_path.clone())?,
    };

    // TUI keeps its own log panel; stderr logging breaks raw mode
    let is_tui = cli.command.is_none();
    if !is_tui {
        init_logging(cli.verbose, &config.logging)?;
        info!("Starting mirrorsort v{}", env!("CARGO_PKG_VERSION"));
    }

    usage::record_open(&config.usage_log);

    match cli.command {
        None => cmd_tui(config).await,
        Some(Commands::Init { target, reference }) => {
            cmd_init(target, reference, config_path, &config)
        }
        Some(Commands::Run {
            target,
            reference,
            include_marked,
            marker,
            pattern,
            on_conflict,
            dry_run,
            json,
        }) => {
            let args = RunArgs {
                target,
                reference,
                include_marked,
                marker,
                pattern,
                on_conflict,
                dry_run,
                json,
            };
            cmd_run(args, &config).await
        }
        Some(Commands::Doctor) => cmd_doctor(&config),
    }
}

/// Initialize logging based on verbosity level and the logging config
fn init_logging(verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(logging.color);

    match logging.format.as_str() {
        "pretty" => tracing_subscriber::registry()
            .with(layer.pretty())
            .with(filter)
            .init(),
        "full" => tracing_subscriber::registry().with(layer).with(filter).init(),
        _ => tracing_subscriber::registry()
            .with(layer.compact())
            .with(filter)
            .init(),
    }

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Write configuration with the given default roots
fn cmd_init(
    target: Option<String>,
    reference: Option<String>,
    config_path: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!("Initializing mirrorsort configuration...");

    let mut new_config = config.clone();
    if let Some(target) = target {
        new_config.target_root = Some(expand_path(&target)?);
    }
    if let Some(reference) = reference {
        new_config.reference_root = Some(expand_path(&reference)?);
    }

    let config_path = match config_path {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    new_config.save(&config_path)?;

    info!("Configuration saved to: {:?}", config_path);

    println!("✅ mirrorsort configuration written");
    println!("   Config: {:?}", config_path);
    if let Some(target) = &new_config.target_root {
        println!("   Target root: {}", target);
    }
    if let Some(reference) = &new_config.reference_root {
        println!("   Reference root: {}", reference);
    }

    Ok(())
}

struct RunArgs {
    target: Option<String>,
    reference: Option<String>,
    include_marked: bool,
    marker: Option<String>,
    pattern: Option<String>,
    on_conflict: Option<ConflictPolicy>,
    dry_run: bool,
    json: bool,
}

/// Resolve a root from the command line, falling back to the configured one
fn resolve_root(arg: Option<String>, configured: Option<&str>, label: &str) -> Result<PathBuf> {
    match (arg, configured) {
        (Some(arg), _) => Ok(PathBuf::from(expand_path(&arg)?)),
        (None, Some(configured)) => Ok(PathBuf::from(configured)),
        (None, None) => Err(anyhow!(
            "No {} folder given and none configured (see 'mirrorsort init')",
            label
        )),
    }
}

/// Reconcile the target tree against the reference tree
async fn cmd_run(args: RunArgs, config: &Config) -> Result<()> {
    version::ensure_allows_run(&config.version_gate)?;

    let target_root = resolve_root(args.target, config.target_root.as_deref(), "target")?;
    let reference_root =
        resolve_root(args.reference, config.reference_root.as_deref(), "reference")?;

    let mut reconcile = config.reconcile.clone();
    if let Some(marker) = args.marker {
        reconcile.exclusion_marker = marker;
        reconcile.exclusion_pattern = None;
    }
    if let Some(pattern) = args.pattern {
        reconcile.exclusion_pattern = Some(pattern);
    }
    if let Some(policy) = args.on_conflict {
        reconcile.on_conflict = policy;
    }

    let mut options = reconcile.to_options()?;
    options.dry_run = args.dry_run;
    if args.json {
        options.completion_delay = std::time::Duration::ZERO;
    }

    let task = ReconciliationTask::new(
        target_root,
        reference_root,
        reconcile.exclude_marked_category && !args.include_marked,
    );

    if !args.json {
        println!(
            "🔍 Comparing {} against {}",
            task.target_root.display(),
            task.reference_root.display()
        );
        if args.dry_run {
            println!("   Dry run mode - no files will be moved");
        }
    }

    let mut handle = spawn_run(task, options);
    let mut cancel_requested = false;

    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(RunEvent::Progress(update)) => {
                    if !args.json {
                        println!("   [{:>3}%] {}", update.percentage, update.message);
                    }
                }
                Some(RunEvent::Completed(summary)) => {
                    if args.json {
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    } else {
                        print_summary(&summary);
                    }
                    return Ok(());
                }
                Some(RunEvent::Failed(error)) => bail!(error),
                Some(RunEvent::Cancelled) => bail!("Run cancelled; some directories were not processed"),
                None => bail!("Worker stopped without reporting a result"),
            },
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                warn!("Interrupt received, stopping after the current directory");
                handle.cancel();
                cancel_requested = true;
            }
        }
    }
}

fn print_summary(summary: &ReconcileSummary) {
    use mirrorsort::FileOutcome;

    if summary.dry_run {
        println!("\n📋 Planned moves:");
        for outcome in summary.directories.iter().flat_map(|d| d.files.iter()) {
            if let FileOutcome::Moved { from, to, .. } = outcome {
                println!("   {} -> {}", from.display(), to.display());
            }
        }
    }

    let moved_label = if summary.dry_run { "Would move" } else { "Moved" };

    println!("\n🎉 Comparison complete!");
    println!(
        "   📁 Directories: {} ({} matched)",
        summary.total_directories, summary.matched_directories
    );
    println!("   📦 {}: {}", moved_label, summary.moved);
    println!("   ⏭️  Left for review: {}", summary.excluded);
    println!("   ❔ No reference file: {}", summary.unmatched);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());
}

/// System health check and diagnostics
fn cmd_doctor(config: &Config) -> Result<()> {
    let health = HealthCheck::run(config);
    print_health_report(&health);
    Ok(())
}

/// Launch the Terminal User Interface
async fn cmd_tui(config: Config) -> Result<()> {
    // Preflight: an outdated build must not run
    if let Err(e) = version::ensure_allows_run(&config.version_gate) {
        println!("❌ {}", e);
        std::process::exit(1);
    }

    tui::run_tui(config).await?;

    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    use mirrorsort::health::CheckResult;

    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning {
                "⚠️ "
            } else {
                "✅"
            }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 mirrorsort System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    if health.all_passed() {
        println!("✅ All checks passed");
    } else {
        println!("❌ Some checks failed");
    }
}
