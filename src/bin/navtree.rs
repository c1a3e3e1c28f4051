//! # navtree CLI - Inspect and drive a navigation menu from the terminal
//!
//! Loads a JSON array of menu records, reconciles it with the persisted state
//! of one menu instance and applies a single operation.
//!
//! ## Usage
//! ```bash
//! # Show the menu with its persisted expansion and active entry
//! navtree --records menu.json show
//!
//! # Check a record file without touching any state
//! navtree --records menu.json validate
//!
//! # Expand a branch, then click a leaf
//! navtree --records menu.json toggle sales
//! navtree --records menu.json click orders
//!
//! # Inspect or wipe the persisted state
//! navtree state
//! navtree reset
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use navtree::navigation::{NavigationOutcome, Navigator, PageParams};
use navtree::{
    tree, ActiveEntry, ClickOutcome, DataStatus, Layout, MenuController, MenuRecord, MenuSession,
    NavConfig, NavError, ReconcileOutcome, SessionBuilder, StorageConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// navtree CLI - Hierarchical menu state from the command line
#[derive(Parser)]
#[command(name = "navtree")]
#[command(version)]
#[command(about = "Build, expand and navigate hierarchical menus with persisted state")]
#[command(long_about = None)]
struct Cli {
    /// JSON file with an array of menu records
    #[arg(short, long, global = true)]
    records: Option<PathBuf>,

    /// State directory (defaults to .navtree)
    #[arg(short, long, global = true)]
    state_dir: Option<PathBuf>,

    /// Menu instance key
    #[arg(short, long, global = true)]
    instance: Option<String>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Menu layout
    #[arg(long, value_enum, global = true)]
    layout: Option<LayoutMode>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the menu outline
    Show {
        /// Print the entries as a flat JSON list in display order
        #[arg(long)]
        json: bool,
    },

    /// Validate a record file
    Validate,

    /// Expand or collapse a branch
    Toggle {
        /// Menu id
        id: String,

        /// Keep at most one top-level branch open
        #[arg(long)]
        top_level: bool,
    },

    /// Expand every entry
    ExpandAll,

    /// Collapse every entry
    CollapseAll,

    /// Click a menu entry
    Click {
        /// Menu id
        id: String,

        /// Treat the click as coming from the expand-all overlay
        #[arg(long)]
        overlay: bool,
    },

    /// Clear the active entry and open the home page
    Home,

    /// Show the persisted state
    State,

    /// Delete the persisted state
    Reset,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum LayoutMode {
    Vertical,
    Horizontal,
}

impl From<LayoutMode> for Layout {
    fn from(mode: LayoutMode) -> Self {
        match mode {
            LayoutMode::Vertical => Layout::Vertical,
            LayoutMode::Horizontal => Layout::Horizontal,
        }
    }
}

/// Navigator that prints where the host would go
struct PrintingNavigator;

impl Navigator for PrintingNavigator {
    fn redirect(&self, url: &str) -> navtree::Result<()> {
        println!("{} {}", "→ redirect".cyan(), url);
        Ok(())
    }

    fn open_page(&self, page: &str, _params: &PageParams) -> navtree::Result<()> {
        println!("{} {}", "→ open page".cyan(), page);
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("NAVTREE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        let message = match e.downcast_ref::<NavError>() {
            Some(nav_error) => nav_error.user_message(),
            None => format!("{:#}", e),
        };
        eprintln!("{}: {}", "Error".red().bold(), message);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Validate => cmd_validate(require_records(cli.records.as_deref())?),
        Commands::State => cmd_state(config),
        Commands::Reset => cmd_reset(config),
        Commands::Show { json } => {
            let session = open_session(config, require_records(cli.records.as_deref())?)?;
            cmd_show(&session, json)
        }
        Commands::Toggle { id, top_level } => {
            let mut session = open_session(config, require_records(cli.records.as_deref())?)?;
            if session.forest().find(&id).is_none() {
                return Err(NavError::NodeNotFound(id).into());
            }
            if top_level {
                session.toggle_top_level_expand(&id);
            } else {
                session.toggle_expand(&id);
            }
            print_outline(&session);
            Ok(())
        }
        Commands::ExpandAll => {
            let mut session = open_session(config, require_records(cli.records.as_deref())?)?;
            session.expand_all();
            print_outline(&session);
            Ok(())
        }
        Commands::CollapseAll => {
            let mut session = open_session(config, require_records(cli.records.as_deref())?)?;
            session.collapse_all();
            print_outline(&session);
            Ok(())
        }
        Commands::Click { id, overlay } => {
            let session = open_session(config, require_records(cli.records.as_deref())?)?;
            cmd_click(session, &id, overlay)
        }
        Commands::Home => {
            let session = open_session(config, require_records(cli.records.as_deref())?)?;
            let mut controller = MenuController::new(session, Arc::new(PrintingNavigator));
            report_navigation(controller.home());
            println!("{}", "Active entry cleared".green());
            Ok(())
        }
    }
}

/// Merge the config file (if any) with command-line overrides
fn resolve_config(cli: &Cli) -> anyhow::Result<NavConfig> {
    let mut config = match &cli.config {
        Some(path) => NavConfig::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => NavConfig {
            storage: StorageConfig::File {
                dir: PathBuf::from(".navtree"),
            },
            ..NavConfig::new("main")
        },
    };

    if let Some(instance) = &cli.instance {
        config.instance_key = instance.clone();
    }
    if let Some(dir) = &cli.state_dir {
        config.storage = StorageConfig::File { dir: dir.clone() };
    }
    if let Some(layout) = cli.layout {
        config.layout = layout.into();
    }

    config.validate()?;
    Ok(config)
}

fn require_records(records: Option<&Path>) -> anyhow::Result<&Path> {
    match records {
        Some(path) => Ok(path),
        None => bail!("this command needs a record file (--records <FILE>)"),
    }
}

fn read_records(path: &Path) -> anyhow::Result<Vec<MenuRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading records from {}", path.display()))?;
    let records = serde_json::from_str(&text)
        .with_context(|| format!("parsing records in {}", path.display()))?;
    Ok(records)
}

/// Mount a session and feed it the record file
fn open_session(config: NavConfig, records_path: &Path) -> anyhow::Result<MenuSession> {
    let records = read_records(records_path)?;
    let mut session = SessionBuilder::from_config(config).build()?;

    if let ReconcileOutcome::Rejected(e) = session.on_data(DataStatus::Available(records)) {
        return Err(NavError::from(e).into());
    }
    for warning in session.warnings() {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    Ok(session)
}

fn print_outline(session: &MenuSession) {
    let forest = session.forest();
    if forest.is_empty() {
        println!("{}", "No menu entries.".yellow());
        return;
    }
    print!("{}", forest.render_outline(session.active_id()));
}

fn cmd_show(session: &MenuSession, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(session.forest())?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Menu".blue().bold(),
        format!("({})", session.store().instance_key()).dimmed()
    );
    print_outline(session);

    let stats = session.forest().stats();
    println!();
    println!(
        "{}",
        format!(
            "{} entries | {} roots | {} expanded | depth {}",
            stats.total_nodes, stats.root_nodes, stats.expanded_nodes, stats.max_depth
        )
        .dimmed()
    );
    Ok(())
}

fn cmd_validate(records_path: &Path) -> anyhow::Result<()> {
    let records = read_records(records_path)?;
    let output = tree::build(&records).map_err(NavError::from)?;

    for warning in &output.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }

    let violations = output.forest.invariant_violations();
    if !violations.is_empty() {
        for violation in &violations {
            println!("{} {}", "violation:".red().bold(), violation);
        }
        bail!("{} invariant violations", violations.len());
    }

    let stats = output.forest.stats();
    println!(
        "{} {} entries, {} roots, depth {}",
        "✓ valid:".green().bold(),
        stats.total_nodes,
        stats.root_nodes,
        stats.max_depth
    );
    Ok(())
}

fn cmd_click(session: MenuSession, id: &str, overlay: bool) -> anyhow::Result<()> {
    let mut controller = MenuController::new(session, Arc::new(PrintingNavigator));
    let outcome = if overlay {
        controller.click_from_overlay(id)
    } else {
        controller.click(id)
    };

    match outcome {
        ClickOutcome::Ignored => {
            println!("{} {} (unknown or disabled)", "Ignored".yellow(), id);
        }
        ClickOutcome::Toggled => print_outline(controller.session()),
        ClickOutcome::Selected { navigation } => {
            println!("{} {}", "Selected".green().bold(), id);
            if let Some(navigation) = navigation {
                report_navigation(navigation);
            }
        }
    }
    Ok(())
}

fn report_navigation(outcome: NavigationOutcome) {
    match outcome {
        NavigationOutcome::Delivered => {}
        NavigationOutcome::FellBack => println!("{}", "Navigation failed; fell back to /".yellow()),
        NavigationOutcome::Failed => println!("{}", "Navigation failed".red()),
    }
}

fn cmd_state(config: NavConfig) -> anyhow::Result<()> {
    let store = config.open_store()?;
    let expanded = store.load_expanded_ids();

    println!("{} {}", "Instance:".bold(), store.instance_key());
    if expanded.is_empty() {
        println!("{} {}", "Expanded:".bold(), "none".dimmed());
    } else {
        println!("{} {}", "Expanded:".bold(), expanded.iter().collect::<Vec<_>>().join(", "));
    }

    let active = match store.load_active_entry() {
        ActiveEntry::Absent => "not saved".dimmed().to_string(),
        ActiveEntry::Cleared => "none".to_string(),
        ActiveEntry::Active(id) => id.green().to_string(),
    };
    println!("{} {}", "Active:".bold(), active);
    Ok(())
}

fn cmd_reset(config: NavConfig) -> anyhow::Result<()> {
    let store = config.open_store()?;
    store.clear();
    println!("{} {}", "Cleared persisted state for".green(), store.instance_key());
    Ok(())
}
