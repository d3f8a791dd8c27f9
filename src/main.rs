//! # project-index
//!
//! A command-line front end for the project indexing engine.
//!
//! It registers root directories, discovers the software projects inside
//! them and keeps an index of each project's type, language breakdown and git
//! remotes in a state directory, so later listings are instant.
//!
//! ## Features
//!
//! - Manifest-based detection (Rust, Flutter, Next.js, React, Vue, Angular,
//!   Svelte, Node.js, Ruby, Python) plus plain git repositories
//! - Per-language line counts
//! - Parallel per-root scanning with incremental reloads
//! - Ranked free-text search over names, descriptions and READMEs
//! - Human-readable or JSON output
//! - Persistent configuration via `~/.config/project-index/config.toml`
//!
//! ## Usage
//!
//! ```bash
//! # Register a directory and build the index
//! project-index config add ~/code
//! project-index index
//!
//! # List Rust projects, largest first
//! project-index list --project-type rust --sort lines
//!
//! # Refresh a single project after editing it
//! project-index reload ~/code/my-app
//!
//! # Find the project that syncs photos
//! project-index search photo sync
//! ```

mod cli;

use std::{path::Path, process::exit, time::Duration};

use anyhow::{Result, bail};
use clap::Parser;
use cli::{Cli, Commands, ConfigCommand, ListArgs};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use project_index::{
    Engine, Project, Projects, ScanReport,
    config::FileConfig,
    filtering::{filter_projects, sort_projects},
    output::{JsonListOutput, JsonScanOutput, JsonSearchOutput, format_timestamp},
    utils::format_bytes,
};
use tracing_subscriber::EnvFilter;

/// Entry point for the project-index application.
///
/// This function handles all errors gracefully by calling [`inner_main`] and printing
/// any errors to stderr before exiting with a non-zero status code.
fn main() {
    if let Err(err) = inner_main() {
        eprintln!("Error: {err:#}");

        exit(1);
    }
}

/// Main application logic that can return errors.
///
/// # Errors
///
/// Returns errors from configuration loading, engine operations, or JSON
/// serialization.
fn inner_main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbosity());

    let json_mode = args.json();
    let file_config = load_config(json_mode);

    let scan_options = args.scan_options(&file_config)?;
    let engine = Engine::open(args.state_dir(&file_config), &scan_options);

    match &args.command {
        Commands::Index => {
            let progress = spinner(json_mode, "Indexing...")?;
            let report = engine.re_index();
            progress.finish_and_clear();
            print_report("re_index", &report?, json_mode)
        }
        Commands::Reload { path, .. } => {
            let progress = spinner(json_mode, "Reloading...")?;
            let report = engine.reload_index(path.as_deref());
            progress.finish_and_clear();
            print_report("reload", &report?, json_mode)
        }
        Commands::List(list) => run_list(&engine, list, &file_config, json_mode),
        Commands::Search { query, limit } => run_search(&engine, &query.join(" "), *limit, json_mode),
        Commands::Show { file } => {
            print!("{}", engine.get_file_contents(file)?);
            Ok(())
        }
        Commands::Config { command } => handle_config_command(&engine, command, &file_config, json_mode),
    }
}

/// Install the `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` raises the default `warn` level.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("project_index={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// A steady-ticking spinner, hidden in JSON mode.
fn spinner(json_mode: bool, message: &'static str) -> Result<ProgressBar> {
    if json_mode {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

// ── Index / reload ──────────────────────────────────────────────────────

fn print_report(mode: &str, report: &ScanReport, json_mode: bool) -> Result<()> {
    if json_mode {
        let output = JsonScanOutput::from_report(mode, report);
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for root in &report.roots {
        match &root.error {
            Some(error) => println!("  {} {}: {error}", "✗".red(), root.root.display()),
            None => {
                let reused = if root.reused > 0 {
                    format!(", {} unchanged", root.reused)
                } else {
                    String::new()
                };
                println!(
                    "  {} {}: {} projects{reused}",
                    "✓".green(),
                    root.root.display(),
                    root.projects.to_string().bright_white()
                );
            }
        }
    }

    if report.roots.is_empty() {
        println!(
            "{}",
            "No root directories registered. Add one with `project-index config add <DIR>`."
                .yellow()
        );
        return Ok(());
    }

    println!(
        "\n{} {} projects indexed in {:.1?}",
        "✅".green(),
        report.total_projects().to_string().bright_white().bold(),
        report.elapsed
    );

    if report.total_removed() > 0 {
        println!("   {} stale projects removed", report.total_removed());
    }
    if !report.warnings.is_empty() {
        println!(
            "   {}",
            format!("{} files or directories could not be read", report.warnings.len()).yellow()
        );
    }

    Ok(())
}

// ── List ────────────────────────────────────────────────────────────────

fn run_list(engine: &Engine, list: &ListArgs, config: &FileConfig, json_mode: bool) -> Result<()> {
    let mut projects = filter_projects(engine.get_projects(), &list.filter_options(config));
    sort_projects(&mut projects, &list.sort_options(config));
    let projects = Projects::from(projects);

    if json_mode {
        let output = JsonListOutput::new(&projects, engine.last_indexed(), engine.is_indexing());
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if projects.is_empty() {
        let hint = if engine.last_indexed().is_none() {
            "✨ Nothing indexed yet. Run `project-index index` first."
        } else {
            "✨ No projects match the specified criteria!"
        };
        println!("{}", hint.green());
        return Ok(());
    }

    for project in projects.as_slice() {
        print_project(project);
    }

    println!("\n{}", "📊 Summary:".bold());
    projects.print_summary();

    if let Some(indexed) = engine.last_indexed() {
        println!("  Last indexed: {}", format_timestamp(indexed).dimmed());
    }
    if engine.is_indexing() {
        println!("  {}", "An indexing pass is currently running.".yellow());
    }

    Ok(())
}

fn print_project(project: &Project) {
    println!(
        "{} {} {}",
        project.name.bold(),
        format!("[{}]", project.project_type).cyan(),
        project.path.display().to_string().dimmed()
    );

    if let Some(description) = &project.description {
        println!("    {description}");
    }

    let languages: Vec<String> = project
        .language_map
        .iter()
        .map(|(language, lines)| format!("{language} {lines}"))
        .collect();
    if !languages.is_empty() {
        println!(
            "    {} lines ({})",
            project.total_lines().to_string().bright_white(),
            languages.join(", ")
        );
    }

    if let Some(remote) = project.git.first() {
        let branch = project
            .branch
            .as_deref()
            .map_or_else(String::new, |branch| format!(" @ {branch}"));
        let dirty = if project.dirty { " (modified)" } else { "" };
        println!("    git: {remote}{branch}{}", dirty.yellow());
    }
}

// ── Search ──────────────────────────────────────────────────────────────

fn run_search(engine: &Engine, query: &str, limit: usize, json_mode: bool) -> Result<()> {
    let results = engine.search(query, limit);

    if json_mode {
        let output = JsonSearchOutput {
            query: query.to_string(),
            results,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("{}", format!("No projects match \"{query}\".").yellow());
        return Ok(());
    }

    for hit in &results {
        println!(
            "{:>6.2}  {} {} {}",
            hit.score,
            hit.name.bold(),
            format!("[{}]", hit.project_type).cyan(),
            hit.path.display().to_string().dimmed()
        );
    }

    Ok(())
}

// ── Config subcommand ───────────────────────────────────────────────────

/// Default config file template written by `config init`.
const CONFIG_TEMPLATE: &str = r#"# project-index configuration
# All values shown are their defaults. Uncomment and change as needed.

# Where the index and registered roots are stored
# (defaults to the platform data directory, e.g. ~/.local/share/project-index)
# state_dir = "~/.local/share/project-index"

[listing]
# Default project type filter (all, rust, python, flutter, ruby, nextjs,
# svelte, react, angular, node, vue, unknown)
# project_type = "all"

# Sort output by: modified, name, lines, type
# sort = "modified"

# Reverse the sort order
# reverse = false

[scanning]
# Number of threads for per-root scans (0 = all CPU cores)
# threads = 0

# Maximum depth below a root to look for projects (unset = unlimited)
# max_depth = 8

# Extra directory names to skip, in addition to .git, node_modules, target, ...
# ignore = []

# Files larger than this are line-estimated instead of read
# large_file_threshold = "10MB"

# What `reload` without a path does with unchanged projects: fresh or full
# reload = "fresh"
"#;

/// Dispatch a `config` subcommand.
fn handle_config_command(
    engine: &Engine,
    cmd: &ConfigCommand,
    config: &FileConfig,
    json_mode: bool,
) -> Result<()> {
    match cmd {
        ConfigCommand::Path => print_config_path()?,
        ConfigCommand::Init => init_config()?,
        ConfigCommand::Show => show_config(engine, config, json_mode)?,
        ConfigCommand::Add { dir } => {
            let root = engine.add_config_directory(&expand(dir))?;
            if json_mode {
                println!("{}", serde_json::json!({ "added": root }));
            } else {
                println!("{} {}", "Registered".green(), root.display());
                println!("Run `project-index index` to scan it.");
            }
        }
        ConfigCommand::Remove { dir } => {
            let removed = engine.remove_config_directory(&expand(dir))?;
            if json_mode {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                match removed {
                    Some(root) => println!("{} {}", "Removed".green(), root.display()),
                    None => println!("{} is not a registered root", dir.display()),
                }
            }
        }
    }
    Ok(())
}

fn expand(path: &Path) -> std::path::PathBuf {
    project_index::config::file::expand_tilde(path)
}

fn print_config_path() -> Result<()> {
    match FileConfig::config_path() {
        Some(path) => println!("{}", path.display()),
        None => bail!("Could not determine the config directory on this platform"),
    }
    Ok(())
}

/// Print the effective configuration (file values merged with defaults).
fn show_config(engine: &Engine, config: &FileConfig, json_mode: bool) -> Result<()> {
    let roots = engine.get_config();

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&roots)?);
        return Ok(());
    }

    match FileConfig::config_path() {
        Some(p) if p.exists() => println!("Config file: {} (found)", p.display()),
        Some(p) => println!(
            "Config file: {} (not found - showing defaults)",
            p.display()
        ),
        None => println!("Config file: (cannot determine path on this platform)"),
    }
    println!("State dir:   {}", engine.state_dir().display());

    println!();
    println!("{}", format_config(config)?);

    println!();
    if roots.is_empty() {
        println!("Registered roots: (none)");
    } else {
        println!("Registered roots:");
        for root in &roots.project_dirs {
            println!("  {}", root.display());
        }
    }
    Ok(())
}

/// Format a [`FileConfig`] as a human-readable table, showing defaults for `None` fields.
fn format_config(config: &FileConfig) -> Result<String> {
    fn show_str(val: Option<&str>, default: &str) -> String {
        val.map_or_else(
            || format!("\"{default}\"  (default)"),
            |v| format!("\"{v}\""),
        )
    }
    fn show_bool(val: Option<bool>, default: bool) -> String {
        val.map_or_else(|| format!("{default}  (default)"), |v| v.to_string())
    }
    fn show_usize(val: Option<usize>, default: &str) -> String {
        val.map_or_else(|| format!("{default}  (default)"), |v| v.to_string())
    }

    let scan = config.scan_options()?;
    let ignore = config.scanning.ignore.as_deref().map_or_else(
        || "[]  (default)".to_string(),
        |names| format!("{names:?}"),
    );
    let threshold = config.scanning.large_file_threshold.as_deref().map_or_else(
        || format!("\"{}\"  (default)", format_bytes(scan.large_file_threshold)),
        |v| format!("\"{v}\" ({})", format_bytes(scan.large_file_threshold)),
    );
    let reload = config.scanning.reload.map_or_else(
        || "\"fresh\"  (default)".to_string(),
        |policy| {
            let name = format!("{policy:?}").to_lowercase();
            format!("\"{name}\"")
        },
    );

    Ok(format!(
        "\
[listing]
project_type  = {project_type}
sort          = {sort}
reverse       = {reverse}

[scanning]
threads       = {threads}
max_depth     = {max_depth}
ignore        = {ignore}
large_file_threshold = {threshold}
reload        = {reload}",
        project_type = show_str(config.listing.project_type.as_deref(), "all"),
        sort = config
            .listing
            .sort
            .as_deref()
            .map_or_else(|| "(none)  (default)".to_string(), |v| format!("\"{v}\"")),
        reverse = show_bool(config.listing.reverse, false),
        threads = show_usize(config.scanning.threads, "0 (all cores)"),
        max_depth = show_usize(config.scanning.max_depth, "unlimited"),
    ))
}

/// Write a default config template to the config file path if it does not exist yet.
fn init_config() -> Result<()> {
    let Some(path) = FileConfig::config_path() else {
        bail!("Could not determine the config directory on this platform");
    };

    if write_config_template(&path)? {
        println!("Config file written to: {}", path.display());
    } else {
        println!("Config file already exists at: {}", path.display());
        println!("Remove it first if you want to regenerate it.");
    }
    Ok(())
}

/// Write [`CONFIG_TEMPLATE`] to `path`. Returns `false` if a file is already there.
fn write_config_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {e}",
                parent.display()
            )
        })?;
    }

    std::fs::write(path, CONFIG_TEMPLATE)
        .map_err(|e| anyhow::anyhow!("Failed to write config file {}: {e}", path.display()))?;
    Ok(true)
}

/// Load the configuration file, falling back to defaults on failure.
fn load_config(json_mode: bool) -> FileConfig {
    match FileConfig::load() {
        Ok(config) => config,
        Err(e) => {
            if !json_mode {
                eprintln!("{} {e:#}", "Warning: Failed to load config file:".yellow());
            }
            FileConfig::default()
        }
    }
}
