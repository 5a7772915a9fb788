//! `navgraph` – indoor navigation graph surveying shell
//!
//! 1. Initialises logging (and OTLP export when configured).
//! 2. Loads `~/.navgraph/config.toml`, running a **First-Run Wizard** when
//!    the file is absent.
//! 3. Drops the user into an **interactive REPL** that records hallways from
//!    capture files, links entrypoints and stores graphs.
//! 4. Intercepts **Ctrl-C**: the REPL exits at its next prompt.

mod capture;
mod config;
mod operator;
mod repl;
mod store;
mod telemetry;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

fn main() {
    let _guard = telemetry::init_tracing("navgraph");

    print_banner();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – leaving after this prompt.".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    println!("  Graphs are stored in {}", cfg.graph_dir.display().to_string().dimmed());
    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(cfg, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║      navgraph First-Run Wizard       ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up navgraph.\n");

    let mut cfg = config::Config::default();

    let dir = cfg.graph_dir.display().to_string();
    cfg.graph_dir = prompt_line(&format!("  Graph directory [{dir}]: "), &dir).into();

    let w = prompt_line(
        &format!("  Plan viewport width px [{}]: ", cfg.viewport_width),
        &cfg.viewport_width.to_string(),
    );
    if let Ok(w) = w.parse::<u32>() {
        cfg.viewport_width = w;
    }
    let h = prompt_line(
        &format!("  Plan viewport height px [{}]: ", cfg.viewport_height),
        &cfg.viewport_height.to_string(),
    );
    if let Ok(h) = h.parse::<u32>() {
        cfg.viewport_height = h;
    }

    let level = prompt_line("  Starting level [0]: ", "0");
    if let Ok(level) = level.parse::<i32>() {
        cfg.default_level = level;
    }

    let autosave = prompt_line("  Save after every finished hallway? [Y/n]: ", "y");
    cfg.autosave = !autosave.eq_ignore_ascii_case("n");

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", "   ┌─┐┌─┐┬  ┬┌─┐┬─┐┌─┐┌─┐┬ ┬".bold().cyan());
    println!("{}", "   │ │├─┤└┐┌┘│ ┬├┬┘├─┤├─┘├─┤".bold().cyan());
    println!("{}", "   ┴ ┴┴ ┴ └┘ └─┘┴└─┴ ┴┴  ┴ ┴".bold().cyan());
    println!();
    println!(
        "  {} {}",
        "navgraph".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Indoor navigation graph surveying");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
