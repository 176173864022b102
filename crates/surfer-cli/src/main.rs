//! `surfer` – operator console for a Surfer autonomous surface vehicle.
//!
//! 1. Loads `~/.surfer/config.toml` (writing defaults on first run) and applies
//!    `SURFER_*` environment overrides.
//! 2. Connects to the rosbridge server and registers the vehicle's channels.
//! 3. Drops the operator into an interactive REPL with slash-commands.
//! 4. Intercepts **Ctrl-C** to command zero velocity before exiting.

mod config;
mod logging;
mod repl;

use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, warn};

use surfer_client::{Surfer, SurferSession};

fn main() -> ExitCode {
    let cfg = load_config();
    let _telemetry = logging::init_tracing("surfer-cli", cfg.json_logs());

    print_banner();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    println!(
        "  Connecting to {} as {} …",
        cfg.surfer.url().bold(),
        cfg.surfer.name.bold()
    );
    let surfer = Arc::new(Surfer::new(cfg.surfer.clone()));
    let session = match runtime.block_on(SurferSession::open(Arc::clone(&surfer))) {
        Ok(session) => session,
        Err(e) => {
            println!("  {} {}", "✗ Connection failed:".red().bold(), e);
            println!(
                "  {}",
                "Is rosbridge running? Check host/port in the config file.".dimmed()
            );
            return ExitCode::FAILURE;
        }
    };
    println!("  {}", "✓ Connected.".green());

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    let surfer_for_ctrlc = Arc::clone(session.surfer());
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the vehicle …".yellow().bold());
        surfer_for_ctrlc.stop();
        println!("{}", "  ✓ Zero velocity published.".green());
        println!("{}", "  Press Enter to exit.".dimmed());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; Ctrl-C will not stop the vehicle");
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    repl::run(&session, &runtime, shutdown);

    drop(session);
    ExitCode::SUCCESS
}

/// Config from disk, or defaults (persisted) on first run.
fn load_config() -> config::Config {
    match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn print_banner() {
    println!();
    println!("{}", r#"   _____            ____         "#.bold().cyan());
    println!("{}", r#"  / ___/__  _______/ __/__  _____"#.bold().cyan());
    println!("{}", r#"  \__ \/ / / / ___/ /_/ _ \/ ___/"#.bold().cyan());
    println!("{}", r#" ___/ / /_/ / /  / __/  __/ /    "#.bold().cyan());
    println!("{}", r#"/____/\__,_/_/  /_/  \___/_/     "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Surfer".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Autonomous surface vehicle console");
    println!();
}
