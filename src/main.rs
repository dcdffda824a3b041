//! Cairn - a minimal stacking window manager
//!
//! A single-threaded interaction core: one ordered event queue, one
//! dispatch loop, and the state machines for focus, stacking order,
//! and interactive move/resize. Display and protocol concerns sit
//! behind the traits in `cairn-core`.
//!
//! # Features
//! - FIFO event pipeline with cooperative transport servicing
//! - Click-to-focus with raise-to-front stacking
//! - Interactive move and edge-mask resize grabs
//! - Modifier-chorded keybindings (quit, cycle-focus, spawn)
//! - TOML configuration
//! - Headless backend for tests and scripted sessions

use std::process::{Command, Stdio};

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod demo;

use config::Config;

/// Cairn - A minimal stacking window manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Command to launch as a detached child before the main loop
    #[arg(short, long)]
    startup_cmd: Option<String>,

    /// Run in debug mode with verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Print default configuration to stdout
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    // Bad usage prints the help text and still exits 0.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print()?;
            return Ok(());
        },
    };

    // Initialize logging
    let log_level = if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Cairn v{} starting...", env!("CARGO_PKG_VERSION"));

    // Handle special commands
    if args.print_default_config {
        println!("{}", Config::default_config_string());
        return Ok(());
    }

    // Load configuration. An explicitly requested file that cannot be
    // read or parsed is fatal; only discovered configs fall back.
    let config = if args.config.is_some() {
        let cfg = Config::load(args.config.as_deref())?;
        info!("Configuration loaded successfully");
        cfg
    } else {
        match Config::load(None) {
            Ok(cfg) => {
                info!("Configuration loaded successfully");
                cfg
            },
            Err(e) => {
                warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            },
        }
    };

    if args.validate {
        info!("Configuration is valid ({} bindings)", config.keybindings().len());
        return Ok(());
    }

    // Startup commands run detached; their lifetime is not ours.
    if let Some(ref command_line) = args.startup_cmd {
        spawn_detached(command_line);
    }
    for command_line in &config.startup {
        spawn_detached(command_line);
    }

    demo::run(&config)
}

/// Launches a shell command as a detached child.
fn spawn_detached(command_line: &str) {
    match Command::new("/bin/sh")
        .arg("-c")
        .arg(command_line)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => info!("Launched {:?} (pid {})", command_line, child.id()),
        Err(e) => warn!("Failed to launch {:?}: {}", command_line, e),
    }
}
