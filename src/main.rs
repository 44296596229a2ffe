//! Seekbot - Main Entry Point
//!
//! Handles CLI argument parsing, configuration loading, and wiring of the
//! session manager, bot, and dashboard server.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use seekbot::{
    api::{ApiServer, AppState},
    bot::Bot,
    captcha::DesktopNotifier,
    config::{BotSettings, CliArgs},
    session::{DriverFactory, SessionManager},
    storage::JsonStorage,
    NAME, VERSION,
};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
}

/// Print the startup banner with version
fn print_banner() {
    println!(
        r#"
{cyan}{bold}  ____            _    _           _
 / ___|  ___  ___| | _| |__   ___ | |_
 \___ \ / _ \/ _ \ |/ / '_ \ / _ \| __|
  ___) |  __/  __/   <| |_) | (_) | |_
 |____/ \___|\___|_|\_\_.__/ \___/ \__|
{reset}
{dim}  Job-Search Automation with a Single Stealth Session{reset}
{dim}  Version: {version}{reset}
"#,
        cyan = colors::CYAN,
        bold = colors::BOLD,
        reset = colors::RESET,
        dim = colors::DIM,
        version = VERSION
    );
}

/// Print configuration summary
fn print_config_summary(settings: &BotSettings) {
    println!(
        "{bold}{blue}Configuration:{reset}",
        bold = colors::BOLD,
        blue = colors::BLUE,
        reset = colors::RESET
    );
    println!(
        "  {dim}Target Site:{reset}    {}",
        settings.base_url,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Headless:{reset}       {}",
        if settings.headless {
            format!("{yellow}yes (captcha solving needs a window){reset}",
                yellow = colors::YELLOW, reset = colors::RESET)
        } else {
            format!("{green}no{reset}", green = colors::GREEN, reset = colors::RESET)
        },
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Dashboard:{reset}      {}",
        if settings.api_enabled {
            format!(
                "{green}http://127.0.0.1:{}{reset}",
                settings.api_port,
                green = colors::GREEN,
                reset = colors::RESET
            )
        } else {
            format!("{yellow}disabled{reset}", yellow = colors::YELLOW, reset = colors::RESET)
        },
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Typing Speed:{reset}   {}-{} WPM",
        settings.behavior.min_wpm,
        settings.behavior.max_wpm,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Data Dir:{reset}       {}",
        settings.data_dir.display(),
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!();
}

/// Build the CLI command parser
fn build_cli() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .about("Job-search browser automation with a single stealth session")
        .long_about(
            "Seekbot automates a job-search website through one remote-controlled\n\
             browser session, featuring:\n\
             - Create-once session lifecycle with explicit recovery\n\
             - Human-like typing, clicking, and scrolling\n\
             - Anti-detection launch profiles and property overrides\n\
             - Human-in-the-loop captcha handling\n\
             - A REST dashboard for status and control",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file (TOML or JSON)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Dashboard API port (default: 8700)")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("headless")
                .long("headless")
                .help("Run the browser without a visible window")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-headless")
                .long("no-headless")
                .help("Run the browser with a visible window")
                .action(ArgAction::SetTrue)
                .conflicts_with("headless"),
        )
        .arg(
            Arg::new("no-api")
                .long("no-api")
                .help("Disable the dashboard API server")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("PATH")
                .help("Directory for persisted searches, applications, and logs")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress output except errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

/// Parse CLI arguments into CliArgs struct
fn parse_cli_args(matches: &clap::ArgMatches) -> CliArgs {
    let mut args = CliArgs::default();

    args.config_file = matches.get_one::<PathBuf>("config").cloned();
    args.api_port = matches.get_one::<u16>("port").copied();
    args.data_dir = matches.get_one::<PathBuf>("data-dir").cloned();

    if matches.get_flag("headless") {
        args.headless = Some(true);
    } else if matches.get_flag("no-headless") {
        args.headless = Some(false);
    }

    if matches.get_flag("no-api") {
        args.api_enabled = Some(false);
    }

    args
}

/// Initialize the tracing/logging subsystem
fn init_tracing(verbosity: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("tower_http=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Pick the driver factory for this build.
#[cfg(feature = "chrome-driver")]
fn driver_factory(settings: &BotSettings) -> Arc<dyn DriverFactory> {
    Arc::new(seekbot::session::ChromeDriverFactory::new(settings.headless))
}

#[cfg(not(feature = "chrome-driver"))]
fn driver_factory(settings: &BotSettings) -> Arc<dyn DriverFactory> {
    info!("built without the chrome-driver feature; using the mock driver");
    Arc::new(seekbot::session::MockDriverFactory::new(&settings.base_url))
}

/// Main application entry point
#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let verbosity = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");

    init_tracing(verbosity, quiet);

    let cli_args = parse_cli_args(&matches);
    let settings = cli_args
        .load_settings()
        .context("Failed to load configuration")?;

    if !quiet {
        print_banner();
        print_config_summary(&settings);
    }

    // Wire the core: storage, session manager, bot.
    let storage = JsonStorage::new(&settings.data_dir).context("Failed to open data directory")?;
    let manager = Arc::new(SessionManager::new(driver_factory(&settings)));
    let bot = Arc::new(Bot::new(
        settings.clone(),
        manager.clone(),
        storage.clone(),
        Arc::new(DesktopNotifier::new()),
    ));

    // Start the dashboard if enabled.
    let mut api_server = if settings.api_enabled {
        info!("Starting dashboard API on port {}...", settings.api_port);

        let state = AppState {
            manager: manager.clone(),
            bot: bot.clone(),
            storage: storage.clone(),
            settings: Arc::new(RwLock::new(settings.clone())),
        };

        let mut server = ApiServer::new(settings.api_port, state);
        server
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start dashboard API: {}", e))?;

        if !quiet {
            println!(
                "{green}{bold}Dashboard started:{reset} http://127.0.0.1:{}",
                settings.api_port,
                green = colors::GREEN,
                bold = colors::BOLD,
                reset = colors::RESET
            );
            println!(
                "{dim}Start a run with POST /api/start. Press Ctrl+C to stop.{reset}",
                dim = colors::DIM,
                reset = colors::RESET
            );
            println!();
        }

        Some(server)
    } else {
        // Headless-CLI mode: run one bot cycle directly.
        info!("Dashboard disabled; running one bot cycle");
        if let Err(e) = bot.run().await {
            error!("Bot run failed: {}", e);
        }
        None
    };

    info!("Seekbot is running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            println!();
            info!("Received shutdown signal, stopping gracefully...");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    bot.request_stop();

    if let Some(ref mut server) = api_server {
        info!("Stopping dashboard API...");
        server.stop().await;
    }

    info!("Destroying browser session...");
    manager.destroy().await;

    println!(
        "{green}Seekbot stopped successfully.{reset}",
        green = colors::GREEN,
        reset = colors::RESET
    );

    Ok(())
}
