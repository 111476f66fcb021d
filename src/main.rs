//! clusterdba - an operator console for distributed MySQL-protocol SQL clusters.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use crossterm::tty::IsTty;
use tracing::{error, info};

use clusterdba::cli::Cli;
use clusterdba::config::Config;
use clusterdba::connection::ConnectionRegistry;
use clusterdba::console::history::history_path;
use clusterdba::console::{render, Console, EditorReader, ScriptedReader};
use clusterdba::error::{ConsoleError, Result};
use clusterdba::logging;

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    let config = match Config::load_from_file(&cli.config_path()) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let log_file = cli
        .log_file()
        .map(Path::to_path_buf)
        .or_else(|| config.logging.file.clone());
    if let Err(e) = logging::init(&config.logging.level, log_file.as_deref()) {
        exit_with(&e);
    }

    if let Err(e) = run(cli, config) {
        error!("{}: {}", e.category(), e);
        exit_with(&e);
    }
}

fn exit_with(e: &ConsoleError) -> ! {
    eprintln!("❌ {}: {}", e.category(), e);
    std::process::exit(1);
}

fn run(cli: Cli, config: Config) -> Result<()> {
    info!(
        "Loaded {} cluster(s) from {}",
        config.clusters.len(),
        cli.config_path().display()
    );
    let registry = ConnectionRegistry::new(config.clusters.clone());

    // One-shot mode: `clusterdba [-c prod] kill digest ...`
    if let Some(command) = cli.command.clone() {
        let console = Console::new(registry, ScriptedReader::default())?;
        if let Some(cluster) = cli.cluster_name() {
            console.login(cluster)?;
        }
        let output = console.execute(command)?;
        return render::render(&output, &mut io::stdout())
            .map_err(|e| ConsoleError::internal(format!("write output error: {e}")));
    }

    if cli.disable_interactive {
        return Cli::command()
            .print_help()
            .map_err(|e| ConsoleError::internal(format!("write output error: {e}")));
    }

    let history = history_path(cli.history.as_deref(), config.console.history_file.as_deref());
    let reader = EditorReader::new(history)?;
    let mut console = Console::new(registry, reader)?.with_colors(io::stdout().is_tty());
    if let Some(cluster) = cli.cluster_name() {
        console.login(cluster)?;
    }
    console.run()
}
