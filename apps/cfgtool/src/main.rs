mod handlers;
mod models;

use crate::handlers::edit::SetRequest;
use crate::handlers::{convert, edit, inspect};
use crate::models::args::{Cli, Commands};
use crate::models::config::{ToolConfig, load_config};
use anyhow::{Context, Result};
use clap::Parser;
use lattice_logger::{FileOutput, LevelFilter, Logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = load_config(cli.config.as_deref()).context("Configuration is malformed")?;
    let _logger = init_logger(&cfg, cli.verbose)?;

    match cli.command {
        Commands::Get { key, project } => inspect::get(&key, &project, &cfg)?,
        Commands::Set { key, value, string, output, project } => {
            let output = output.as_deref();
            let request = SetRequest { key: &key, value: &value, verbatim: string, output };
            edit::set(&request, &project, &cfg)?;
        },
        Commands::List { json, project } => inspect::list(json, &project, &cfg)?,
        Commands::Autoloads { project } => inspect::autoloads(&project, &cfg)?,
        Commands::Features { project } => inspect::features(&project, &cfg)?,
        Commands::Convert { input, output } => convert::convert(&input, &output)?,
    }

    Ok(())
}

fn init_logger(cfg: &ToolConfig, verbose: u8) -> Result<Logger> {
    let level = match verbose {
        0 => cfg.log.level.parse::<LevelFilter>().unwrap_or(LevelFilter::WARN),
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let mut builder = Logger::builder(env!("CARGO_PKG_NAME")).format(cfg.log.format).level(level);
    if let Some(dir) = &cfg.log.directory {
        builder = builder.file(FileOutput::new(dir));
    }
    let logger = builder.init();
    logger.context("Failed to initialize logging")
}
