mod cli;
mod commands;
mod config;
mod resources;
mod state;
mod ui;

use anyhow::{Context as AnyhowContext, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use fabric_client::Client;
use std::io;
use std::path::PathBuf;

use config::{DeclaredConfig, ProviderConfig};
use state::FabricState;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Declared configuration file
    pub config_file: PathBuf,
    pub state_file: PathBuf,
    pub endpoint: Option<String>,
    pub token: Option<String>,
}

impl Context {
    pub fn load_config(&self) -> Result<DeclaredConfig> {
        DeclaredConfig::load(&self.config_file)
    }

    pub fn load_state(&self) -> Result<FabricState> {
        FabricState::load(&self.state_file)
    }

    /// Controller client from config.toml plus flag/env overrides
    pub fn client(&self) -> Result<Client> {
        let settings = ProviderConfig::load()?
            .resolve(self.endpoint.as_deref(), self.token.as_deref())?;
        log::debug!("Using controller at {}", settings.endpoint);
        Client::new(&settings).context("Failed to set up controller client")
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_file: cli.file,
        state_file: cli.state,
        endpoint: cli.endpoint,
        token: cli.token,
    };

    match cli.command {
        Command::Plan(args) => commands::plan::run(&ctx, args.target.as_deref()),
        Command::Apply(args) => commands::apply::run(
            &ctx,
            &commands::apply::ApplyOptions {
                target: args.target,
                dry_run: args.dry_run,
            },
        ),
        Command::Refresh(args) => commands::refresh::run(&ctx, args.jobs),
        Command::Import {
            resource_type,
            address,
            path,
        } => commands::import::run(&ctx, &resource_type, &address, &path),
        Command::Show { address } => commands::show::run(&ctx, address.as_deref()),
        Command::Destroy { address, dry_run } => commands::destroy::run(&ctx, &address, dry_run),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "hyperfab", &mut io::stdout());
            Ok(())
        }
    }
}
