//! `nenga` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, resolve configuration and initialize logging.
//! - Dispatch subcommands and map failures to process exit codes.

use clap::Parser;
use log::{error, info};
use nenga_core::init_logging;

mod args;
mod commands;
mod config;
mod web;

use args::{Cli, Commands, WebappArgs};
use commands::{CliError, CliResult};
use config::Config;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        error!(
            "event=cli_exit module=cli status=error error_kind={:?} error={}",
            err.kind(),
            err
        );
        log::logger().flush();
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = Config::resolve(&cli.global)?;
    init_logging(&config.log_level, &config.log_dir)?;
    info!(
        "event=cli_start module=cli status=ok command={} echo_sql={}",
        command_name(&cli.command),
        config.echo_sql
    );

    match cli.command {
        Commands::Initdb { drop_create } => commands::initdb(&config, drop_create),
        Commands::Nextyear => commands::nextyear(&config, commands::today()),
        Commands::Genenga(args) => commands::genenga(&config, &args, commands::today()),
        Commands::Webapp(args) => run_webapp(&config, &args),
    }
}

fn run_webapp(config: &Config, args: &WebappArgs) -> CliResult<()> {
    // Fail before binding if the database cannot be opened or migrated.
    drop(commands::open_connection(config)?);
    info!(
        "event=webapp_config module=cli status=ok debug={} reload={}",
        !args.nodebug, !args.noreload
    );

    let state = web::AppState::new(config.db_path.clone(), config.open_options(), !args.nodebug);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Io)?;
    runtime.block_on(web::serve(state, &args.host, args.port))
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Initdb { .. } => "initdb",
        Commands::Nextyear => "nextyear",
        Commands::Genenga(_) => "genenga",
        Commands::Webapp(_) => "webapp",
    }
}
