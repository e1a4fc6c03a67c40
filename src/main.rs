mod commands;
mod config;
mod context;
mod diagram;
mod error;
mod graph;
mod logging;
mod output;
mod provider;
mod tfcloud;
mod traits;

use std::process;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use commands::GenerateCommand;
use config::{Cli, Config};
use context::Context;
use tfcloud::CancellationToken;

fn main() {
    let cli = Cli::parse();
    let ctx = Context::new();

    if let Err(err) = run(&ctx, &cli) {
        ctx.output.error(&format!("{:#}", err));
        process::exit(1);
    }
}

fn run(ctx: &Context, cli: &Cli) -> Result<()> {
    let config = Config::load(cli, &*ctx.fs)?;

    logging::init(config.verbose);
    match &config.source_file {
        Some(path) => info!(path:? = path; "using config file"),
        None => warn!("no config file found"),
    }

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error:% = e; "failed to install Ctrl-C handler");
    }

    let mut stdout = std::io::stdout().lock();
    GenerateCommand::execute(ctx, &config, cancel, &mut stdout)
}
