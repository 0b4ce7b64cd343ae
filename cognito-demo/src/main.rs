use std::sync::Arc;

use args::Args;
use clap::Parser;
use identity::CognitoBackend;
use session::Session;
use social::ConfiguredLogin;
use tokio::io::BufReader;

mod args;
mod command;
mod logger;
mod repl;
mod session;
mod social;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args);

    let config = args.config()?;

    let mut session = Session::new(
        Arc::new(CognitoBackend::new()),
        config.identity.clone(),
        Box::new(ConfiguredLogin::new(config)),
    );

    if let Err(e) = repl::run(&mut session, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await {
        log::error!("Command loop failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
