use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use log::{error, info, LevelFilter};
use tokio::sync::Mutex;

use notesuite::{ApiClient, App, Cli, Config, FileSessionStore, NoteStorage, Result, SessionStore};

pub fn initialize_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .filter_module("hyper_util", LevelFilter::Info)
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = notesuite::normalize_base_url(url);
    }
    info!("Using notes API at {}", config.api_base_url);

    let session = Arc::new(FileSessionStore::new(&config.session_file));
    session.initialize()?;

    let client = ApiClient::new(&config, session)?;
    let storage = Arc::new(Mutex::new(NoteStorage::new(client)));

    let mut app = App::new(storage, config, cli.config.clone(), cli.verbose);
    app.run(cli.command).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    initialize_logger(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("{} {}", console::style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
