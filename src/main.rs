use std::io::{BufReader, IsTerminal};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use crate::{
    ads::AdsClient,
    cli::{Cli, Command},
    config::Config,
    credential::{ConfigCredentials, CredentialSource},
    error::{Error, Result},
    identifier::QueryToken,
    library::Library,
    record::Record,
};

mod ads;
mod cli;
mod config;
mod credential;
mod error;
mod identifier;
mod library;
mod merge;
mod pdf;
mod record;

/// Title every alert is shown under.
const ALERT_TITLE: &str = "ADS Metadata";

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    let outcome = run(args);
    alert(&outcome)
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,adsbib={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Run one command. `Ok(Some(msg))` is a success worth an alert.
fn run(args: Cli) -> Result<Option<String>> {
    let config_path = args.config.unwrap_or_else(Config::config_path);
    let config = Config::load_from(&config_path)?;
    let library_path = args
        .library
        .unwrap_or_else(|| config.library.path.clone());
    let mut library = Library::open(&library_path)?;
    tracing::debug!(path = %library_path.display(), records = library.len(), "library opened");
    let stdin = std::io::stdin();
    let terminal = stdin.is_terminal();
    let mut credentials =
        ConfigCredentials::new(config_path, config.clone(), BufReader::new(stdin))
            .on_terminal(terminal);

    match args.command {
        Command::Update { selection } => {
            let applied = with_selected(
                &selection,
                &config,
                &mut credentials,
                &mut library,
                |record, query, client, store| merge::update_metadata(record, query, client, store),
            )?;
            tracing::debug!(promoted = applied.promoted, changed = ?applied.changed, "update applied");
            for name in &applied.malformed_authors {
                tracing::warn!("kept `{name}` as a single last name");
            }
            Ok(Some("Metadata updated from NASA ADS.".to_string()))
        }
        Command::Pdf { selection } => {
            let attachment = with_selected(
                &selection,
                &config,
                &mut credentials,
                &mut library,
                |record, query, client, store| pdf::fetch_pdf(record, query, client, store),
            )?;
            Ok(Some(format!(
                "Attached publisher PDF from NASA ADS ({}).",
                attachment.path
            )))
        }
        Command::Import { from } => {
            let mut added = 0;
            for path in &from {
                let src = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                added += library
                    .import_bibtex(&src)
                    .with_context(|| format!("failed to import {}", path.display()))?;
            }
            Ok(Some(format!("Imported {added} item(s).")))
        }
        Command::List => {
            for record in library.records() {
                println!("{}\t{}\t{}", record.key, record.item_type, record.label());
            }
            Ok(None)
        }
        Command::Show { key } => {
            let record = library.get(&key).ok_or(Error::UnknownRecord(key))?;
            let json =
                serde_json::to_string_pretty(&record).context("failed to render item as JSON")?;
            println!("{json}");
            Ok(None)
        }
        Command::Key => match credentials.prompt_and_store()? {
            Some(_) => Ok(Some("NASA ADS API key saved.".to_string())),
            None => Ok(Some("NASA ADS API key unchanged.".to_string())),
        },
    }
}

/// Shared preamble of `update` and `pdf`: credential, selection, identifier, then the network.
fn with_selected<T>(
    selection: &[String],
    config: &Config,
    credentials: &mut dyn CredentialSource,
    library: &mut Library,
    op: impl FnOnce(&mut Record, &QueryToken, &AdsClient, &mut Library) -> Result<T>,
) -> Result<T> {
    let token = credential::ensure_credential(credentials)?;

    let [key] = selection else {
        tracing::debug!(selected = selection.len(), "expected exactly one item");
        return Err(Error::InvalidSelection);
    };
    let mut record = library
        .get(key)
        .ok_or_else(|| Error::UnknownRecord(key.clone()))?;

    let query = identifier::resolve(&record).ok_or(Error::UnresolvableIdentifier)?;
    tracing::info!(key = %record.key, %query, "resolved identifier");

    let client = AdsClient::new(&config.ads, token);
    op(&mut record, &query, &client, library)
}

/// Print the outcome of a run under the alert title and turn it into an exit code.
fn alert(outcome: &Result<Option<String>>) -> ExitCode {
    let title = format!("[{ALERT_TITLE}]");
    match outcome {
        Ok(None) => ExitCode::SUCCESS,
        Ok(Some(message)) => {
            eprintln!("{} {message}", title.green().bold());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} {e}", title.red().bold());
            ExitCode::FAILURE
        }
    }
}
