use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use folio_shell::command::{Command, HELP};
use folio_shell::config::Config;
use folio_shell::fetch::HttpFetcher;
use folio_shell::loader::NavigationOutcome;
use folio_shell::site::Site;
use folio_shell::storage::LocalStorage;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file (ignored when not present)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("folio_shell=info".parse()?),
        )
        .init();

    info!("Starting folio shell");

    let config = Config::from_env()?;
    let fetcher = Arc::new(HttpFetcher::new(&config)?);
    let storage = Arc::new(
        LocalStorage::open(&config.storage_path)
            .with_context(|| format!("Failed to open storage at {}", config.storage_path))?,
    );

    let site = Site::boot(&config, fetcher, storage).await?;
    site.idle().await;
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match Command::parse(&line) {
            Some(Ok(command)) => command,
            Some(Err(e)) => {
                println!("{e}");
                continue;
            }
            None => continue,
        };

        match command {
            Command::Open(href) => report_navigation(site.open(&href).await),
            Command::Lang(code) => println!("{:?}", site.set_language(&code).await),
            Command::Click(selector) => match site.click(&selector) {
                Some(outcome) => println!("{outcome:?}"),
                None => println!("nothing matches {selector}"),
            },
            Command::Back => match site.back().await {
                Some(outcome) => report_navigation(outcome),
                None => println!("no page to go back to"),
            },
            Command::Forward => match site.forward().await {
                Some(outcome) => report_navigation(outcome),
                None => println!("no page to go forward to"),
            },
            Command::Key(key) => {
                site.press_key(&key);
            }
            Command::Show(selector) => {
                let markup = site.markup(selector.as_deref());
                if markup.is_empty() {
                    println!("no match");
                }
                for html in markup {
                    println!("{html}");
                }
            }
            Command::State => println!("{}", site.status()),
            Command::Metrics => println!("{}", site.translation_metrics().format()),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
        site.idle().await;
    }

    info!("Shell closed");
    Ok(())
}

fn report_navigation(outcome: NavigationOutcome) {
    match outcome {
        NavigationOutcome::Swapped => println!("ok"),
        NavigationOutcome::Superseded => println!("superseded"),
        NavigationOutcome::FellBack { url, error } => {
            warn!("In-place navigation failed: {}", error);
            println!("full navigation to {url}");
        }
    }
}
