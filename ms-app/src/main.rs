//! MultiSearch: one prompt, every provider.

mod config;
mod keys;
mod render;
mod routes;
mod server;
mod transport;

use clap::{Parser, Subcommand};
use config::MultiSearchConfig;
use ms_llm::{CredentialAccessor, Provider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use transport::{Reply, Request};

#[derive(Debug, Parser)]
#[command(
    name = "multisearch",
    version,
    about = "Send one prompt to several LLM providers at once"
)]
struct Cli {
    /// Config file (default: ~/.multisearch/config.toml).
    #[arg(long, global = true, env = "MULTISEARCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fan a prompt out to every provider.
    Search {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
        /// Print the raw result mapping as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check connectivity for one provider.
    Test {
        provider: String,
        /// Key to test instead of the stored one.
        #[arg(long)]
        key: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Check connectivity for every provider with a key, one at a time.
    TestAll,
    /// Manage stored API keys.
    Keys {
        #[command(subcommand)]
        command: KeysCommand,
    },
    /// Serve the dispatch API over HTTP.
    Serve,
}

#[derive(Debug, Subcommand)]
enum KeysCommand {
    /// Store a key for a provider.
    Set {
        provider: Provider,
        key: String,
        /// Skip key format validation.
        #[arg(long)]
        force: bool,
    },
    /// Remove every stored key.
    Clear,
    /// Show which providers have a key.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve => server::serve(cli.config).await,
        Command::Search { prompt, json } => search(cli.config, &prompt.join(" "), json).await,
        Command::Test {
            provider,
            key,
            prompt,
        } => test_one(cli.config, provider, key, prompt).await,
        Command::TestAll => test_all(cli.config).await,
        Command::Keys { command } => keys_command(cli.config, command).await,
    }
}

async fn search(config: Option<PathBuf>, prompt: &str, json: bool) -> anyhow::Result<()> {
    let cfg = MultiSearchConfig::load(config).await?;
    let (dispatcher, _store) = server::build_dispatcher(&cfg);
    let (transport, _router) = transport::spawn(Arc::new(dispatcher));

    let reply = transport
        .request(Request::SearchAll {
            prompt: prompt.to_string(),
        })
        .await?;
    match reply {
        Reply::Results(results) if json => {
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Reply::Results(results) => print!("{}", render::results(&results)),
        Reply::Outcome(outcome) => {
            return Err(anyhow::anyhow!(
                "{}",
                outcome.error().unwrap_or("unexpected reply")
            ));
        }
    }
    Ok(())
}

async fn test_one(
    config: Option<PathBuf>,
    provider: String,
    key: Option<String>,
    prompt: Option<String>,
) -> anyhow::Result<()> {
    let cfg = MultiSearchConfig::load(config).await?;
    let (dispatcher, store) = server::build_dispatcher(&cfg);

    let credential = match key {
        Some(k) => Some(k),
        None => match provider.parse::<Provider>() {
            Ok(p) => store.credentials(&[p]).await?.remove(&p).flatten(),
            Err(_) => None,
        },
    };

    let (transport, _router) = transport::spawn(Arc::new(dispatcher));
    let reply = transport
        .request(Request::TestOne {
            provider: provider.clone(),
            credential,
            prompt: prompt.unwrap_or_else(|| cfg.test.prompt.clone()),
        })
        .await?;

    match reply {
        Reply::Outcome(outcome) if outcome.is_success() => {
            println!("{provider}: Connection successful");
            Ok(())
        }
        Reply::Outcome(outcome) => Err(anyhow::anyhow!(
            "{provider}: Test failed: {}",
            outcome.error().unwrap_or("Unknown error occurred")
        )),
        Reply::Results(_) => Err(anyhow::anyhow!("unexpected reply to testOne")),
    }
}

async fn test_all(config: Option<PathBuf>) -> anyhow::Result<()> {
    let cfg = MultiSearchConfig::load(config).await?;
    let (dispatcher, store) = server::build_dispatcher(&cfg);
    let keys = store.credentials(&Provider::ALL).await?;
    let (transport, _router) = transport::spawn(Arc::new(dispatcher));

    for provider in Provider::ALL {
        let Some(key) = keys.get(&provider).cloned().flatten() else {
            println!("{}: No API key to test", provider.display_name());
            continue;
        };

        let reply = transport
            .request(Request::TestOne {
                provider: provider.to_string(),
                credential: Some(key),
                prompt: cfg.test.prompt.clone(),
            })
            .await?;
        match reply {
            Reply::Outcome(o) if o.is_success() => {
                println!("{}: Connection successful", provider.display_name())
            }
            Reply::Outcome(o) => println!(
                "{}: Test failed: {}",
                provider.display_name(),
                o.error().unwrap_or("Unknown error occurred")
            ),
            Reply::Results(_) => println!("{}: unexpected reply", provider.display_name()),
        }

        tokio::time::sleep(Duration::from_millis(cfg.test.delay_ms)).await;
    }
    println!("Connection tests completed");
    Ok(())
}

async fn keys_command(config: Option<PathBuf>, command: KeysCommand) -> anyhow::Result<()> {
    let cfg = MultiSearchConfig::load(config).await?;
    let store = server::key_store(&cfg);

    match command {
        KeysCommand::Set {
            provider,
            key,
            force,
        } => {
            store.set(provider, &key, !force).await?;
            println!("{}: API key saved", provider.display_name());
        }
        KeysCommand::Clear => {
            let removed = store.clear().await?;
            println!("cleared {removed} API key(s) from {}", store.path().display());
        }
        KeysCommand::Status => {
            for status in store.status().await? {
                let state = match (&status.masked, status.from_env) {
                    (Some(m), true) => format!("{m} (from {})", status.provider.env_var()),
                    (Some(m), false) => m.clone(),
                    (None, _) => "not set".to_string(),
                };
                println!("{:<14} {state}", status.provider.display_name());
            }
        }
    }
    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("info,multisearch=debug,ms_app=debug,ms_llm=debug,tower_http=info"),
    };
    let log_format = std::env::var("MULTISEARCH_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported MULTISEARCH_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(log_format = %log_format, "tracing initialized");
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(panic_location = %location, "panic captured");
        default_hook(panic_info);
    }));
}
