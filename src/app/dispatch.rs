use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use wardgate::Config;
use wardgate::delegation::{DelegationFlow, FlowOutcome};
use wardgate::guardian::{BlockedVerdict, screen};
use wardgate::scan::{ScannerBank, StaticFilter};

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Chat { identity } => run_chat(config, identity).await,
        Commands::Check {
            text,
            output,
            prompt,
        } => run_check(&config, &text, output.then(|| prompt.unwrap_or_default())).await,
        Commands::Config => print_config(&config),
    }
}

async fn run_chat(config: Config, identity: Option<String>) -> Result<()> {
    let identity = identity.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let flow = Arc::new(DelegationFlow::from_config(&config));
    info!(identity = %identity, model = %config.provider.model, "chat.start");

    if config.session.idle_ttl_secs > 0 {
        spawn_idle_eviction(&flow, Duration::from_secs(config.session.idle_ttl_secs));
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    stdout.write_all(b"> ").await?;
    stdout.flush().await?;

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let input = line.trim();
        if matches!(input, "/exit" | "/quit") {
            break;
        }
        if !input.is_empty() {
            let outcome = flow.handle(&identity, input).await;
            stdout
                .write_all(format!("{}\n", outcome.user_message()).as_bytes())
                .await?;
            if let FlowOutcome::Delivered { contributors, .. } = &outcome
                && !contributors.is_empty()
            {
                info!(contributors = ?contributors, "chat.delegated");
            }
        }
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
    }
    Ok(())
}

fn spawn_idle_eviction(flow: &Arc<DelegationFlow>, ttl: Duration) {
    let store = Arc::clone(flow.store());
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(ttl);
        loop {
            tick.tick().await;
            store.evict_idle(ttl);
        }
    });
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    direction: &'a str,
    blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<BlockedVerdict>,
}

async fn run_check(config: &Config, text: &str, prompt: Option<String>) -> Result<()> {
    let bank = ScannerBank::from_config(&config.scanners);
    let filter = StaticFilter::from_config(&config.static_filter);
    let verdict = screen(&bank, &filter, prompt.as_deref(), text).await;

    let report = CheckReport {
        direction: if prompt.is_some() { "output" } else { "input" },
        blocked: verdict.is_some(),
        verdict,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn print_config(config: &Config) -> Result<()> {
    let rendered =
        toml::to_string_pretty(&config.redacted()).context("failed to render config")?;
    println!("# {}", config.config_path.display());
    print!("{rendered}");
    Ok(())
}
