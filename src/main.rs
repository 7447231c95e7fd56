use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use kotonami::broadcast::BroadcastSink;
use kotonami::config::Config;
use kotonami::ingest::clock::{Clock, TokioClock};
use kotonami::ingest::worker::IngestWorker;
use kotonami::lexicon::clean::clean;
use kotonami::lexicon::heuristic::HeuristicExtractor;
use kotonami::lexicon::rules::RuleTables;
use kotonami::ranking::hub::TrendHub;
use kotonami::source::x_search::XSearchSource;
use kotonami::source::SourceError;

/// Kotonami: live keyword trends from Japanese social-media posts.
///
/// Polls a post source, extracts Japanese keywords with a dictionary-free
/// heuristic and keeps a running frequency ranking for live viewers.
#[derive(Parser)]
#[command(name = "kotonami", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the ingestion loop (and the web server, if built with it)
    Run {
        /// Port to listen on (default: PORT or 5001)
        #[arg(long)]
        port: Option<u16>,

        /// Address to bind (default: HOST or 0.0.0.0)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Extract keywords from a piece of text and show how each token was judged
    Extract {
        /// The text to analyze
        text: String,
    },

    /// Print the active classifier rule set as JSON
    Rules {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kotonami=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { port, bind } => {
            let config = Config::load()?;
            config.require_bearer_token()?;
            let port = port.unwrap_or(config.port);
            let bind = bind.unwrap_or_else(|| config.host.clone());
            run(config, port, &bind).await?;
        }

        Commands::Extract { text } => {
            let config = Config::load()?;
            let rules = RuleTables::load(config.rules_path.as_deref())?;
            let extractor = HeuristicExtractor::new(rules);

            let tokens = extractor.annotate(&text);
            kotonami::output::terminal::display_annotations(&text, &clean(&text), &tokens);
            println!(
                "{}",
                format!("Rules: {}", extractor.rules().version()).dimmed()
            );
        }

        Commands::Rules { out } => {
            let config = Config::load()?;
            let rules = RuleTables::load(config.rules_path.as_deref())?;
            let json = serde_json::to_string_pretty(rules.rule_set())?;

            match out {
                Some(path) => {
                    std::fs::write(&path, json + "\n")
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("Rule set {} written to {}", rules.version(), path.display());
                }
                None => println!("{json}"),
            }
        }
    }

    Ok(())
}

/// Wire the pipeline together and run until Ctrl-C.
async fn run(config: Config, port: u16, bind: &str) -> Result<()> {
    let rules = RuleTables::load(config.rules_path.as_deref())?;
    info!(rules = rules.version(), "Loaded classifier rules");
    let extractor = Arc::new(HeuristicExtractor::new(rules));
    let clock: Arc<dyn Clock> = Arc::new(TokioClock);
    let shutdown = CancellationToken::new();

    #[cfg(feature = "web")]
    let channel = Arc::new(kotonami::broadcast::ChannelSink::new(256));
    #[cfg(feature = "web")]
    let sink: Arc<dyn BroadcastSink> = channel.clone();
    #[cfg(not(feature = "web"))]
    let sink: Arc<dyn BroadcastSink> = Arc::new(kotonami::output::terminal::TerminalSink);

    let hub = Arc::new(TrendHub::new(config.hub_settings(), sink, clock.clone()));

    let source = XSearchSource::new(
        &config.api_url,
        &config.bearer_token,
        &config.query,
        config.max_results,
    )?;
    let mut worker = IngestWorker::new(
        source,
        hub.clone(),
        extractor,
        clock,
        config.worker_settings(),
    );

    let worker_cancel = shutdown.clone();
    let ingest = tokio::spawn(async move { worker.run(worker_cancel).await });

    let signal_cancel = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        signal_cancel.cancel();
    });

    #[cfg(feature = "web")]
    {
        let state = kotonami::web::AppState {
            hub: hub.clone(),
            sink: channel,
            shutdown: shutdown.clone(),
        };
        let bind = bind.to_string();
        let server_cancel = shutdown.clone();
        let server = tokio::spawn(async move {
            let result = kotonami::web::run_server(state, port, &bind).await;
            // A server that cannot bind takes the ingestion loop down with it.
            server_cancel.cancel();
            result
        });
        let outcome = finish_ingest(ingest.await);
        shutdown.cancel();
        server.await.context("Web server task panicked")??;
        outcome?;
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = (port, bind);
        finish_ingest(ingest.await)?;
    }

    let stats = hub.stats().await;
    println!(
        "\n{}",
        format!(
            "Stopped after {} records ({}s).",
            stats.processed_total, stats.uptime_seconds
        )
        .bold()
    );
    Ok(())
}

/// Turn the ingestion task's result into the process outcome.
fn finish_ingest(
    joined: Result<Result<(), SourceError>, tokio::task::JoinError>,
) -> Result<()> {
    match joined.context("Ingestion task panicked")? {
        Ok(()) => Ok(()),
        Err(SourceError::Auth(msg)) => {
            error!(error = %msg, "Source rejected the bearer token");
            anyhow::bail!(
                "The X API rejected the bearer token ({msg}).\n\
                 Check KOTONAMI_BEARER_TOKEN in your .env file."
            )
        }
        Err(e) => Err(e.into()),
    }
}
