//! # hardhat
//!
//! Construction crew job-site game. Wires the site ledger, the Ollama-backed
//! classifier and the turn pipeline to the console.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use hardhat_engine::game::spawn_line_reader;
use hardhat_engine::{Game, GameRules, Pipeline, RandomDice};
use hardhat_llm::{OllamaClassifier, OllamaConfig, ReliableClassifier, ReliableConfig};
use hardhat_store::{Database, SiteLedger};
use hardhat_telemetry::{init_telemetry, TelemetryConfig};

/// Construction crew job-site game.
#[derive(Parser, Debug)]
#[command(name = "hardhat", about = "Build a house before the budget runs out")]
struct Cli {
    /// Path to the `SQLite` site ledger. Wiped at the start of every game.
    #[arg(long, env = "HARDHAT_DB", default_value = "game_site.db")]
    db: PathBuf,

    /// Base URL of the Ollama server.
    #[arg(long, env = "OLLAMA_HOST", default_value = "http://localhost:11434")]
    ollama_host: String,

    /// Model used for every classification.
    #[arg(long, env = "HARDHAT_MODEL", default_value = "llama3")]
    model: String,

    /// Starting budget in dollars.
    #[arg(long, default_value_t = 2000)]
    budget: i64,

    /// Seed for the crew's dice. Omit for a fresh game every time.
    #[arg(long)]
    seed: Option<u64>,

    /// Give up on a classification after this many seconds.
    #[arg(long, default_value_t = 60)]
    classify_timeout_secs: u64,

    /// Log JSON lines to stderr.
    #[arg(long)]
    log_json: bool,

    /// `SQLite` file that receives one row per pipeline stage.
    #[arg(long, env = "HARDHAT_COLLECTOR_DB")]
    collector_db: Option<PathBuf>,
}

impl Cli {
    fn rules(&self) -> GameRules {
        GameRules {
            initial_budget: self.budget,
            ..GameRules::default()
        }
    }

    fn reliable_config(&self) -> ReliableConfig {
        ReliableConfig {
            call_timeout: Duration::from_secs(self.classify_timeout_secs),
            ..ReliableConfig::default()
        }
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let telemetry = init_telemetry(TelemetryConfig {
        json: cli.log_json,
        collector_db: cli.collector_db.clone(),
        ..TelemetryConfig::default()
    });

    ensure_parent_dir(&cli.db)?;
    let db = Database::open(&cli.db)
        .with_context(|| format!("Failed to open site ledger: {}", cli.db.display()))?;
    tracing::info!(path = %cli.db.display(), "site ledger opened");

    let ollama = OllamaClassifier::new(OllamaConfig {
        host: cli.ollama_host.clone(),
        model: cli.model.clone(),
    })
    .context("Failed to build Ollama client")?;
    let classifier = Arc::new(ReliableClassifier::new(ollama, cli.reliable_config()));

    let dice = match cli.seed {
        Some(seed) => RandomDice::seeded(seed),
        None => RandomDice::from_entropy(),
    };

    let pipeline = Pipeline::new(SiteLedger::new(db), classifier, Box::new(dice), cli.rules());
    let mut game = Game::new(pipeline);

    let input = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdout = std::io::stdout();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "ctrl-c handler unavailable");
            std::future::pending::<()>().await;
        }
    };
    let outcome = game
        .play_until(input, &mut stdout, interrupt)
        .await
        .context("Game aborted")?;

    tracing::info!(?outcome, "game finished");
    if let Some(collector) = telemetry.collector() {
        if let Ok(spans) = collector.count() {
            tracing::info!(spans, "stage spans collected");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["hardhat"]).unwrap();
        assert_eq!(cli.budget, 2000);
        assert_eq!(cli.classify_timeout_secs, 60);
        assert!(cli.seed.is_none());
        assert!(!cli.log_json);
        assert_eq!(cli.rules().labor_cost, 200);
        assert_eq!(cli.reliable_config().call_timeout, Duration::from_secs(60));
    }

    #[test]
    fn flags_override() {
        let cli = Cli::try_parse_from([
            "hardhat",
            "--db",
            "/tmp/site.db",
            "--model",
            "mistral",
            "--budget",
            "900",
            "--seed",
            "7",
            "--classify-timeout-secs",
            "5",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/site.db"));
        assert_eq!(cli.model, "mistral");
        assert_eq!(cli.rules().initial_budget, 900);
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.reliable_config().call_timeout, Duration::from_secs(5));
        assert!(cli.log_json);
    }

    #[test]
    fn bare_file_name_needs_no_parent_dir() {
        ensure_parent_dir(Path::new("game_site.db")).unwrap();
    }
}
