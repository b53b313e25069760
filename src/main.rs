use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use maxbot::adapters::PostgresStore;
use maxbot::cli::output::OutputMode;
use maxbot::cli::{self, Cli, Commands};
use maxbot::config::AppConfig;
use maxbot::domain::ConversationDeltas;
use maxbot::engine::MetricsEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("config error: {error}");
        }
        anyhow::bail!("invalid configuration");
    }

    init_logging(&config);

    let store = PostgresStore::new(&config.database.url, config.database.max_connections).await?;

    match cli.command {
        Commands::Migrate => {
            store.migrate().await?;
            println!("migrations complete");
        }
        Commands::Compute {
            user_id,
            persist,
            json,
        } => {
            let store = Arc::new(store);
            let engine = MetricsEngine::new(store.clone(), store, config.engine.clone());
            cli::compute(&engine, user_id, persist, OutputMode::from_json_flag(json)).await?;
        }
        Commands::Show { user_id, json } => {
            cli::show(&store, user_id, OutputMode::from_json_flag(json)).await?;
        }
        Commands::Nudge {
            user_id,
            confidence,
            empathy,
            trust,
            engagement,
            sentiment,
        } => {
            let deltas = ConversationDeltas {
                confidence,
                empathy,
                trust,
                engagement,
                sentiment,
            };
            cli::nudge(&store, user_id, deltas).await?;
        }
    }

    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},maxbot=debug,sqlx=warn", config.logging.level))
    });

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
