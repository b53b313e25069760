//! maxbot CLI — operate the metrics engine against the configured database.
//!
//! Commands:
//! - `maxbot migrate` - Run database migrations
//! - `maxbot compute` - Run one metrics pass for a user
//! - `maxbot show`    - Print a user's persisted stats
//! - `maxbot nudge`   - Apply per-turn conversation deltas

pub mod output;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::adapters::PostgresStore;
use crate::domain::{ConversationDeltas, MetricsBundle};
use crate::engine::MetricsEngine;
use crate::storage::StatsStore;
use output::{print_json, print_rows, MetricRow, OutputMode};

/// M.A.X. metrics engine CLI
#[derive(Parser, Debug)]
#[command(name = "maxbot")]
#[command(author, version, about = "User metrics and agent-state engine for M.A.X.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run database migrations
    Migrate,

    /// Run one metrics computation pass for a user
    Compute {
        #[arg(long)]
        user_id: Uuid,
        /// Also upsert the computed bundle into the stats tables
        #[arg(long)]
        persist: bool,
        /// Print the full bundle as JSON instead of a summary table
        #[arg(long)]
        json: bool,
    },

    /// Show a user's persisted stats rows
    Show {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long)]
        json: bool,
    },

    /// Apply per-turn conversation-analysis deltas to the tone fields
    Nudge {
        #[arg(long)]
        user_id: Uuid,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        confidence: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        empathy: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        trust: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        engagement: f64,
        #[arg(long)]
        sentiment: Option<String>,
    },
}

pub async fn compute(
    engine: &MetricsEngine<PostgresStore, PostgresStore>,
    user_id: Uuid,
    persist: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let (bundle, persisted) = if persist {
        let (bundle, success) = engine.compute_and_persist_metrics(user_id).await?;
        (bundle, Some(success))
    } else {
        (engine.compute_metrics(user_id).await?, None)
    };

    match mode {
        OutputMode::Json => print_json(&bundle)?,
        OutputMode::Table => print_rows(&bundle_rows(&bundle)),
    }

    if let Some(success) = persisted {
        println!("persisted: {success}");
    }
    Ok(())
}

fn bundle_rows(bundle: &MetricsBundle) -> Vec<MetricRow> {
    let financial = &bundle.financial_metrics;
    let behavioral = &bundle.behavioral_metrics;
    let engagement = &bundle.engagement_metrics;
    let trust = &bundle.trust_metrics;
    let risk = &bundle.risk_metrics;
    let strategy = &bundle.strategy_metrics;

    vec![
        MetricRow::new("total_bets", financial.total_bets),
        MetricRow::new("total_amount_spent", financial.total_amount_spent),
        MetricRow::new("net_profit_loss", financial.net_profit_loss),
        MetricRow::new("win_rate", format!("{:.3}", financial.win_rate)),
        MetricRow::new("roi_percentage", format!("{:.2}", financial.roi_percentage)),
        MetricRow::new("betting_pattern", behavioral.betting_pattern),
        MetricRow::new(
            "betting_frequency",
            format!("{:.3}", behavioral.betting_frequency),
        ),
        MetricRow::new("favorite_sports", behavioral.favorite_sports.join(", ")),
        MetricRow::new("session_count", engagement.session_count),
        MetricRow::new(
            "days_since_last_session",
            engagement.days_since_last_session,
        ),
        MetricRow::new("trust_score", format!("{:.3}", trust.trust_score)),
        MetricRow::new(
            "missed_opportunity_value",
            trust.missed_opportunity_value,
        ),
        MetricRow::new("momentum_score", format!("{:.3}", risk.momentum_score)),
        MetricRow::new(
            "loss_chasing_index",
            format!("{:.3}", risk.loss_chasing_index),
        ),
        MetricRow::new("churn_risk", format!("{:.3}", risk.churn_risk)),
        MetricRow::new("risk_level", risk.risk_level),
        MetricRow::new("agent_state", strategy.recommended_state),
    ]
}

pub async fn show(store: &PostgresStore, user_id: Uuid, mode: OutputMode) -> anyhow::Result<()> {
    let user_stats = store.load_user_stats(user_id).await?;
    let conversation_stats = store.load_conversation_stats(user_id).await?;

    match mode {
        OutputMode::Json => {
            print_json(&serde_json::json!({
                "user_stats": user_stats,
                "conversation_stats": conversation_stats,
            }))?;
        }
        OutputMode::Table => {
            match user_stats {
                Some(stats) => print_rows(&[
                    MetricRow::new("total_bets", stats.total_bets),
                    MetricRow::new("net_profit_loss", stats.net_profit_loss),
                    MetricRow::new("betting_pattern", stats.betting_pattern),
                    MetricRow::new("churn_risk", format!("{:.3}", stats.churn_risk)),
                    MetricRow::new("risk_level", stats.risk_level),
                    MetricRow::new("agent_state", stats.current_agent_state),
                    MetricRow::new("updated_at", stats.updated_at),
                ]),
                None => println!("(no user stats recorded)"),
            }
            match conversation_stats {
                Some(stats) => print_rows(&[
                    MetricRow::new("confidence_level", format!("{:.1}", stats.confidence_level)),
                    MetricRow::new("empathy_level", format!("{:.1}", stats.empathy_level)),
                    MetricRow::new("trust_score", format!("{:.3}", stats.trust_score)),
                    MetricRow::new(
                        "acceptance_rate",
                        format!("{:.3}", stats.suggestion_acceptance_rate),
                    ),
                    MetricRow::new(
                        "success_rate",
                        format!("{:.3}", stats.suggestion_success_rate),
                    ),
                    MetricRow::new(
                        "missed_opportunity_value",
                        stats.missed_opportunity_value,
                    ),
                    MetricRow::new("sentiment_trend", stats.sentiment_trend),
                ]),
                None => println!("(no conversation stats recorded)"),
            }
        }
    }
    Ok(())
}

pub async fn nudge(
    store: &PostgresStore,
    user_id: Uuid,
    deltas: ConversationDeltas,
) -> anyhow::Result<()> {
    let stats = store.apply_conversation_deltas(user_id, &deltas).await?;
    print_rows(&[
        MetricRow::new("confidence_level", format!("{:.1}", stats.confidence_level)),
        MetricRow::new("empathy_level", format!("{:.1}", stats.empathy_level)),
        MetricRow::new("trust_indicators", format!("{:.1}", stats.trust_indicators)),
        MetricRow::new("engagement_score", format!("{:.1}", stats.engagement_score)),
        MetricRow::new("sentiment_trend", stats.sentiment_trend),
    ]);
    Ok(())
}
