pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod storage;

pub use adapters::PostgresStore;
pub use config::{AppConfig, EngineConfig};
pub use domain::{
    AgentState, ConversationDeltas, ConversationStats, MetricsBundle, Suggestion,
    SuggestionResult, UserStats,
};
pub use engine::MetricsEngine;
pub use error::{MaxError, Result};
pub use storage::{Ledger, StatsStore};
