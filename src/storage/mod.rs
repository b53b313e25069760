//! Storage collaborator seams.
//!
//! The engine never opens its own database sessions: the ledger (read side)
//! and the stats store (write side) are injected as trait handles, so the
//! calculators stay pure and the adapters stay swappable in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    ConversationDeltas, ConversationStats, MessageStamp, PredictionInfo, Sport, Suggestion,
    SuggestionResult, UserProfile, UserStats,
};
use crate::error::Result;

/// Read side: a user's suggestion/result ledger and chat history.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Fails with `MaxError::UserNotFound` when the user row is absent.
    /// A user with zero activity is a valid, computable state and returns
    /// normally from every other method.
    async fn get_user_profile(&self, user_id: Uuid) -> Result<UserProfile>;

    /// Suggestions for the user since the cutoff, ascending by timestamp.
    async fn get_suggestions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Suggestion>>;

    /// Resolved outcomes joined by suggestion id.
    async fn get_results(&self, suggestion_ids: &[Uuid]) -> Result<Vec<SuggestionResult>>;

    /// Chat message stamps for the user since the cutoff, ascending.
    /// Session windows are derived from these by the engagement calculator.
    async fn get_message_log(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageStamp>>;

    /// Odds/market metadata from the external prediction record. Fails with
    /// `MaxError::PredictionResolution` when the record is missing; the
    /// engine substitutes `PredictionInfo::fallback()` and continues.
    async fn resolve_prediction(&self, sport: Sport, legacy_id: &str) -> Result<PredictionInfo>;
}

/// Write side: the durable per-user stats rows.
#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn load_user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>>;

    async fn load_conversation_stats(&self, user_id: Uuid) -> Result<Option<ConversationStats>>;

    /// Upsert both rows in one transaction. The write is all-or-nothing: a
    /// reader must never observe fresh risk fields next to stale financial
    /// ones. Failure rolls back and surfaces `MaxError::PersistenceWrite`.
    async fn upsert_stats(
        &self,
        user_id: Uuid,
        user_stats: &UserStats,
        conversation_stats: &ConversationStats,
    ) -> Result<()>;

    /// Incremental per-turn nudge to the 0–100 tone fields, clamped on
    /// write. Returns the stored row.
    async fn apply_conversation_deltas(
        &self,
        user_id: Uuid,
        deltas: &ConversationDeltas,
    ) -> Result<ConversationStats>;
}
