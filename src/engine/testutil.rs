//! Shared builders for calculator unit tests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::LedgerSnapshot;
use crate::domain::{
    AgentState, FinalOutcome, MessageStamp, PredictionInfo, Sport, Suggestion, SuggestionResult,
    UserAction, UserProfile,
};

pub(crate) fn test_profile(now: DateTime<Utc>, age_days: i64) -> UserProfile {
    UserProfile {
        user_id: Uuid::new_v4(),
        display_name: "punter".to_string(),
        created_at: now - Duration::days(age_days),
    }
}

/// Suggestion `index` steps into the past hour, so ascending index means
/// ascending timestamp.
pub(crate) fn suggestion_with(
    user_id: Uuid,
    now: DateTime<Utc>,
    index: i64,
    sport: Sport,
    legacy_id: &str,
    stake: Decimal,
    action: Option<UserAction>,
) -> Suggestion {
    Suggestion {
        id: Uuid::new_v4(),
        user_id,
        sport,
        legacy_prediction_id: legacy_id.to_string(),
        suggested_stake: stake,
        actual_stake_used: None,
        timestamp: now - Duration::minutes(60 - index),
        user_action: action,
        agent_state_when_suggested: AgentState::Guide,
    }
}

pub(crate) fn accepted_suggestion(
    user_id: Uuid,
    now: DateTime<Utc>,
    index: i64,
    stake: Decimal,
) -> Suggestion {
    suggestion_with(
        user_id,
        now,
        index,
        Sport::Cricket,
        &format!("p-{index}"),
        stake,
        Some(UserAction::Accepted),
    )
}

pub(crate) fn settled(
    suggestion: &Suggestion,
    final_outcome: FinalOutcome,
    profit_loss: Decimal,
) -> SuggestionResult {
    SuggestionResult {
        id: Uuid::new_v4(),
        suggestion_id: suggestion.id,
        final_outcome,
        profit_loss,
        result_timestamp: suggestion.timestamp + Duration::hours(2),
    }
}

pub(crate) fn snapshot_of(
    profile: UserProfile,
    suggestions: Vec<Suggestion>,
    results: Vec<SuggestionResult>,
) -> LedgerSnapshot {
    snapshot_full(profile, suggestions, results, vec![], vec![])
}

pub(crate) fn snapshot_full(
    profile: UserProfile,
    suggestions: Vec<Suggestion>,
    results: Vec<SuggestionResult>,
    messages: Vec<MessageStamp>,
    predictions: Vec<((Sport, String), PredictionInfo)>,
) -> LedgerSnapshot {
    LedgerSnapshot {
        profile,
        suggestions,
        results: results.into_iter().map(|r| (r.suggestion_id, r)).collect(),
        messages,
        predictions: predictions.into_iter().collect::<HashMap<_, _>>(),
    }
}
