//! Full-pass tests for the metrics engine over stub storage.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use maxbot::config::EngineConfig;
use maxbot::domain::{
    AgentState, ConversationDeltas, ConversationStats, FinalOutcome, MessageStamp, PredictionInfo,
    Sport, Suggestion, SuggestionResult, UserAction, UserProfile, UserStats,
};
use maxbot::engine::MetricsEngine;
use maxbot::error::{MaxError, Result};
use maxbot::storage::{Ledger, StatsStore};

#[derive(Default)]
struct StubLedger {
    profile: Option<UserProfile>,
    suggestions: Vec<Suggestion>,
    results: Vec<SuggestionResult>,
    messages: Vec<MessageStamp>,
    predictions: HashMap<(Sport, String), PredictionInfo>,
}

#[async_trait]
impl Ledger for StubLedger {
    async fn get_user_profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.profile.clone().ok_or(MaxError::UserNotFound(user_id))
    }

    async fn get_suggestions(
        &self,
        _user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<Suggestion>> {
        Ok(self
            .suggestions
            .iter()
            .filter(|s| s.timestamp >= since)
            .cloned()
            .collect())
    }

    async fn get_results(&self, suggestion_ids: &[Uuid]) -> Result<Vec<SuggestionResult>> {
        Ok(self
            .results
            .iter()
            .filter(|r| suggestion_ids.contains(&r.suggestion_id))
            .cloned()
            .collect())
    }

    async fn get_message_log(
        &self,
        _user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<MessageStamp>> {
        Ok(self
            .messages
            .iter()
            .filter(|m| m.timestamp >= since)
            .cloned()
            .collect())
    }

    async fn resolve_prediction(&self, sport: Sport, legacy_id: &str) -> Result<PredictionInfo> {
        self.predictions
            .get(&(sport, legacy_id.to_string()))
            .cloned()
            .ok_or_else(|| {
                MaxError::PredictionResolution(format!(
                    "no prediction record for {sport}/{legacy_id}"
                ))
            })
    }
}

#[derive(Default)]
struct StubStatsStore {
    fail_writes: bool,
    user_stats: Mutex<Option<UserStats>>,
    conversation_stats: Mutex<Option<ConversationStats>>,
}

#[async_trait]
impl StatsStore for StubStatsStore {
    async fn load_user_stats(&self, _user_id: Uuid) -> Result<Option<UserStats>> {
        Ok(self.user_stats.lock().unwrap().clone())
    }

    async fn load_conversation_stats(&self, _user_id: Uuid) -> Result<Option<ConversationStats>> {
        Ok(self.conversation_stats.lock().unwrap().clone())
    }

    async fn upsert_stats(
        &self,
        _user_id: Uuid,
        user_stats: &UserStats,
        conversation_stats: &ConversationStats,
    ) -> Result<()> {
        if self.fail_writes {
            return Err(MaxError::PersistenceWrite(sqlx::Error::RowNotFound));
        }
        *self.user_stats.lock().unwrap() = Some(user_stats.clone());
        *self.conversation_stats.lock().unwrap() = Some(conversation_stats.clone());
        Ok(())
    }

    async fn apply_conversation_deltas(
        &self,
        user_id: Uuid,
        deltas: &ConversationDeltas,
    ) -> Result<ConversationStats> {
        let now = Utc::now();
        let mut guard = self.conversation_stats.lock().unwrap();
        let mut stats = guard
            .clone()
            .unwrap_or_else(|| ConversationStats::seed(user_id, now));
        stats.apply_deltas(deltas, now);
        *guard = Some(stats.clone());
        Ok(stats)
    }
}

fn profile(user_id: Uuid, now: DateTime<Utc>, age_days: i64) -> UserProfile {
    UserProfile {
        user_id,
        display_name: "punter".to_string(),
        created_at: now - Duration::days(age_days),
    }
}

fn suggestion(
    user_id: Uuid,
    now: DateTime<Utc>,
    index: i64,
    stake: Decimal,
    action: Option<UserAction>,
) -> Suggestion {
    Suggestion {
        id: Uuid::new_v4(),
        user_id,
        sport: Sport::Cricket,
        legacy_prediction_id: format!("p-{index}"),
        suggested_stake: stake,
        actual_stake_used: None,
        timestamp: now - Duration::minutes(120 - index),
        user_action: action,
        agent_state_when_suggested: AgentState::Guide,
    }
}

fn settled(s: &Suggestion, outcome: FinalOutcome, pnl: Decimal) -> SuggestionResult {
    SuggestionResult {
        id: Uuid::new_v4(),
        suggestion_id: s.id,
        final_outcome: outcome,
        profit_loss: pnl,
        result_timestamp: s.timestamp + Duration::hours(3),
    }
}

fn engine(
    ledger: StubLedger,
    stats: StubStatsStore,
) -> (
    MetricsEngine<StubLedger, StubStatsStore>,
    Arc<StubStatsStore>,
) {
    let stats = Arc::new(stats);
    (
        MetricsEngine::new(Arc::new(ledger), stats.clone(), EngineConfig::default()),
        stats,
    )
}

#[tokio::test]
async fn missing_user_is_fatal() {
    let user_id = Uuid::new_v4();
    let (engine, _) = engine(StubLedger::default(), StubStatsStore::default());

    let err = engine.compute_metrics(user_id).await.unwrap_err();
    assert!(matches!(err, MaxError::UserNotFound(id) if id == user_id));
}

#[tokio::test]
async fn zero_history_user_computes_guide_defaults() {
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    let ledger = StubLedger {
        profile: Some(profile(user_id, now, 5)),
        ..Default::default()
    };
    let (engine, _) = engine(ledger, StubStatsStore::default());

    let bundle = engine.compute_metrics(user_id).await.unwrap();

    assert_eq!(bundle.financial_metrics.total_bets, 0);
    assert_eq!(bundle.financial_metrics.win_rate, 0.0);
    assert_eq!(bundle.financial_metrics.roi_percentage, 0.0);
    assert_eq!(bundle.behavioral_metrics.betting_frequency, 0.0);
    assert_eq!(bundle.trust_metrics.trust_score, 0.0);
    assert_eq!(bundle.risk_metrics.momentum_score, 0.0);
    assert!(bundle.risk_metrics.churn_risk >= 0.0 && bundle.risk_metrics.churn_risk <= 1.0);
    assert_eq!(bundle.strategy_metrics.recommended_state, AgentState::Guide);
}

#[tokio::test]
async fn hot_streak_ledger_amplifies() {
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    // 10 accepted bets at stake 100: six +50 wins, then four -30 losses
    let mut suggestions = Vec::new();
    let mut results = Vec::new();
    for i in 0..10 {
        let s = suggestion(user_id, now, i, dec!(100), Some(UserAction::Accepted));
        if i < 6 {
            results.push(settled(&s, FinalOutcome::Win, dec!(50)));
        } else {
            results.push(settled(&s, FinalOutcome::Loss, dec!(-30)));
        }
        suggestions.push(s);
    }

    let ledger = StubLedger {
        profile: Some(profile(user_id, now, 30)),
        suggestions,
        results,
        messages: vec![
            MessageStamp {
                session_id: "s-1".to_string(),
                timestamp: now - Duration::minutes(20),
            },
            MessageStamp {
                session_id: "s-1".to_string(),
                timestamp: now - Duration::minutes(10),
            },
        ],
        ..Default::default()
    };
    let (engine, _) = engine(ledger, StubStatsStore::default());

    let bundle = engine.compute_metrics(user_id).await.unwrap();
    let financial = &bundle.financial_metrics;

    assert_eq!(financial.total_amount_spent, dec!(1000));
    assert_eq!(financial.net_profit_loss, dec!(180));
    assert!((financial.win_rate - 0.6).abs() < 1e-9);
    assert!((financial.roi_percentage - 18.0).abs() < 1e-9);

    // SAR 1.0, SSR 0.6: trust 0.84; momentum 180/100 + 0.2 = 2.0
    assert!((bundle.trust_metrics.trust_score - 0.84).abs() < 1e-9);
    assert!((bundle.risk_metrics.momentum_score - 2.0).abs() < 1e-9);
    assert_eq!(
        bundle.strategy_metrics.recommended_state,
        AgentState::Amplifier
    );
}

#[tokio::test]
async fn persist_writes_both_rows_and_reports_success() {
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    let s = suggestion(user_id, now, 0, dec!(50), Some(UserAction::Accepted));
    let results = vec![settled(&s, FinalOutcome::Win, dec!(40))];
    let ledger = StubLedger {
        profile: Some(profile(user_id, now, 10)),
        suggestions: vec![s],
        results,
        ..Default::default()
    };
    let (engine, stats) = engine(ledger, StubStatsStore::default());

    let (bundle, success) = engine.compute_and_persist_metrics(user_id).await.unwrap();
    assert!(success);

    let user_row = stats.user_stats.lock().unwrap().clone().unwrap();
    let conversation_row = stats.conversation_stats.lock().unwrap().clone().unwrap();

    assert_eq!(user_row.total_bets, 1);
    assert_eq!(
        user_row.current_agent_state,
        bundle.strategy_metrics.recommended_state
    );
    assert_eq!(conversation_row.trust_score, bundle.trust_metrics.trust_score);
    assert_eq!(
        conversation_row.suggestion_acceptance_rate,
        bundle.trust_metrics.suggestion_acceptance_rate
    );
}

#[tokio::test]
async fn persistence_failure_still_returns_bundle() {
    let user_id = Uuid::new_v4();
    let now = Utc::now();
    let ledger = StubLedger {
        profile: Some(profile(user_id, now, 10)),
        ..Default::default()
    };
    let stats = StubStatsStore {
        fail_writes: true,
        ..Default::default()
    };
    let (engine, stats) = engine(ledger, stats);

    let (bundle, success) = engine.compute_and_persist_metrics(user_id).await.unwrap();

    assert!(!success);
    assert_eq!(bundle.strategy_metrics.recommended_state, AgentState::Guide);
    assert!(stats.user_stats.lock().unwrap().is_none());
    assert!(stats.conversation_stats.lock().unwrap().is_none());
}

#[tokio::test]
async fn unresolvable_prediction_degrades_to_fallback_odds() {
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    let accepted = suggestion(user_id, now, 0, dec!(20), Some(UserAction::Accepted));
    let ignored = suggestion(user_id, now, 1, dec!(20), Some(UserAction::Ignored));
    let results = vec![
        settled(&accepted, FinalOutcome::Loss, dec!(-20)),
        settled(&ignored, FinalOutcome::Win, dec!(0)),
    ];

    // No prediction records at all: resolution fails for every lookup
    let ledger = StubLedger {
        profile: Some(profile(user_id, now, 30)),
        suggestions: vec![accepted, ignored],
        results,
        ..Default::default()
    };
    let (engine, _) = engine(ledger, StubStatsStore::default());

    let bundle = engine.compute_metrics(user_id).await.unwrap();

    // Fallback odds 2.0 against the accepted average stake of 20
    assert_eq!(bundle.trust_metrics.missed_opportunity_value, dec!(20));
    assert_eq!(bundle.behavioral_metrics.favorite_markets, vec!["unknown"]);
}

#[tokio::test]
async fn suggestions_outside_lookback_window_are_ignored() {
    let user_id = Uuid::new_v4();
    let now = Utc::now();

    let mut stale = suggestion(user_id, now, 0, dec!(100), Some(UserAction::Accepted));
    stale.timestamp = now - Duration::days(200);

    let ledger = StubLedger {
        profile: Some(profile(user_id, now, 400)),
        suggestions: vec![stale],
        ..Default::default()
    };
    let (engine, _) = engine(ledger, StubStatsStore::default());

    let bundle = engine.compute_metrics(user_id).await.unwrap();
    assert_eq!(bundle.financial_metrics.total_bets, 0);
    assert_eq!(bundle.strategy_metrics.recommended_state, AgentState::Guide);
}
