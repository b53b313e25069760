//! Metrics computation engine.
//!
//! One pass per conversation turn: fetch a ledger snapshot, run the
//! calculators in dependency order (financial/behavioral/engagement are
//! independent; trust needs financial; risk needs financial+trust+engagement;
//! the state selector needs trust+risk), and hand the bundle back to the
//! caller. Persistence is a separate, recoverable step.

pub mod behavioral;
pub mod engagement;
pub mod financial;
pub mod risk;
pub mod strategy;
pub mod trust;

#[cfg(test)]
pub(crate) mod testutil;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::{
    ConversationStats, FinalOutcome, MessageStamp, MetricsBundle, PredictionInfo, Sport,
    StrategyMetrics, Suggestion, SuggestionResult, UserProfile, UserStats,
};
use crate::error::{MaxError, Result};
use crate::storage::{Ledger, StatsStore};

/// Immutable view of one user's history, fetched once per pass.
///
/// All calculators read from this snapshot; none of them touch storage.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub profile: UserProfile,
    /// Ascending by timestamp
    pub suggestions: Vec<Suggestion>,
    /// Keyed by suggestion id
    pub results: HashMap<Uuid, SuggestionResult>,
    pub messages: Vec<MessageStamp>,
    /// Resolved prediction metadata keyed by (sport, legacy id)
    pub predictions: HashMap<(Sport, String), PredictionInfo>,
}

impl LedgerSnapshot {
    pub fn accepted(&self) -> Vec<&Suggestion> {
        self.suggestions.iter().filter(|s| s.is_accepted()).collect()
    }

    pub fn result_for(&self, suggestion_id: Uuid) -> Option<&SuggestionResult> {
        self.results.get(&suggestion_id)
    }

    /// Prediction metadata for a suggestion, falling back to default
    /// odds/market when resolution failed upstream.
    pub fn prediction_for(&self, suggestion: &Suggestion) -> PredictionInfo {
        self.predictions
            .get(&(suggestion.sport, suggestion.legacy_prediction_id.clone()))
            .cloned()
            .unwrap_or_else(PredictionInfo::fallback)
    }
}

/// The engine proper: storage handles in, metrics bundle out.
pub struct MetricsEngine<L, P> {
    ledger: Arc<L>,
    stats: Arc<P>,
    config: EngineConfig,
}

impl<L: Ledger, P: StatsStore> MetricsEngine<L, P> {
    pub fn new(ledger: Arc<L>, stats: Arc<P>, config: EngineConfig) -> Self {
        Self {
            ledger,
            stats,
            config,
        }
    }

    /// Read-only computation pass: no persistence, ledger I/O only.
    #[instrument(skip(self))]
    pub async fn compute_metrics(&self, user_id: Uuid) -> Result<MetricsBundle> {
        let now = Utc::now();
        let (bundle, _) = self.compute_pass(user_id, now).await?;
        Ok(bundle)
    }

    /// Compute, then upsert the stats rows. A persistence failure is logged
    /// and reported as `false`; the computed bundle is returned either way
    /// so the conversation pipeline can still use it for this turn.
    #[instrument(skip(self))]
    pub async fn compute_and_persist_metrics(
        &self,
        user_id: Uuid,
    ) -> Result<(MetricsBundle, bool)> {
        let now = Utc::now();
        let (bundle, prior_conversation) = self.compute_pass(user_id, now).await?;

        let user_row = UserStats::from_bundle(user_id, &bundle, now);
        let mut conversation_row =
            prior_conversation.unwrap_or_else(|| ConversationStats::seed(user_id, now));
        conversation_row.apply_engine_metrics(&bundle.trust_metrics, now);

        match self
            .stats
            .upsert_stats(user_id, &user_row, &conversation_row)
            .await
        {
            Ok(()) => Ok((bundle, true)),
            Err(e) => {
                warn!(%user_id, error = %e, "stats upsert failed; returning computed bundle");
                Ok((bundle, false))
            }
        }
    }

    async fn compute_pass(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(MetricsBundle, Option<ConversationStats>)> {
        let snapshot = self.fetch_snapshot(user_id, now).await?;
        let prior_conversation = self.stats.load_conversation_stats(user_id).await?;
        let prior_user = self.stats.load_user_stats(user_id).await?;

        let financial_metrics = financial::compute(&snapshot);
        let behavioral_metrics = behavioral::compute(&snapshot, now);
        let engagement_metrics = engagement::compute(&snapshot.messages, now);
        let trust_metrics =
            trust::compute(&snapshot, &financial_metrics, prior_conversation.as_ref());
        let risk_metrics = risk::compute(
            &snapshot,
            &financial_metrics,
            &trust_metrics,
            &engagement_metrics,
        );

        let previous_state = prior_user
            .map(|u| u.current_agent_state)
            .unwrap_or_default();
        let recommended_state =
            strategy::select_state(snapshot.suggestions.len(), &trust_metrics, &risk_metrics);

        debug!(
            %user_id,
            suggestions = snapshot.suggestions.len(),
            trust = trust_metrics.trust_score,
            momentum = risk_metrics.momentum_score,
            churn = risk_metrics.churn_risk,
            state = %recommended_state,
            "metrics pass complete"
        );

        let bundle = MetricsBundle {
            financial_metrics,
            behavioral_metrics,
            engagement_metrics,
            trust_metrics,
            risk_metrics,
            strategy_metrics: StrategyMetrics {
                previous_state,
                recommended_state,
            },
        };

        Ok((bundle, prior_conversation))
    }

    /// Fetch everything one pass needs. Prediction metadata is resolved only
    /// for suggestions that use it: accepted ones (market favorites) and
    /// ignored ones that went on to win (missed-opportunity odds). A failed
    /// resolution degrades to fallback metadata; storage failures abort the
    /// whole pass.
    async fn fetch_snapshot(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<LedgerSnapshot> {
        let profile = self.ledger.get_user_profile(user_id).await?;

        let suggestion_cutoff = now - Duration::days(self.config.suggestion_lookback_days);
        let message_cutoff = now - Duration::days(self.config.session_lookback_days);

        let suggestions = self
            .ledger
            .get_suggestions(user_id, suggestion_cutoff)
            .await?;
        let suggestion_ids: Vec<Uuid> = suggestions.iter().map(|s| s.id).collect();
        let results: HashMap<Uuid, SuggestionResult> = self
            .ledger
            .get_results(&suggestion_ids)
            .await?
            .into_iter()
            .map(|r| (r.suggestion_id, r))
            .collect();
        let messages = self.ledger.get_message_log(user_id, message_cutoff).await?;

        let mut predictions = HashMap::new();
        for suggestion in &suggestions {
            let ignored_winner = suggestion.is_ignored()
                && results
                    .get(&suggestion.id)
                    .map_or(false, |r| r.final_outcome == FinalOutcome::Win);
            if !suggestion.is_accepted() && !ignored_winner {
                continue;
            }

            let key = (suggestion.sport, suggestion.legacy_prediction_id.clone());
            if predictions.contains_key(&key) {
                continue;
            }

            let info = match self
                .ledger
                .resolve_prediction(suggestion.sport, &suggestion.legacy_prediction_id)
                .await
            {
                Ok(info) => info,
                Err(MaxError::PredictionResolution(reason)) => {
                    warn!(
                        %user_id,
                        sport = %suggestion.sport,
                        legacy_id = %suggestion.legacy_prediction_id,
                        reason,
                        "prediction unresolvable; using fallback odds"
                    );
                    PredictionInfo::fallback()
                }
                Err(e) => return Err(e),
            };
            predictions.insert(key, info);
        }

        Ok(LedgerSnapshot {
            profile,
            suggestions,
            results,
            messages,
            predictions,
        })
    }
}
