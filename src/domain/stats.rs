use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::{AgentState, BettingPattern, MetricsBundle, RiskLevel, TrustMetrics};

/// Durable per-user home for behavioral/risk/strategy metrics.
///
/// Exclusively owned by the persistence writer: created on first computation,
/// fully rewritten on every recomputation, never deleted while the user
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: Uuid,

    // Financial
    pub total_amount_spent: Decimal,
    pub total_bets: i32,
    pub wins: i32,
    pub net_profit_loss: Decimal,
    pub average_stake_size: Decimal,
    pub win_rate: f64,
    pub roi_percentage: f64,

    // Behavioral
    pub betting_frequency: f64,
    pub favorite_sports: Vec<String>,
    pub favorite_markets: Vec<String>,
    pub betting_pattern: BettingPattern,
    pub preferred_stake_min: Decimal,
    pub preferred_stake_max: Decimal,
    pub player_persona: String,

    // Engagement
    pub session_count: i32,
    pub avg_session_duration_minutes: f64,
    pub total_engagement_minutes: f64,
    pub days_since_last_session: i64,
    pub conversation_frequency: f64,
    pub response_rate: f64,

    // Risk
    pub momentum_score: f64,
    pub loss_chasing_index: f64,
    pub churn_risk: f64,
    pub risk_level: RiskLevel,

    // Strategy
    pub current_agent_state: AgentState,
    pub recommended_agent_state: AgentState,

    pub updated_at: DateTime<Utc>,
}

impl UserStats {
    /// Flatten a computed bundle into the row shape. The recommended state is
    /// adopted as current: the selector re-evaluates fresh each turn.
    pub fn from_bundle(user_id: Uuid, bundle: &MetricsBundle, now: DateTime<Utc>) -> Self {
        let financial = &bundle.financial_metrics;
        let behavioral = &bundle.behavioral_metrics;
        let engagement = &bundle.engagement_metrics;
        let risk = &bundle.risk_metrics;
        let strategy = &bundle.strategy_metrics;

        Self {
            user_id,
            total_amount_spent: financial.total_amount_spent,
            total_bets: financial.total_bets as i32,
            wins: financial.wins as i32,
            net_profit_loss: financial.net_profit_loss,
            average_stake_size: financial.average_stake_size,
            win_rate: financial.win_rate,
            roi_percentage: financial.roi_percentage,
            betting_frequency: behavioral.betting_frequency,
            favorite_sports: behavioral.favorite_sports.clone(),
            favorite_markets: behavioral.favorite_markets.clone(),
            betting_pattern: behavioral.betting_pattern,
            preferred_stake_min: behavioral.preferred_stake_range.min,
            preferred_stake_max: behavioral.preferred_stake_range.max,
            player_persona: behavioral.betting_pattern.as_str().to_string(),
            session_count: engagement.session_count as i32,
            avg_session_duration_minutes: engagement.avg_session_duration_minutes,
            total_engagement_minutes: engagement.total_engagement_minutes,
            days_since_last_session: engagement.days_since_last_session,
            conversation_frequency: engagement.conversation_frequency,
            response_rate: engagement.response_rate,
            momentum_score: risk.momentum_score,
            loss_chasing_index: risk.loss_chasing_index,
            churn_risk: risk.churn_risk,
            risk_level: risk.risk_level,
            current_agent_state: strategy.recommended_state,
            recommended_agent_state: strategy.recommended_state,
            updated_at: now,
        }
    }
}

/// Durable per-user home for trust/conversational-tone metrics.
///
/// The four 0–100 tone fields are nudged incrementally by per-turn deltas
/// from conversation analysis; the engine only rewrites the trust block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationStats {
    pub user_id: Uuid,

    // Tone fields, 0–100, delta-nudged
    pub confidence_level: f64,
    pub empathy_level: f64,
    pub trust_indicators: f64,
    pub engagement_score: f64,

    // Engine-owned trust block
    pub trust_score: f64,
    pub suggestion_acceptance_rate: f64,
    pub suggestion_success_rate: f64,
    pub missed_opportunity_value: Decimal,

    pub sentiment_trend: String,
    pub updated_at: DateTime<Utc>,
}

impl ConversationStats {
    /// Neutral row for a user seen for the first time
    pub fn seed(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            confidence_level: 50.0,
            empathy_level: 50.0,
            trust_indicators: 50.0,
            engagement_score: 50.0,
            trust_score: 0.0,
            suggestion_acceptance_rate: 0.0,
            suggestion_success_rate: 0.0,
            missed_opportunity_value: Decimal::ZERO,
            sentiment_trend: "neutral".to_string(),
            updated_at: now,
        }
    }

    /// Overwrite the engine-owned trust block, leaving the tone fields to the
    /// incremental delta process.
    pub fn apply_engine_metrics(&mut self, trust: &TrustMetrics, now: DateTime<Utc>) {
        self.trust_score = trust.trust_score;
        self.suggestion_acceptance_rate = trust.suggestion_acceptance_rate;
        self.suggestion_success_rate = trust.suggestion_success_rate;
        self.missed_opportunity_value = trust.missed_opportunity_value;
        self.updated_at = now;
    }

    /// Nudge the tone fields by per-turn deltas, clamping each to [0, 100]
    pub fn apply_deltas(&mut self, deltas: &ConversationDeltas, now: DateTime<Utc>) {
        self.confidence_level = (self.confidence_level + deltas.confidence).clamp(0.0, 100.0);
        self.empathy_level = (self.empathy_level + deltas.empathy).clamp(0.0, 100.0);
        self.trust_indicators = (self.trust_indicators + deltas.trust).clamp(0.0, 100.0);
        self.engagement_score = (self.engagement_score + deltas.engagement).clamp(0.0, 100.0);
        if let Some(sentiment) = &deltas.sentiment {
            self.sentiment_trend = sentiment.clone();
        }
        self.updated_at = now;
    }
}

/// Per-turn adjustments extracted from conversation analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationDeltas {
    pub confidence: f64,
    pub empathy: f64,
    pub trust: f64,
    pub engagement: f64,
    pub sentiment: Option<String>,
}
