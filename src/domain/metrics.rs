use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Conversational persona the response-generation step adopts.
///
/// GUIDE is both the initial state and the stable default; the selector
/// re-evaluates from scratch every turn, so there is no transition history
/// beyond the persisted current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentState {
    #[default]
    Guide,
    Amplifier,
    Comforter,
    TrustBuilder,
    Guardian,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Guide => "GUIDE",
            AgentState::Amplifier => "AMPLIFIER",
            AgentState::Comforter => "COMFORTER",
            AgentState::TrustBuilder => "TRUST_BUILDER",
            AgentState::Guardian => "GUARDIAN",
        }
    }
}

impl TryFrom<&str> for AgentState {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "GUIDE" => Ok(AgentState::Guide),
            "AMPLIFIER" => Ok(AgentState::Amplifier),
            "COMFORTER" => Ok(AgentState::Comforter),
            "TRUST_BUILDER" => Ok(AgentState::TrustBuilder),
            "GUARDIAN" => Ok(AgentState::Guardian),
            other => Err(format!("unknown agent state: {other}")),
        }
    }
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse behavioral label derived from stake size and betting frequency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BettingPattern {
    HighRoller,
    Frequent,
    #[default]
    Casual,
}

impl BettingPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            BettingPattern::HighRoller => "high_roller",
            BettingPattern::Frequent => "frequent",
            BettingPattern::Casual => "casual",
        }
    }
}

impl TryFrom<&str> for BettingPattern {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "high_roller" => Ok(BettingPattern::HighRoller),
            "frequent" => Ok(BettingPattern::Frequent),
            "casual" => Ok(BettingPattern::Casual),
            other => Err(format!("unknown betting pattern: {other}")),
        }
    }
}

impl std::fmt::Display for BettingPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse risk label over churn risk and loss chasing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl TryFrom<&str> for RiskLevel {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observed stake bounds over accepted suggestions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRange {
    pub min: Decimal,
    pub max: Decimal,
}

/// Stake/profit aggregates over accepted suggestions and their results.
///
/// Every division-by-zero case resolves to zero, never an error: a brand-new
/// user with no history is a valid, computable state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_amount_spent: Decimal,
    pub total_bets: u32,
    pub wins: u32,
    pub net_profit_loss: Decimal,
    pub average_stake_size: Decimal,
    pub win_rate: f64,
    pub roi_percentage: f64,
}

/// Betting habits derived from the accepted-suggestion ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BehavioralMetrics {
    /// Accepted suggestions per account-age day
    pub betting_frequency: f64,
    /// Top-3 sports by count, ties broken by first-seen order
    pub favorite_sports: Vec<String>,
    /// Top-3 markets by count, ties broken by first-seen order
    pub favorite_markets: Vec<String>,
    pub betting_pattern: BettingPattern,
    pub preferred_stake_range: StakeRange,
}

/// Session and recency aggregates over the chat message log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub session_count: u32,
    pub avg_session_duration_minutes: f64,
    pub total_engagement_minutes: f64,
    pub days_since_last_session: i64,
    /// Messages per week over the observed span
    pub conversation_frequency: f64,
    pub response_rate: f64,
}

impl Default for EngagementMetrics {
    fn default() -> Self {
        Self {
            session_count: 0,
            avg_session_duration_minutes: 0.0,
            total_engagement_minutes: 0.0,
            // Sentinel for a user with no messages at all
            days_since_last_session: 365,
            conversation_frequency: 0.0,
            response_rate: 0.0,
        }
    }
}

/// Acceptance/success rates and the composite trust score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustMetrics {
    pub suggestion_acceptance_rate: f64,
    pub suggestion_success_rate: f64,
    /// 0.6 * SAR + 0.4 * SSR, clamped to [0, 1]
    pub trust_score: f64,
    /// Monetary value of ignored suggestions that went on to win
    pub missed_opportunity_value: Decimal,
    /// Read through from persisted conversation stats, never recomputed here
    pub confidence_level: f64,
    pub empathy_level: f64,
}

impl Default for TrustMetrics {
    fn default() -> Self {
        Self {
            suggestion_acceptance_rate: 0.0,
            suggestion_success_rate: 0.0,
            trust_score: 0.0,
            missed_opportunity_value: Decimal::ZERO,
            confidence_level: 50.0,
            empathy_level: 50.0,
        }
    }
}

/// Streak, loss-chasing, and churn signals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Unbounded; negative values represent a cold streak
    pub momentum_score: f64,
    /// Mean proportional stake increase after a loss, floored at zero
    pub loss_chasing_index: f64,
    /// Clamped to [0, 1]
    pub churn_risk: f64,
    pub risk_level: RiskLevel,
}

/// Persona recommendation paired with the previously persisted state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyMetrics {
    pub previous_state: AgentState,
    pub recommended_state: AgentState,
}

/// Return value of one full computation pass. Transient: its fields are
/// scattered into the durable stats rows by the persistence writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub financial_metrics: FinancialMetrics,
    pub behavioral_metrics: BehavioralMetrics,
    pub engagement_metrics: EngagementMetrics,
    pub trust_metrics: TrustMetrics,
    pub risk_metrics: RiskMetrics,
    pub strategy_metrics: StrategyMetrics,
}

impl MetricsBundle {
    /// Hardcoded zero-valued bundle. Callers fall back to this when a fatal
    /// ledger error skips the metrics step for a turn.
    pub fn zeroed() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_state_round_trip() {
        for state in [
            AgentState::Guide,
            AgentState::Amplifier,
            AgentState::Comforter,
            AgentState::TrustBuilder,
            AgentState::Guardian,
        ] {
            assert_eq!(AgentState::try_from(state.as_str()).unwrap(), state);
        }
        assert!(AgentState::try_from("ORACLE").is_err());
    }

    #[test]
    fn zeroed_bundle_defaults_to_guide() {
        let bundle = MetricsBundle::zeroed();
        assert_eq!(bundle.strategy_metrics.recommended_state, AgentState::Guide);
        assert_eq!(bundle.financial_metrics.total_bets, 0);
        assert_eq!(bundle.engagement_metrics.days_since_last_session, 365);
        assert_eq!(bundle.risk_metrics.risk_level, RiskLevel::Low);
    }
}
