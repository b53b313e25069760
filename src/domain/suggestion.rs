use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::metrics::AgentState;

/// Sport a suggestion refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Cricket,
    Football,
    Unknown,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Cricket => "cricket",
            Sport::Football => "football",
            Sport::Unknown => "unknown",
        }
    }
}

impl From<&str> for Sport {
    /// Unknown is the parse fallback, not an error — the engine substitutes
    /// defaults for unresolvable metadata instead of failing.
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cricket" => Sport::Cricket,
            "football" => Sport::Football,
            _ => Sport::Unknown,
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the user responded to a suggestion.
///
/// A suggestion with no response yet carries `Option<UserAction>::None`; the
/// action is set exactly once when the user's next message reveals it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Accepted,
    Rejected,
    Ignored,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserAction::Accepted => "accepted",
            UserAction::Rejected => "rejected",
            UserAction::Ignored => "ignored",
        }
    }
}

impl TryFrom<&str> for UserAction {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "accepted" => Ok(UserAction::Accepted),
            "rejected" => Ok(UserAction::Rejected),
            "ignored" => Ok(UserAction::Ignored),
            other => Err(format!("unknown user action: {other}")),
        }
    }
}

impl std::fmt::Display for UserAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved outcome of a suggestion's underlying bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinalOutcome {
    Win,
    Loss,
    Pending,
    Void,
}

impl FinalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalOutcome::Win => "win",
            FinalOutcome::Loss => "loss",
            FinalOutcome::Pending => "pending",
            FinalOutcome::Void => "void",
        }
    }
}

impl TryFrom<&str> for FinalOutcome {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "win" => Ok(FinalOutcome::Win),
            "loss" => Ok(FinalOutcome::Loss),
            "pending" => Ok(FinalOutcome::Pending),
            "void" => Ok(FinalOutcome::Void),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

impl std::fmt::Display for FinalOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bet the assistant recommended to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub sport: Sport,
    /// Reference into the external prediction record
    pub legacy_prediction_id: String,
    pub suggested_stake: Decimal,
    /// Stake the user actually placed, when it differs from the suggestion
    pub actual_stake_used: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    /// None until the user's response is known
    pub user_action: Option<UserAction>,
    /// Persona the assistant was in when it made the suggestion
    pub agent_state_when_suggested: AgentState,
}

impl Suggestion {
    /// Effective stake: the stake actually used, falling back to the
    /// suggested amount.
    pub fn stake(&self) -> Decimal {
        self.actual_stake_used.unwrap_or(self.suggested_stake)
    }

    pub fn is_accepted(&self) -> bool {
        self.user_action == Some(UserAction::Accepted)
    }

    pub fn is_ignored(&self) -> bool {
        self.user_action == Some(UserAction::Ignored)
    }
}

/// Settled outcome for a suggestion. Written once by the settlement
/// process, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResult {
    pub id: Uuid,
    pub suggestion_id: Uuid,
    pub final_outcome: FinalOutcome,
    /// Signed: positive for a win, negative for a loss, zero for void/pending
    pub profit_loss: Decimal,
    pub result_timestamp: DateTime<Utc>,
}

/// Odds and market metadata resolved from the external prediction record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionInfo {
    pub odds: f64,
    pub market: String,
}

impl PredictionInfo {
    /// Substitute used when the external record cannot be resolved
    pub fn fallback() -> Self {
        Self {
            odds: 2.0,
            market: "unknown".to_string(),
        }
    }
}

/// One chat message's session tag and timestamp. Direction does not matter
/// for engagement accounting, so only the stamp is carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStamp {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Minimal view of the upstream user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn account_age_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}
