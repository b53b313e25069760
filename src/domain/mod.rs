pub mod metrics;
pub mod stats;
pub mod suggestion;

pub use metrics::{
    AgentState, BehavioralMetrics, BettingPattern, EngagementMetrics, FinancialMetrics,
    MetricsBundle, RiskLevel, RiskMetrics, StakeRange, StrategyMetrics, TrustMetrics,
};
pub use stats::{ConversationDeltas, ConversationStats, UserStats};
pub use suggestion::{
    FinalOutcome, MessageStamp, PredictionInfo, Sport, Suggestion, SuggestionResult, UserAction,
    UserProfile,
};
