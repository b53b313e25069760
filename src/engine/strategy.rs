//! Persona selection: priority-ordered thresholds over trust and risk.

use crate::domain::{AgentState, RiskMetrics, TrustMetrics};

/// Select the persona for the next turn.
///
/// Ordered chain, first match wins:
/// 1. loss chasing above 0.5 — GUARDIAN, the safety override
/// 2. hot streak with a confident user — AMPLIFIER
/// 3. cold streak or flight risk — COMFORTER
/// 4. low trust — TRUST_BUILDER
/// 5. otherwise GUIDE
///
/// A user with no suggestion history stays in GUIDE, the initial state:
/// every score below is a zero-history default and says nothing about the
/// user yet.
pub fn select_state(
    suggestion_count: usize,
    trust: &TrustMetrics,
    risk: &RiskMetrics,
) -> AgentState {
    if suggestion_count == 0 {
        return AgentState::Guide;
    }

    if risk.loss_chasing_index > 0.5 {
        AgentState::Guardian
    } else if risk.momentum_score > 1.5 && trust.trust_score > 0.6 {
        AgentState::Amplifier
    } else if risk.momentum_score < -1.5 || risk.churn_risk > 0.7 {
        AgentState::Comforter
    } else if trust.trust_score < 0.4 {
        AgentState::TrustBuilder
    } else {
        AgentState::Guide
    }
}
