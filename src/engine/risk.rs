//! Streak momentum, loss chasing, and churn scoring.

use rust_decimal::prelude::ToPrimitive;

use super::LedgerSnapshot;
use crate::domain::{
    EngagementMetrics, FinalOutcome, FinancialMetrics, RiskLevel, RiskMetrics, TrustMetrics,
};

const CHURN_TRUST_WEIGHT: f64 = 0.4;
const CHURN_RECENCY_WEIGHT: f64 = 0.3;
const CHURN_MOMENTUM_WEIGHT: f64 = 0.3;
/// Days of inactivity that saturate the recency term
const RECENCY_WINDOW_DAYS: f64 = 30.0;

pub fn compute(
    snapshot: &LedgerSnapshot,
    financial: &FinancialMetrics,
    trust: &TrustMetrics,
    engagement: &EngagementMetrics,
) -> RiskMetrics {
    let momentum_score = momentum(financial);
    let loss_chasing_index = loss_chasing(snapshot);
    let churn_risk = churn(
        trust.trust_score,
        engagement.days_since_last_session,
        momentum_score,
    );
    let risk_level = level(churn_risk, loss_chasing_index);

    RiskMetrics {
        momentum_score,
        loss_chasing_index,
        churn_risk,
        risk_level,
    }
}

/// Profitability-per-stake plus a centered win-rate term. Unbounded;
/// negative values read as a cold streak. A user with no accepted bets has
/// no streak at all and scores 0.0.
fn momentum(financial: &FinancialMetrics) -> f64 {
    if financial.total_bets == 0 {
        return 0.0;
    }

    let pnl_term = if financial.average_stake_size.is_zero() {
        0.0
    } else {
        (financial.net_profit_loss / financial.average_stake_size)
            .to_f64()
            .unwrap_or(0.0)
    };

    pnl_term + (financial.win_rate - 0.5) * 2.0
}

/// Mean proportional stake increase across adjacent accepted suggestions
/// whose earlier bet lost. Floored at zero: reducing stakes after losses is
/// not chasing. Pairs with a zero earlier stake are skipped, and fewer than
/// two qualifying pairs score 0.0.
fn loss_chasing(snapshot: &LedgerSnapshot) -> f64 {
    let accepted = snapshot.accepted();

    let mut ratios = Vec::new();
    for pair in accepted.windows(2) {
        let earlier = pair[0];
        let later = pair[1];

        let earlier_lost = snapshot
            .result_for(earlier.id)
            .map_or(false, |r| r.final_outcome == FinalOutcome::Loss);
        if !earlier_lost {
            continue;
        }

        let earlier_stake = earlier.stake();
        if earlier_stake.is_zero() {
            continue;
        }

        let ratio = (later.stake() / earlier_stake).to_f64().unwrap_or(0.0) - 1.0;
        ratios.push(ratio);
    }

    if ratios.len() < 2 {
        return 0.0;
    }

    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    mean.max(0.0)
}

fn churn(trust_score: f64, days_since_last_session: i64, momentum_score: f64) -> f64 {
    (CHURN_TRUST_WEIGHT * (1.0 - trust_score)
        + CHURN_RECENCY_WEIGHT * (days_since_last_session as f64 / RECENCY_WINDOW_DAYS)
        - CHURN_MOMENTUM_WEIGHT * momentum_score.max(0.0))
    .clamp(0.0, 1.0)
}

/// First matching branch wins; evaluate high before medium.
fn level(churn_risk: f64, loss_chasing_index: f64) -> RiskLevel {
    if churn_risk > 0.7 || loss_chasing_index > 0.5 {
        RiskLevel::High
    } else if churn_risk > 0.4 || loss_chasing_index > 0.3 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
