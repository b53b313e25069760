//! Betting-habit classification over the accepted-suggestion ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::LedgerSnapshot;
use crate::domain::{BehavioralMetrics, BettingPattern, StakeRange};

pub fn compute(snapshot: &LedgerSnapshot, now: DateTime<Utc>) -> BehavioralMetrics {
    let accepted = snapshot.accepted();

    // An account opened today still has age 1 for frequency purposes
    let account_age_days = snapshot.profile.account_age_days(now).max(1);
    let betting_frequency = accepted.len() as f64 / account_age_days as f64;

    let favorite_sports = top_three(accepted.iter().map(|s| s.sport.as_str().to_string()));
    let favorite_markets = top_three(accepted.iter().map(|s| snapshot.prediction_for(s).market));

    let total_stake: Decimal = accepted.iter().map(|s| s.stake()).sum();
    let average_stake = if accepted.is_empty() {
        Decimal::ZERO
    } else {
        total_stake / Decimal::from(accepted.len() as u64)
    };

    // Single-winner priority chain, first match wins
    let betting_pattern = if average_stake > dec!(100) {
        BettingPattern::HighRoller
    } else if betting_frequency > 0.5 {
        BettingPattern::Frequent
    } else {
        BettingPattern::Casual
    };

    let stakes: Vec<Decimal> = accepted.iter().map(|s| s.stake()).collect();
    let preferred_stake_range = StakeRange {
        min: stakes.iter().copied().min().unwrap_or(Decimal::ZERO),
        max: stakes.iter().copied().max().unwrap_or(Decimal::ZERO),
    };

    BehavioralMetrics {
        betting_frequency,
        favorite_sports,
        favorite_markets,
        betting_pattern,
        preferred_stake_range,
    }
}

/// Top-3 values by count. The count vector keeps first-seen order and the
/// sort is stable, so ties resolve to whichever value appeared first.
fn top_three(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(name, _)| *name == value) {
            Some(entry) => entry.1 += 1,
            None => counts.push((value, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(3).map(|(name, _)| name).collect()
}
