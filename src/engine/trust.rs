//! Acceptance/success rates, composite trust score, and missed-opportunity
//! accounting.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use super::LedgerSnapshot;
use crate::domain::{ConversationStats, FinalOutcome, FinancialMetrics, TrustMetrics};

const SAR_WEIGHT: f64 = 0.6;
const SSR_WEIGHT: f64 = 0.4;

/// Average-stake substitute for MOV when the user has never accepted a
/// suggestion; avoids a zero-value artifact on brand-new users.
const MOV_FALLBACK_STAKE: Decimal = Decimal::TEN;

pub fn compute(
    snapshot: &LedgerSnapshot,
    financial: &FinancialMetrics,
    prior: Option<&ConversationStats>,
) -> TrustMetrics {
    let total_suggestions = snapshot.suggestions.len();
    let accepted_count = financial.total_bets as usize;

    let suggestion_acceptance_rate = if total_suggestions == 0 {
        0.0
    } else {
        accepted_count as f64 / total_suggestions as f64
    };

    let suggestion_success_rate = if accepted_count == 0 {
        0.0
    } else {
        f64::from(financial.wins) / accepted_count as f64
    };

    let trust_score = (SAR_WEIGHT * suggestion_acceptance_rate
        + SSR_WEIGHT * suggestion_success_rate)
        .clamp(0.0, 1.0);

    let average_stake = if financial.total_bets == 0 {
        MOV_FALLBACK_STAKE
    } else {
        financial.average_stake_size
    };

    let mut missed_opportunity_value = Decimal::ZERO;
    for suggestion in snapshot.suggestions.iter().filter(|s| s.is_ignored()) {
        let won = snapshot
            .result_for(suggestion.id)
            .map_or(false, |r| r.final_outcome == FinalOutcome::Win);
        if !won {
            continue;
        }

        let odds = snapshot.prediction_for(suggestion).odds;
        let net_odds = Decimal::from_f64(odds - 1.0).unwrap_or(Decimal::ONE);
        missed_opportunity_value += net_odds * average_stake;
    }

    TrustMetrics {
        suggestion_acceptance_rate,
        suggestion_success_rate,
        trust_score,
        missed_opportunity_value,
        // Owned by the incremental delta process; read through unchanged
        confidence_level: prior.map_or(50.0, |c| c.confidence_level),
        empathy_level: prior.map_or(50.0, |c| c.empathy_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::financial;
    use crate::engine::testutil::{
        settled, snapshot_full, snapshot_of, suggestion_with, test_profile,
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::domain::{PredictionInfo, Sport, Suggestion, UserAction};

    fn accepted(user_id: Uuid, now: chrono::DateTime<Utc>, i: i64, stake: Decimal) -> Suggestion {
        suggestion_with(
            user_id,
            now,
            i,
            Sport::Cricket,
            &format!("p-{i}"),
            stake,
            Some(UserAction::Accepted),
        )
    }

    #[test]
    fn trust_score_is_weighted_sar_ssr() {
        let now = Utc::now();
        let profile = test_profile(now, 30);
        let user_id = profile.user_id;

        // 10 suggestions, 8 accepted (SAR 0.8), 4 of those won (SSR 0.5)
        let mut suggestions = Vec::new();
        let mut results = Vec::new();
        for i in 0..8 {
            let s = accepted(user_id, now, i, dec!(20));
            if i < 4 {
                results.push(settled(&s, FinalOutcome::Win, dec!(15)));
            } else {
                results.push(settled(&s, FinalOutcome::Loss, dec!(-20)));
            }
            suggestions.push(s);
        }
        for i in 8..10 {
            suggestions.push(suggestion_with(
                user_id,
                now,
                i,
                Sport::Cricket,
                &format!("p-{i}"),
                dec!(20),
                Some(UserAction::Rejected),
            ));
        }

        let snapshot = snapshot_of(profile, suggestions, results);
        let fin = financial::compute(&snapshot);
        let metrics = compute(&snapshot, &fin, None);

        assert!((metrics.suggestion_acceptance_rate - 0.8).abs() < 1e-9);
        assert!((metrics.suggestion_success_rate - 0.5).abs() < 1e-9);
        assert!((metrics.trust_score - 0.68).abs() < 1e-9);
        assert!(metrics.trust_score >= 0.0 && metrics.trust_score <= 1.0);
    }

    #[test]
    fn no_history_means_zero_rates() {
        let now = Utc::now();
        let snapshot = snapshot_of(test_profile(now, 5), vec![], vec![]);
        let fin = financial::compute(&snapshot);
        let metrics = compute(&snapshot, &fin, None);

        assert_eq!(metrics.suggestion_acceptance_rate, 0.0);
        assert_eq!(metrics.suggestion_success_rate, 0.0);
        assert_eq!(metrics.trust_score, 0.0);
        assert_eq!(metrics.missed_opportunity_value, Decimal::ZERO);
    }

    #[test]
    fn ignored_winner_accrues_missed_opportunity() {
        let now = Utc::now();
        let profile = test_profile(now, 30);
        let user_id = profile.user_id;

        // Two accepted at stake 20 fix the average
        let a1 = accepted(user_id, now, 0, dec!(20));
        let a2 = accepted(user_id, now, 1, dec!(20));
        let ignored = suggestion_with(
            user_id,
            now,
            2,
            Sport::Football,
            "f-1",
            dec!(20),
            Some(UserAction::Ignored),
        );
        let results = vec![
            settled(&a1, FinalOutcome::Win, dec!(10)),
            settled(&a2, FinalOutcome::Loss, dec!(-20)),
            settled(&ignored, FinalOutcome::Win, dec!(0)),
        ];
        let predictions = vec![(
            (Sport::Football, "f-1".to_string()),
            PredictionInfo {
                odds: 3.0,
                market: "match_winner".to_string(),
            },
        )];

        let snapshot = snapshot_full(profile, vec![a1, a2, ignored], results, vec![], predictions);
        let fin = financial::compute(&snapshot);
        let metrics = compute(&snapshot, &fin, None);

        // (3.0 - 1) * 20
        assert_eq!(metrics.missed_opportunity_value, dec!(40));
    }

    #[test]
    fn mov_falls_back_to_default_stake_and_odds() {
        let now = Utc::now();
        let profile = test_profile(now, 30);
        let user_id = profile.user_id;

        // No accepted suggestions, no resolvable prediction record
        let ignored = suggestion_with(
            user_id,
            now,
            0,
            Sport::Cricket,
            "c-missing",
            dec!(5),
            Some(UserAction::Ignored),
        );
        let results = vec![settled(&ignored, FinalOutcome::Win, dec!(0))];

        let snapshot = snapshot_of(profile, vec![ignored], results);
        let fin = financial::compute(&snapshot);
        let metrics = compute(&snapshot, &fin, None);

        // (2.0 - 1) * 10
        assert_eq!(metrics.missed_opportunity_value, dec!(10));
    }

    #[test]
    fn tone_levels_read_through_from_prior_stats() {
        let now = Utc::now();
        let snapshot = snapshot_of(test_profile(now, 5), vec![], vec![]);
        let fin = financial::compute(&snapshot);

        let mut prior = ConversationStats::seed(Uuid::new_v4(), now);
        prior.confidence_level = 72.0;
        prior.empathy_level = 33.0;

        let metrics = compute(&snapshot, &fin, Some(&prior));
        assert_eq!(metrics.confidence_level, 72.0);
        assert_eq!(metrics.empathy_level, 33.0);

        let fresh = compute(&snapshot, &fin, None);
        assert_eq!(fresh.confidence_level, 50.0);
        assert_eq!(fresh.empathy_level, 50.0);
    }
}
