//! Stake/profit aggregation over accepted suggestions and their results.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::LedgerSnapshot;
use crate::domain::{FinalOutcome, FinancialMetrics};

/// Aggregate the accepted-suggestion ledger.
///
/// Hard contract: every division-by-zero case resolves to 0.0. New users
/// have no history and must still compute.
pub fn compute(snapshot: &LedgerSnapshot) -> FinancialMetrics {
    let accepted = snapshot.accepted();
    let total_bets = accepted.len() as u32;
    let total_amount_spent: Decimal = accepted.iter().map(|s| s.stake()).sum();

    let mut wins = 0u32;
    let mut net_profit_loss = Decimal::ZERO;
    for suggestion in &accepted {
        if let Some(result) = snapshot.result_for(suggestion.id) {
            if result.final_outcome == FinalOutcome::Win {
                wins += 1;
            }
            // Pending/void contribute their stored profit_loss, typically 0
            net_profit_loss += result.profit_loss;
        }
    }

    let average_stake_size = if total_bets == 0 {
        Decimal::ZERO
    } else {
        total_amount_spent / Decimal::from(total_bets)
    };

    let win_rate = if total_bets == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(total_bets)
    };

    let roi_percentage = if total_amount_spent.is_zero() {
        0.0
    } else {
        (net_profit_loss / total_amount_spent)
            .to_f64()
            .unwrap_or(0.0)
            * 100.0
    };

    FinancialMetrics {
        total_amount_spent,
        total_bets,
        wins,
        net_profit_loss,
        average_stake_size,
        win_rate,
        roi_percentage,
    }
}
