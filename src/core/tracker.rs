use crate::core::models::{
    contribution::ContributionTarget,
    session::{CartSummary, FundingProgress},
};
use rust_decimal::Decimal;

/// Derives funding state from ledger targets. Holds no state of its own, so every
/// figure a client sees is recomputed from committed amounts.
pub struct FundingTargetTracker;

impl FundingTargetTracker {
    pub fn progress(target: &ContributionTarget) -> FundingProgress {
        let percent = if target.target_amount <= Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            (target.current_amount / target.target_amount * Decimal::ONE_HUNDRED)
                .min(Decimal::ONE_HUNDRED)
                .round_dp(2)
        };
        FundingProgress {
            item_id: target.item_id.clone(),
            target_amount: target.target_amount,
            current_amount: target.current_amount,
            remaining_amount: target.remaining_amount(),
            percent,
            is_complete: target.current_amount >= target.target_amount,
        }
    }

    pub fn cart_summary<'a, I>(targets: I) -> CartSummary
    where
        I: IntoIterator<Item = &'a ContributionTarget>,
    {
        let mut summary = CartSummary {
            total_target: Decimal::ZERO,
            total_contributed: Decimal::ZERO,
            total_remaining: Decimal::ZERO,
            funded_items: 0,
            total_items: 0,
            all_items_funded: true,
        };
        for target in targets {
            summary.total_items += 1;
            summary.total_target += target.target_amount;
            summary.total_contributed += target.current_amount;
            summary.total_remaining += target.remaining_amount();
            if target.current_amount >= target.target_amount {
                summary.funded_items += 1;
            } else {
                summary.all_items_funded = false;
            }
        }
        summary
    }
}
