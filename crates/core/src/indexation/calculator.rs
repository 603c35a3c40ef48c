//! Indexation calculator.
//!
//! Produces the restated figures and the 10%-of-MOI floor test from raw
//! monetary inputs plus the two resolved index values. This is the
//! single most regulation-sensitive piece of the system: the update
//! factor is rounded to 4 decimal places ONCE and reused, and every
//! monetary result is rounded to 2 decimal places (ties away from zero)
//! before downstream reuse. Any deviation from this two-stage rounding
//! contract produces a wrong tax filing.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use thiserror::Error;

/// Decimal places of the update factor (regulatory convention).
const FACTOR_SCALE: u32 = 4;
/// Decimal places of monetary amounts.
const MONEY_SCALE: u32 = 2;

/// Errors from the indexation calculator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexationError {
    /// Acquisition-month index is zero or negative; the factor would be
    /// indeterminate.
    #[error("acquisition-month index must be positive, got {0}")]
    ZeroAcquisitionIndex(Decimal),

    /// Selected-month index is zero or negative.
    #[error("selected-month index must be positive, got {0}")]
    NonPositiveSelectedIndex(Decimal),

    /// Months of use must lie within 0-12.
    #[error("months of use must be within 0-12, got {0}")]
    MonthsOutOfRange(u32),
}

/// Raw inputs for one asset's restatement.
#[derive(Debug, Clone)]
pub struct IndexationInput {
    /// Original acquisition cost (MOI), base of the floor test.
    pub original_cost: Decimal,
    /// Opening balance pending deduction.
    pub opening_balance: Decimal,
    /// Current-period fiscal depreciation.
    pub period_depreciation: Decimal,
    /// Months of use in the period (0-12).
    pub months_of_use: u32,
    /// Acquisition-month index value (must be > 0).
    pub acquisition_index: Decimal,
    /// Selected-month index value (must be > 0).
    pub selected_index: Decimal,
}

/// Restated figures for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexationResult {
    /// `round(selected / acquisition, 4)`.
    pub update_factor: Decimal,
    /// `opening_balance × update_factor`.
    pub restated_balance: Decimal,
    /// `period_depreciation × update_factor`.
    pub restated_depreciation: Decimal,
    /// Half of the restated depreciation.
    pub half_depreciation: Decimal,
    /// `restated_balance − half_depreciation`.
    pub average_value: Decimal,
    /// `average_value × months_of_use / 12`.
    pub proportional_value: Decimal,
    /// `MOI × 0.10`.
    pub floor_test_value: Decimal,
    /// `max(proportional_value, floor_test_value)`.
    pub reportable_value: Decimal,
    /// True when the floor won the comparison.
    pub floor_test_applied: bool,
}

/// Rounds a monetary amount to the regulatory 2 decimal places.
fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the restated figures for one asset.
///
/// # Errors
///
/// Returns an error when either index is non-positive or months of use
/// exceed 12. Callers surface these per row; they never abort a run.
pub fn restate(input: &IndexationInput) -> Result<IndexationResult, IndexationError> {
    if input.acquisition_index <= Decimal::ZERO {
        return Err(IndexationError::ZeroAcquisitionIndex(
            input.acquisition_index,
        ));
    }
    if input.selected_index <= Decimal::ZERO {
        return Err(IndexationError::NonPositiveSelectedIndex(
            input.selected_index,
        ));
    }
    if input.months_of_use > 12 {
        return Err(IndexationError::MonthsOutOfRange(input.months_of_use));
    }

    // Stage one: the factor, rounded once and reused everywhere below.
    let update_factor = (input.selected_index / input.acquisition_index)
        .round_dp_with_strategy(FACTOR_SCALE, RoundingStrategy::MidpointAwayFromZero);

    // Stage two: monetary steps, each rounded before reuse.
    let restated_balance = round_money(input.opening_balance * update_factor);
    let restated_depreciation = round_money(input.period_depreciation * update_factor);
    let half_depreciation = round_money(restated_depreciation * Decimal::new(5, 1));
    let average_value = round_money(restated_balance - half_depreciation);
    let proportional_value =
        round_money(average_value * Decimal::from(input.months_of_use) / Decimal::from(12));
    let floor_test_value = round_money(input.original_cost * Decimal::new(10, 2));

    let floor_test_applied = proportional_value <= floor_test_value;
    let reportable_value = proportional_value.max(floor_test_value);

    Ok(IndexationResult {
        update_factor,
        restated_balance,
        restated_depreciation,
        half_depreciation,
        average_value,
        proportional_value,
        floor_test_value,
        reportable_value,
        floor_test_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn input(
        original_cost: Decimal,
        opening_balance: Decimal,
        period_depreciation: Decimal,
        months_of_use: u32,
        acquisition_index: Decimal,
        selected_index: Decimal,
    ) -> IndexationInput {
        IndexationInput {
            original_cost,
            opening_balance,
            period_depreciation,
            months_of_use,
            acquisition_index,
            selected_index,
        }
    }

    #[test]
    fn test_factor_and_balance_scenario() {
        // Acquisition index 100.000000, selected 110.000000, opening
        // balance 1,000,000.00.
        let result = restate(&input(
            dec!(2000000),
            dec!(1000000.00),
            dec!(0),
            12,
            dec!(100.000000),
            dec!(110.000000),
        ))
        .unwrap();

        assert_eq!(result.update_factor, dec!(1.1000));
        assert_eq!(result.restated_balance, dec!(1100000.00));
    }

    #[test]
    fn test_full_restatement_scenario() {
        // MOI 500,000; opening 300,000; factor 1.05; depreciation 40,000;
        // 6 months of use.
        let result = restate(&input(
            dec!(500000),
            dec!(300000),
            dec!(40000),
            6,
            dec!(100),
            dec!(105),
        ))
        .unwrap();

        assert_eq!(result.update_factor, dec!(1.0500));
        assert_eq!(result.restated_balance, dec!(315000.00));
        assert_eq!(result.restated_depreciation, dec!(42000.00));
        assert_eq!(result.half_depreciation, dec!(21000.00));
        assert_eq!(result.average_value, dec!(294000.00));
        assert_eq!(result.proportional_value, dec!(147000.00));
        assert_eq!(result.floor_test_value, dec!(50000.00));
        assert_eq!(result.reportable_value, dec!(147000.00));
        assert!(!result.floor_test_applied);
    }

    #[test]
    fn test_floor_test_triggers() {
        // Average value 10,000 with 12 months of use against a MOI of
        // 200,000: the 10% floor (20,000) wins.
        let result = restate(&input(
            dec!(200000),
            dec!(10000),
            dec!(0),
            12,
            dec!(100),
            dec!(100),
        ))
        .unwrap();

        assert_eq!(result.average_value, dec!(10000.00));
        assert_eq!(result.proportional_value, dec!(10000.00));
        assert_eq!(result.floor_test_value, dec!(20000.00));
        assert_eq!(result.reportable_value, dec!(20000.00));
        assert!(result.floor_test_applied);
    }

    #[test]
    fn test_factor_rounded_before_reuse() {
        // 1 / 3 = 0.3333... -> factor 0.3333. The restated balance must
        // use the rounded factor (3,333.00), not the raw quotient
        // (3,333.33...).
        let result = restate(&input(
            dec!(0),
            dec!(10000),
            dec!(0),
            12,
            dec!(3),
            dec!(1),
        ))
        .unwrap();

        assert_eq!(result.update_factor, dec!(0.3333));
        assert_eq!(result.restated_balance, dec!(3333.00));
    }

    #[test]
    fn test_zero_acquisition_index_rejected() {
        let err = restate(&input(dec!(1), dec!(1), dec!(1), 6, dec!(0), dec!(110))).unwrap_err();
        assert_eq!(err, IndexationError::ZeroAcquisitionIndex(dec!(0)));
    }

    #[test]
    fn test_non_positive_selected_index_rejected() {
        let err = restate(&input(dec!(1), dec!(1), dec!(1), 6, dec!(100), dec!(-1))).unwrap_err();
        assert_eq!(err, IndexationError::NonPositiveSelectedIndex(dec!(-1)));
    }

    #[test]
    fn test_months_out_of_range_rejected() {
        let err = restate(&input(dec!(1), dec!(1), dec!(1), 13, dec!(100), dec!(110))).unwrap_err();
        assert_eq!(err, IndexationError::MonthsOutOfRange(13));
    }

    #[test]
    fn test_zero_months_of_use() {
        let result = restate(&input(
            dec!(100000),
            dec!(50000),
            dec!(5000),
            0,
            dec!(100),
            dec!(110),
        ))
        .unwrap();

        assert_eq!(result.proportional_value, dec!(0.00));
        // Zero proportional value always loses to a positive floor.
        assert_eq!(result.reportable_value, dec!(10000.00));
        assert!(result.floor_test_applied);
    }

    proptest! {
        /// reportable == max(proportional, floor) and floor_test_applied
        /// is consistent with the comparison, for any inputs.
        #[test]
        fn prop_floor_test_correctness(
            moi in 0i64..100_000_000,
            opening in 0i64..100_000_000,
            depreciation in 0i64..10_000_000,
            months in 0u32..=12,
            acq_index in 1i64..1_000_000,
            sel_index in 1i64..1_000_000,
        ) {
            let result = restate(&input(
                Decimal::new(moi, 2),
                Decimal::new(opening, 2),
                Decimal::new(depreciation, 2),
                months,
                Decimal::new(acq_index, 3),
                Decimal::new(sel_index, 3),
            ))
            .unwrap();

            prop_assert_eq!(
                result.reportable_value,
                result.proportional_value.max(result.floor_test_value)
            );
            prop_assert_eq!(
                result.floor_test_applied,
                result.proportional_value <= result.floor_test_value
            );
        }

        /// The factor is stable at 4 decimal places for fixed inputs.
        #[test]
        fn prop_factor_determinism(
            acq_index in 1i64..1_000_000,
            sel_index in 1i64..1_000_000,
        ) {
            let a = input(
                dec!(1), dec!(1), dec!(1), 6,
                Decimal::new(acq_index, 3),
                Decimal::new(sel_index, 3),
            );
            let first = restate(&a).unwrap();
            let second = restate(&a).unwrap();

            prop_assert_eq!(first.update_factor, second.update_factor);
            prop_assert!(first.update_factor.scale() <= 4);
        }
    }
}
