//! Costing-path classification and cost resolution.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{AssetStatus, SourceAssetRow};

/// The costing path of a source row, resolved from its two mutually
/// exclusive costing-method flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBasis {
    /// Fiscal-basis costing: revalued cost in local currency.
    FiscalBasis,
    /// Reexpressed-basis costing: reexpressed cost in source currency,
    /// converted at the period-end exchange rate.
    ReexpressedBasis,
    /// Neither flag set: plain acquisition cost.
    PlainCost,
    /// Both flags set: data-entry error, the row must be dropped.
    Invalid,
}

/// Cost figures resolved for one staged row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedCost {
    /// Cost in the source currency (reexpressed basis only).
    pub source_currency: Option<Decimal>,
    /// Cost in local currency.
    pub local: Option<Decimal>,
}

/// Resolves the costing path from the two source flags.
#[must_use]
pub const fn classify_cost_basis(fiscal_basis: bool, reexpressed_basis: bool) -> CostBasis {
    match (fiscal_basis, reexpressed_basis) {
        (true, true) => CostBasis::Invalid,
        (false, true) => CostBasis::ReexpressedBasis,
        (true, false) => CostBasis::FiscalBasis,
        (false, false) => CostBasis::PlainCost,
    }
}

/// Picks the first positive amount, if any.
fn first_positive(primary: Option<Decimal>, fallback: Option<Decimal>) -> Option<Decimal> {
    primary
        .filter(|c| *c > Decimal::ZERO)
        .or_else(|| fallback.filter(|c| *c > Decimal::ZERO))
}

/// Resolves the cost figures for a row under the given basis.
///
/// Returns `None` for `CostBasis::Invalid`: the row must be skipped
/// with a warning, never staged with a guessed cost.
#[must_use]
pub fn resolve_cost(
    row: &SourceAssetRow,
    basis: CostBasis,
    period_end_rate: Decimal,
) -> Option<ResolvedCost> {
    match basis {
        CostBasis::Invalid => None,
        CostBasis::ReexpressedBasis => {
            let source = first_positive(row.reexpressed_cost, row.acquisition_cost);
            let local = source.map(|cost| {
                (cost * period_end_rate)
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            });
            Some(ResolvedCost {
                source_currency: source,
                local,
            })
        }
        CostBasis::FiscalBasis => Some(ResolvedCost {
            source_currency: None,
            local: first_positive(row.revalued_cost, row.acquisition_cost),
        }),
        CostBasis::PlainCost => Some(ResolvedCost {
            source_currency: None,
            local: row.acquisition_cost,
        }),
    }
}

/// Extraction filter: whether a source row belongs in the staging set
/// for `fiscal_year`.
///
/// A row qualifies when it is active, or disposed within the fiscal
/// year; was acquired on/before the fiscal year end (unknown acquisition
/// dates pass, mirroring the source query); and was not disposed before
/// the fiscal year start.
#[must_use]
pub fn is_candidate(row: &SourceAssetRow, fiscal_year: i32) -> bool {
    let year_start = NaiveDate::from_ymd_opt(fiscal_year, 1, 1).expect("valid fiscal year start");
    let year_end = NaiveDate::from_ymd_opt(fiscal_year, 12, 31).expect("valid fiscal year end");

    let status_ok = match row.status {
        AssetStatus::Active => true,
        AssetStatus::Disposed => row.disposed_on.is_some_and(|d| d.year() == fiscal_year),
    };

    let acquired_ok = row.acquired_on.is_none_or(|d| d <= year_end);
    let disposal_ok = row.disposed_on.is_none_or(|d| d >= year_start);

    status_ok && acquired_ok && disposal_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn row() -> SourceAssetRow {
        SourceAssetRow {
            company_id: 122,
            asset_number: 1,
            asset_tag: None,
            asset_type_id: 1,
            asset_subtype_id: None,
            asset_type_name: None,
            description: None,
            currency_id: Some(2),
            currency_name: None,
            country_id: 1,
            country_name: None,
            acquired_on: NaiveDate::from_ymd_opt(2020, 3, 1),
            disposed_on: None,
            status: AssetStatus::Active,
            owned: false,
            fiscal_basis: false,
            reexpressed_basis: false,
            acquisition_cost: Some(dec!(1000)),
            revalued_cost: None,
            reexpressed_cost: None,
            annual_rate: Some(dec!(10)),
            prior_accumulated_depreciation: Some(dec!(0)),
        }
    }

    #[test]
    fn test_classification_is_a_closed_variant() {
        assert_eq!(classify_cost_basis(true, true), CostBasis::Invalid);
        assert_eq!(classify_cost_basis(true, false), CostBasis::FiscalBasis);
        assert_eq!(
            classify_cost_basis(false, true),
            CostBasis::ReexpressedBasis
        );
        assert_eq!(classify_cost_basis(false, false), CostBasis::PlainCost);
    }

    #[test]
    fn test_invalid_basis_resolves_to_none() {
        assert_eq!(resolve_cost(&row(), CostBasis::Invalid, dec!(17.5)), None);
    }

    #[test]
    fn test_reexpressed_cost_converted_at_period_end_rate() {
        let mut r = row();
        r.reexpressed_cost = Some(dec!(100));

        let cost = resolve_cost(&r, CostBasis::ReexpressedBasis, dec!(17.5)).unwrap();
        assert_eq!(cost.source_currency, Some(dec!(100)));
        assert_eq!(cost.local, Some(dec!(1750.00)));
    }

    #[test]
    fn test_reexpressed_falls_back_to_acquisition_cost() {
        let mut r = row();
        r.reexpressed_cost = Some(dec!(0));
        r.acquisition_cost = Some(dec!(200));

        let cost = resolve_cost(&r, CostBasis::ReexpressedBasis, dec!(17.5)).unwrap();
        assert_eq!(cost.source_currency, Some(dec!(200)));
        assert_eq!(cost.local, Some(dec!(3500.00)));
    }

    #[test]
    fn test_fiscal_basis_uses_revalued_cost_without_conversion() {
        let mut r = row();
        r.revalued_cost = Some(dec!(5000));

        let cost = resolve_cost(&r, CostBasis::FiscalBasis, dec!(17.5)).unwrap();
        assert_eq!(cost.source_currency, None);
        assert_eq!(cost.local, Some(dec!(5000)));
    }

    #[test]
    fn test_fiscal_basis_falls_back_to_acquisition_cost() {
        let mut r = row();
        r.revalued_cost = None;

        let cost = resolve_cost(&r, CostBasis::FiscalBasis, dec!(17.5)).unwrap();
        assert_eq!(cost.local, Some(dec!(1000)));
    }

    #[test]
    fn test_plain_cost_uses_acquisition_cost_directly() {
        let cost = resolve_cost(&row(), CostBasis::PlainCost, dec!(17.5)).unwrap();
        assert_eq!(cost.local, Some(dec!(1000)));
    }

    #[test]
    fn test_active_row_is_candidate() {
        assert!(is_candidate(&row(), 2024));
    }

    #[test]
    fn test_disposed_in_fiscal_year_is_candidate() {
        let mut r = row();
        r.status = AssetStatus::Disposed;
        r.disposed_on = NaiveDate::from_ymd_opt(2024, 5, 2);
        assert!(is_candidate(&r, 2024));
    }

    #[test]
    fn test_disposed_before_fiscal_year_is_excluded() {
        let mut r = row();
        r.status = AssetStatus::Disposed;
        r.disposed_on = NaiveDate::from_ymd_opt(2023, 11, 2);
        assert!(!is_candidate(&r, 2024));
    }

    #[test]
    fn test_acquired_after_fiscal_year_is_excluded() {
        let mut r = row();
        r.acquired_on = NaiveDate::from_ymd_opt(2025, 1, 15);
        assert!(!is_candidate(&r, 2024));
    }

    #[test]
    fn test_unknown_acquisition_date_passes_filter() {
        let mut r = row();
        r.acquired_on = None;
        assert!(is_candidate(&r, 2024));
    }

    proptest! {
        /// Both flags set always classify as Invalid and never resolve
        /// to a cost, regardless of the amounts on the row.
        #[test]
        fn prop_mutual_exclusion(
            fiscal in any::<bool>(),
            reexpressed in any::<bool>(),
            amount in 0i64..10_000_000,
        ) {
            let mut r = row();
            r.fiscal_basis = fiscal;
            r.reexpressed_basis = reexpressed;
            r.acquisition_cost = Some(Decimal::new(amount, 2));

            let basis = classify_cost_basis(fiscal, reexpressed);
            if fiscal && reexpressed {
                prop_assert_eq!(basis, CostBasis::Invalid);
                prop_assert_eq!(resolve_cost(&r, basis, dec!(17.5)), None);
            } else {
                prop_assert!(resolve_cost(&r, basis, dec!(17.5)).is_some());
            }
        }
    }
}
