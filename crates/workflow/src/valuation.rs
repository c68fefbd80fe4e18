//! Resale valuation of graded line items.

use reloop_core::line_item::{GRADE_A, GRADE_B, GRADE_C};

/// Prices a graded line item in pence.
///
/// `grade` has already passed validation when this is called.
pub trait ValuationCalculator: Send + Sync {
    fn resale_value_pence(&self, category: &str, quantity: i32, grade: &str) -> i64;
}

/// Flat per-unit rate by grade, ignoring category.
///
/// Placeholder pricing until a market-rate feed exists; scrap values
/// at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatRateValuer;

impl ValuationCalculator for FlatRateValuer {
    fn resale_value_pence(&self, _category: &str, quantity: i32, grade: &str) -> i64 {
        let per_unit: i64 = match grade {
            GRADE_A => 12_000,
            GRADE_B => 6_000,
            GRADE_C => 2_500,
            _ => 0,
        };
        per_unit * i64::from(quantity.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reloop_core::line_item::GRADE_SCRAP;

    #[test]
    fn flat_rate_scales_with_quantity() {
        let valuer = FlatRateValuer;
        assert_eq!(valuer.resale_value_pence("laptop", 3, GRADE_A), 36_000);
        assert_eq!(valuer.resale_value_pence("laptop", 2, GRADE_B), 12_000);
    }

    #[test]
    fn scrap_is_worthless() {
        let valuer = FlatRateValuer;
        assert_eq!(valuer.resale_value_pence("crt_monitor", 10, GRADE_SCRAP), 0);
    }

    #[test]
    fn negative_quantity_clamps_to_zero() {
        let valuer = FlatRateValuer;
        assert_eq!(valuer.resale_value_pence("laptop", -1, GRADE_A), 0);
    }
}
