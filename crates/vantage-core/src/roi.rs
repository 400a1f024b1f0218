//! ROI calculation
//!
//! The single definition of return-on-investment used by every aggregate,
//! chart series, ranking, and report row. Pure math, no panics.

use crate::models::Campaign;

/// Percentage return on investment: `((revenue - budget) / budget) * 100`.
///
/// A missing revenue figure (ongoing campaign) counts as 0, so a funded
/// campaign with no results yet reads as -100%. A budget of zero or less,
/// or any non-finite input, short-circuits to 0: the result is 0 both for
/// "break even" and for "undefined", and callers cannot tell the two apart.
/// The function never returns NaN or ±Infinity.
pub fn roi(budget: f64, revenue: Option<f64>) -> f64 {
    if !(budget > 0.0) || !budget.is_finite() {
        return 0.0;
    }
    let value = ((revenue.unwrap_or(0.0) - budget) / budget) * 100.0;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// ROI for a stored campaign row
pub fn campaign_roi(campaign: &Campaign) -> f64 {
    roi(campaign.budget, campaign.revenue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roi_basic() {
        assert_eq!(roi(100.0, Some(150.0)), 50.0);
        assert_eq!(roi(200.0, Some(100.0)), -50.0);
        assert_eq!(roi(1000.0, Some(1000.0)), 0.0);
    }

    #[test]
    fn test_roi_zero_budget_is_zero() {
        assert_eq!(roi(0.0, Some(500.0)), 0.0);
        assert_eq!(roi(0.0, Some(-500.0)), 0.0);
        assert_eq!(roi(0.0, None), 0.0);
        assert_eq!(roi(-100.0, Some(50.0)), 0.0);
    }

    #[test]
    fn test_roi_missing_revenue_counts_as_zero() {
        assert_eq!(roi(100.0, None), -100.0);
    }

    #[test]
    fn test_roi_never_non_finite() {
        assert_eq!(roi(f64::NAN, Some(100.0)), 0.0);
        assert_eq!(roi(f64::INFINITY, Some(100.0)), 0.0);
        assert_eq!(roi(100.0, Some(f64::INFINITY)), 0.0);
        assert!(roi(f64::MIN_POSITIVE, Some(f64::MAX)).is_finite());
    }
}
