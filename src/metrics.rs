// src/metrics.rs
//
// Presentation-layer ratios and the rating severity classifier.

use serde::Serialize;

pub const COGS_RATIO: f64 = 0.733;
pub const TOTAL_COST_RATIO: f64 = 0.862;

fn margin_after(revenue: f64, cost_ratio: f64) -> Option<f64> {
    if revenue == 0.0 || !revenue.is_finite() {
        return None;
    }
    Some((revenue - cost_ratio * revenue) / revenue * 100.0)
}

/// Gross margin in percent. `None` when revenue is zero.
pub fn gross_margin(revenue: f64) -> Option<f64> {
    margin_after(revenue, COGS_RATIO)
}

/// Net profit in percent. `None` when revenue is zero.
pub fn net_profit(revenue: f64) -> Option<f64> {
    margin_after(revenue, TOTAL_COST_RATIO)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Good,
}

impl Severity {
    /// below 5 → critical, [5, 7) → warning, 7 and above → good
    pub fn classify(avg_rating: f64) -> Self {
        if avg_rating < 5.0 {
            Severity::Critical
        } else if avg_rating < 7.0 {
            Severity::Warning
        } else {
            Severity::Good
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Good => "good",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Critical => "red",
            Severity::Warning => "yellow",
            Severity::Good => "green",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn margins_do_not_depend_on_revenue() {
        for revenue in [0.01, 1.0, 49.0, 12_345.67, 9.9e9] {
            assert!(close(gross_margin(revenue).unwrap(), 26.7));
            assert!(close(net_profit(revenue).unwrap(), 13.8));
        }
    }

    #[test]
    fn zero_revenue_has_no_margin() {
        assert_eq!(gross_margin(0.0), None);
        assert_eq!(net_profit(0.0), None);
        assert_eq!(gross_margin(f64::NAN), None);
    }

    #[test]
    fn classifier_boundaries() {
        assert_eq!(Severity::classify(4.9), Severity::Critical);
        assert_eq!(Severity::classify(5.0), Severity::Warning);
        assert_eq!(Severity::classify(6.99), Severity::Warning);
        assert_eq!(Severity::classify(7.0), Severity::Good);
        assert_eq!(Severity::classify(10.0).color(), "green");
        assert_eq!(Severity::classify(0.0).as_str(), "critical");
    }
}
