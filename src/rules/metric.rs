use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Metric used to decide whether a rule is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMetric {
    Support,
    Confidence,
    Lift,
    Leverage,
    Conviction,
}

impl RuleMetric {
    pub const ALL: [RuleMetric; 5] = [
        RuleMetric::Support,
        RuleMetric::Confidence,
        RuleMetric::Lift,
        RuleMetric::Leverage,
        RuleMetric::Conviction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleMetric::Support => "support",
            RuleMetric::Confidence => "confidence",
            RuleMetric::Lift => "lift",
            RuleMetric::Leverage => "leverage",
            RuleMetric::Conviction => "conviction",
        }
    }
}

impl fmt::Display for RuleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        RuleMetric::ALL
            .iter()
            .copied()
            .find(|metric| metric.as_str() == lowered)
            .ok_or_else(|| Error::Config(format!("unknown rule metric '{}'", s)))
    }
}

/// Every metric of one rule `A => C`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RuleMetrics {
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `+inf` when confidence is 1.
    pub conviction: f64,
}

impl RuleMetrics {
    pub fn new(antecedent_support: f64, consequent_support: f64, support: f64) -> Self {
        let confidence = support / antecedent_support;
        let conviction = if confidence >= 1.0 {
            f64::INFINITY
        } else {
            (1.0 - consequent_support) / (1.0 - confidence)
        };

        Self {
            antecedent_support,
            consequent_support,
            support,
            confidence,
            lift: confidence / consequent_support,
            leverage: support - antecedent_support * consequent_support,
            conviction,
        }
    }

    pub fn get(&self, metric: RuleMetric) -> f64 {
        match metric {
            RuleMetric::Support => self.support,
            RuleMetric::Confidence => self.confidence,
            RuleMetric::Lift => self.lift,
            RuleMetric::Leverage => self.leverage,
            RuleMetric::Conviction => self.conviction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn metrics_from_supports() {
        let m = RuleMetrics::new(0.5, 0.4, 0.3);
        assert!(close(m.support, 0.3));
        assert!(close(m.confidence, 0.6));
        assert!(close(m.lift, 1.5));
        assert!(close(m.leverage, 0.1));
        assert!(close(m.conviction, 1.5));
    }

    #[test]
    fn conviction_is_infinite_at_full_confidence() {
        let m = RuleMetrics::new(0.5, 0.8, 0.5);
        assert_eq!(m.confidence, 1.0);
        assert!(m.conviction.is_infinite() && m.conviction > 0.0);
        assert_eq!(m.get(RuleMetric::Conviction), f64::INFINITY);
    }

    #[test]
    fn metric_names_round_trip() {
        for metric in RuleMetric::ALL {
            assert_eq!(metric.to_string().parse::<RuleMetric>().unwrap(), metric);
        }
        assert_eq!(" Lift ".parse::<RuleMetric>().unwrap(), RuleMetric::Lift);
        assert!("zhangs_metric".parse::<RuleMetric>().is_err());
    }

    #[test]
    fn metric_names_in_json() {
        let metric: RuleMetric = serde_json::from_str("\"leverage\"").unwrap();
        assert_eq!(metric, RuleMetric::Leverage);
    }
}
