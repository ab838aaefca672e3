use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, MiningError, Result};
use crate::itemsets::Algorithm;
use crate::rules::RuleMetric;

pub const DEFAULT_MIN_SUPPORT: f64 = 0.001;
pub const DEFAULT_MIN_THRESHOLD: f64 = 0.8;

/// Options that control itemset mining and rule generation.
///
/// Field names match the keys accepted in a JSON configuration file, so
/// `{"freq_itemsets_min_support": 0.01}` overrides just the support.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MiningConfig {
    /// Minimum fraction of baskets an itemset must appear in.
    pub freq_itemsets_min_support: f64,
    /// Metric used to filter association rules.
    pub assoc_rule_metric: RuleMetric,
    /// Rules whose metric falls below this value are dropped.
    pub assoc_rule_min_threshold: f64,
    /// Largest itemset cardinality to report (unbounded when `None`).
    pub max_len: Option<usize>,
    pub algorithm: Algorithm,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            freq_itemsets_min_support: DEFAULT_MIN_SUPPORT,
            assoc_rule_metric: RuleMetric::Confidence,
            assoc_rule_min_threshold: DEFAULT_MIN_THRESHOLD,
            max_len: None,
            algorithm: Algorithm::FpGrowth,
        }
    }
}

impl MiningConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_min_support(self.freq_itemsets_min_support)?;
        if self.assoc_rule_min_threshold.is_nan() {
            return Err(Error::Config(
                "assoc_rule_min_threshold must be a number".to_string(),
            ));
        }
        if self.max_len == Some(0) {
            return Err(Error::Config("max_len must be at least 1".to_string()));
        }
        Ok(())
    }
}

pub(crate) fn validate_min_support(min_support: f64) -> std::result::Result<(), MiningError> {
    if min_support > 0.0 && min_support <= 1.0 {
        Ok(())
    } else {
        Err(MiningError::InvalidMinSupport(min_support))
    }
}
