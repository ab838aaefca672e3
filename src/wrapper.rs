use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

use crate::config::MiningConfig;
use crate::error::Error;
use crate::pipeline::{mine_baskets, mine_itemsets, MiningResult};
use crate::rules::RuleMetric;
use crate::types::Basket;

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pyclass]
#[derive(Clone)]
pub struct Rule {
    #[pyo3(get)]
    antecedent: Vec<String>,
    #[pyo3(get)]
    consequent: Vec<String>,
    #[pyo3(get)]
    antecedent_support: f64,
    #[pyo3(get)]
    consequent_support: f64,
    #[pyo3(get)]
    support: f64,
    #[pyo3(get)]
    confidence: f64,
    #[pyo3(get)]
    lift: f64,
    #[pyo3(get)]
    leverage: f64,
    #[pyo3(get)]
    conviction: f64,
}

#[pymodule]
fn vaers_patterns(_: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<Rule>()?;
    m.add_function(wrap_pyfunction!(frequent_itemsets, m)?)?;
    m.add_function(wrap_pyfunction!(association_rules, m)?)?;
    Ok(())
}

/// Frequent itemsets of `baskets` as `(support, items)` pairs.
#[pyfunction]
#[pyo3(text_signature = "(baskets, min_support, max_len=None)")]
fn frequent_itemsets(
    py: Python,
    baskets: Vec<Basket>,
    min_support: f64,
    max_len: Option<usize>,
) -> PyResult<Vec<(f64, Vec<String>)>> {
    let config = MiningConfig {
        freq_itemsets_min_support: min_support,
        max_len,
        ..MiningConfig::default()
    };
    let itemsets = py.allow_threads(|| mine_itemsets(&baskets, &config))?;
    Ok(itemsets.to_named())
}

/// Association rules of `baskets` filtered on `metric >= min_threshold`.
#[pyfunction]
#[pyo3(text_signature = "(baskets, min_support, metric, min_threshold, max_len=None)")]
fn association_rules(
    py: Python,
    baskets: Vec<Basket>,
    min_support: f64,
    metric: &str,
    min_threshold: f64,
    max_len: Option<usize>,
) -> PyResult<Vec<Rule>> {
    let config = MiningConfig {
        freq_itemsets_min_support: min_support,
        assoc_rule_metric: metric.parse::<RuleMetric>()?,
        assoc_rule_min_threshold: min_threshold,
        max_len,
        ..MiningConfig::default()
    };
    let result = py.allow_threads(|| mine_baskets(&baskets, &config))?;
    Ok(convert_rules(&result))
}

fn convert_rules(result: &MiningResult) -> Vec<Rule> {
    result
        .rules
        .iter()
        .map(|rule| Rule {
            antecedent: rule
                .antecedent_names(&result.itemsets)
                .into_iter()
                .map(String::from)
                .collect(),
            consequent: rule
                .consequent_names(&result.itemsets)
                .into_iter()
                .map(String::from)
                .collect(),
            antecedent_support: rule.metrics.antecedent_support,
            consequent_support: rule.metrics.consequent_support,
            support: rule.metrics.support,
            confidence: rule.metrics.confidence,
            lift: rule.metrics.lift,
            leverage: rule.metrics.leverage,
            conviction: rule.metrics.conviction,
        })
        .collect()
}
