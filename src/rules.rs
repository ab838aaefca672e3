//! Association rules derived from frequent itemsets.
pub mod metric;
pub mod rule;
pub mod search;

pub use metric::{RuleMetric, RuleMetrics};
pub use rule::AssociationRule;
pub use search::generate_rules;
