//! Basket construction and frequent-pattern mining over VAERS reports.
//!
//! Three keyed tables are joined on `VAERS_ID`, each joined row becomes a
//! basket of categorical tokens, and the baskets are mined for frequent
//! itemsets and association rules.
pub mod basket;
pub mod combi;
pub mod config;
pub mod encoder;
pub mod error;
pub mod io;
pub mod itemsets;
pub mod pipeline;
pub mod rules;
pub mod table;
pub mod types;

#[cfg(feature = "python")]
mod wrapper;

pub use basket::{BasketBuilder, BasketSchema};
pub use config::MiningConfig;
pub use encoder::{OccurrenceMatrix, TransactionEncoder};
pub use error::{Error, MiningError, Result, SchemaError};
pub use itemsets::{frequent_itemsets, Algorithm, FrequentItemset, FrequentItemsets};
pub use pipeline::{mine_baskets, mine_itemsets, mine_tables, run, InputPaths, MiningResult, OutputPaths};
pub use rules::{generate_rules, AssociationRule, RuleMetric, RuleMetrics};
pub use table::{merge_tables, Table, Value};
