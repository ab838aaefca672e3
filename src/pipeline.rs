//! End-to-end run: read, join, build baskets, encode, mine, write.
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::basket::{BasketBuilder, BasketSchema};
use crate::config::MiningConfig;
use crate::encoder::TransactionEncoder;
use crate::error::{MiningError, Result};
use crate::io::{self, TableSchema};
use crate::itemsets::{frequent_itemsets, FrequentItemsets};
use crate::rules::{generate_rules, AssociationRule};
use crate::table::{merge_tables, Table};
use crate::types::Basket;

#[derive(Clone, Debug)]
pub struct InputPaths {
    pub data: PathBuf,
    pub symptoms: PathBuf,
    pub vax: PathBuf,
}

#[derive(Clone, Debug)]
pub struct OutputPaths {
    pub freq_itemsets: PathBuf,
    pub assoc_rules: PathBuf,
}

/// Both result tables of one run. Either may be empty.
#[derive(Clone, Debug, PartialEq)]
pub struct MiningResult {
    pub itemsets: FrequentItemsets,
    pub rules: Vec<AssociationRule>,
}

/// Mine frequent itemsets and rules from baskets.
///
/// Finding no itemsets, or no itemset with two or more items, yields empty
/// tables rather than an error.
pub fn mine_baskets(baskets: &[Basket], config: &MiningConfig) -> Result<MiningResult> {
    let itemsets = mine_itemsets(baskets, config)?;

    info!(
        "Generating association rules with metric='{}', min_threshold={}...",
        config.assoc_rule_metric, config.assoc_rule_min_threshold
    );
    let rules = match generate_rules(
        &itemsets,
        config.assoc_rule_metric,
        config.assoc_rule_min_threshold,
    ) {
        Ok(rules) => rules,
        Err(MiningError::NoRuleCandidates) => {
            warn!("no frequent itemset has two or more items; no rules generated");
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };
    debug!(rules = rules.len(), "generated rules");

    Ok(MiningResult { itemsets, rules })
}

/// Encode `baskets` and mine their frequent itemsets, without rules.
pub fn mine_itemsets(baskets: &[Basket], config: &MiningConfig) -> Result<FrequentItemsets> {
    config.validate()?;

    info!("One-hot encoding baskets...");
    let matrix = TransactionEncoder::fit_transform(baskets)?;
    debug!(
        rows = matrix.num_rows(),
        columns = matrix.num_columns(),
        nnz = matrix.nnz(),
        "encoded occurrence matrix"
    );

    info!(
        "Extracting frequent itemsets with min_support={} ({})...",
        config.freq_itemsets_min_support, config.algorithm
    );
    let itemsets = frequent_itemsets(
        &matrix,
        config.freq_itemsets_min_support,
        config.max_len,
        config.algorithm,
    )?;
    debug!(itemsets = itemsets.len(), longest = itemsets.max_len(), "mined itemsets");
    if itemsets.is_empty() {
        warn!("no itemset reaches the minimum support");
    }
    Ok(itemsets)
}

/// Join the three tables and turn every joined row into a basket.
pub fn build_baskets(
    data: &Table,
    symptoms: &Table,
    vax: &Table,
    schema: BasketSchema,
) -> Result<Vec<Basket>> {
    info!("Merging data...");
    let merged = merge_tables(&[data, symptoms, vax])
        .unwrap_or_else(|| Table::new("merged", data.key_column(), Vec::new()));
    debug!(
        table = merged.name(),
        key = merged.key_column(),
        rows = merged.len(),
        columns = merged.columns().len(),
        "merged tables"
    );

    info!("Creating baskets...");
    let builder = BasketBuilder::new(schema, &merged)?;
    Ok(builder.build_all(&merged))
}

pub fn mine_tables(
    data: &Table,
    symptoms: &Table,
    vax: &Table,
    schema: BasketSchema,
    config: &MiningConfig,
) -> Result<MiningResult> {
    let baskets = build_baskets(data, symptoms, vax, schema)?;
    mine_baskets(&baskets, config)
}

/// Read the three VAERS files, mine them and write both result tables.
///
/// Nothing is written unless mining succeeds.
pub fn run(inputs: &InputPaths, outputs: &OutputPaths, config: &MiningConfig) -> Result<MiningResult> {
    config.validate()?;

    info!("Reading {}...", inputs.data.display());
    let data = io::read_table_path(&inputs.data, &TableSchema::vaers_data())?;
    info!("Reading {}...", inputs.symptoms.display());
    let symptoms = io::read_table_path(&inputs.symptoms, &TableSchema::vaers_symptoms())?;
    info!("Reading {}...", inputs.vax.display());
    let vax = io::read_table_path(&inputs.vax, &TableSchema::vaers_vax())?;

    let result = mine_tables(&data, &symptoms, &vax, BasketSchema::vaers(), config)?;

    info!("Saving frequent itemsets to {}...", outputs.freq_itemsets.display());
    io::save_frequent_itemsets(&outputs.freq_itemsets, &result.itemsets)?;
    info!("Saving association rules to {}...", outputs.assoc_rules.display());
    io::save_association_rules(&outputs.assoc_rules, &result.rules, &result.itemsets)?;

    Ok(result)
}
