//! Frequent itemset mining over an [`OccurrenceMatrix`].
//!
//! Two miners are available. FP-growth (`growth`) is the default and scales to
//! large vocabularies; the level-wise Apriori miner (`count`) is kept as an
//! alternative and as a cross-check. Both report the same itemsets with the
//! same counts, and neither reports the empty itemset.
pub mod count;
pub mod fptree;
pub mod growth;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::validate_min_support;
use crate::encoder::OccurrenceMatrix;
use crate::error::{Error, MiningError};
use crate::types::{ItemId, Itemset, ItemsetCounts, SupportCount};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    FpGrowth,
    Apriori,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::FpGrowth => f.write_str("fpgrowth"),
            Algorithm::Apriori => f.write_str("apriori"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fpgrowth" | "fp-growth" => Ok(Algorithm::FpGrowth),
            "apriori" => Ok(Algorithm::Apriori),
            other => Err(Error::Config(format!("unknown algorithm '{}'", other))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FrequentItemset {
    pub items: Itemset,
    pub count: SupportCount,
    pub support: f64,
}

/// All frequent itemsets of one run, sorted by length and then by item ids.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequentItemsets {
    vocabulary: Vec<String>,
    num_transactions: usize,
    itemsets: Vec<FrequentItemset>,
    index: HashMap<Itemset, usize>,
}

impl FrequentItemsets {
    pub fn new(vocabulary: Vec<String>, num_transactions: usize, counts: ItemsetCounts) -> Self {
        let n = num_transactions as f64;
        let mut itemsets: Vec<FrequentItemset> = counts
            .into_iter()
            .map(|(items, count)| FrequentItemset {
                support: count as f64 / n,
                items,
                count,
            })
            .collect();
        itemsets.sort_unstable_by(|a, b| {
            a.items
                .len()
                .cmp(&b.items.len())
                .then_with(|| a.items.cmp(&b.items))
        });
        let index = itemsets
            .iter()
            .enumerate()
            .map(|(i, itemset)| (itemset.items.clone(), i))
            .collect();

        Self {
            vocabulary,
            num_transactions,
            itemsets,
            index,
        }
    }

    pub fn empty(vocabulary: Vec<String>, num_transactions: usize) -> Self {
        Self::new(vocabulary, num_transactions, HashMap::new())
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FrequentItemset> {
        self.itemsets.iter()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn num_transactions(&self) -> usize {
        self.num_transactions
    }

    pub fn max_len(&self) -> usize {
        self.itemsets.last().map_or(0, |itemset| itemset.items.len())
    }

    /// `items` must be sorted.
    pub fn get(&self, items: &[ItemId]) -> Option<&FrequentItemset> {
        self.index.get(items).map(|&i| &self.itemsets[i])
    }

    pub fn support(&self, items: &[ItemId]) -> Option<f64> {
        self.get(items).map(|itemset| itemset.support)
    }

    pub fn names(&self, items: &[ItemId]) -> Vec<&str> {
        items.iter().map(|&id| self.vocabulary[id].as_str()).collect()
    }

    /// Itemsets as `(support, tokens)` pairs.
    pub fn to_named(&self) -> Vec<(f64, Vec<String>)> {
        self.itemsets
            .iter()
            .map(|itemset| {
                let names = self.names(&itemset.items).into_iter().map(String::from);
                (itemset.support, names.collect())
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a FrequentItemset;
    type IntoIter = std::slice::Iter<'a, FrequentItemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.itemsets.iter()
    }
}

/// Smallest count `c` with `c / n >= min_support`.
///
/// Derived from the fraction so that float rounding in `min_support * n`
/// cannot drop an itemset whose reported support meets the threshold.
pub fn min_support_count(min_support: f64, num_transactions: usize) -> SupportCount {
    let n = num_transactions as f64;
    let mut count = (min_support * n).floor().max(0.0) as SupportCount;
    while count > 0 && (count - 1) as f64 / n >= min_support {
        count -= 1;
    }
    while (count as f64 / n) < min_support {
        count += 1;
    }
    count.max(1)
}

/// Mine every itemset whose support is at least `min_support`.
pub fn frequent_itemsets(
    matrix: &OccurrenceMatrix,
    min_support: f64,
    max_len: Option<usize>,
    algorithm: Algorithm,
) -> Result<FrequentItemsets, MiningError> {
    validate_min_support(min_support)?;

    let vocabulary = matrix.columns().to_vec();
    if matrix.num_rows() == 0 || max_len == Some(0) {
        return Ok(FrequentItemsets::empty(vocabulary, matrix.num_rows()));
    }

    let min_count = min_support_count(min_support, matrix.num_rows());
    let counts = match algorithm {
        Algorithm::FpGrowth => growth::fpgrowth(matrix, min_count, max_len),
        Algorithm::Apriori => count::apriori(matrix, min_count, max_len),
    };

    Ok(FrequentItemsets::new(vocabulary, matrix.num_rows(), counts))
}
