//! Level-wise (Apriori) mining.
use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    combi::{join_step, prune_step},
    encoder::OccurrenceMatrix,
    types::{ItemCounts, ItemId, Itemset, ItemsetCounts, ItemsetLength, SupportCount, Transaction},
};

/// Generate frequent itemsets level by level, up to `max_len` items.
pub fn apriori(
    matrix: &OccurrenceMatrix,
    min_count: SupportCount,
    max_len: Option<ItemsetLength>,
) -> ItemsetCounts {
    let k = max_len.unwrap_or(usize::MAX);

    // 1-itemset
    let item_counts = generate_frequent_1_itemset_counts(matrix, min_count);
    let mut transactions: Vec<Transaction> = matrix
        .rows()
        .map(|row| {
            row.iter()
                .copied()
                .filter(|item| item_counts.contains_key(item))
                .collect()
        })
        .collect();

    let mut all_frequent_itemsets: ItemsetCounts = convert_to_itemset_counts(&item_counts);
    if k == 1 {
        return all_frequent_itemsets;
    }

    // 2-itemset
    transactions.retain(|transaction| transaction.len() >= 2);
    let candidates: Vec<Itemset> = item_counts
        .keys()
        .copied()
        .sorted()
        .combinations(2)
        .collect();
    let mut frequent = generate_frequent_k_itemset_counts(candidates, &transactions, min_count);

    // k-itemset, k >= 3
    let mut size = 2;
    while !frequent.is_empty() {
        if size == k {
            all_frequent_itemsets.extend(frequent);
            break;
        }
        size += 1;
        transactions.retain(|transaction| transaction.len() >= size);

        let candidates = {
            let prev: HashSet<&[ItemId]> = frequent.keys().map(Vec::as_slice).collect();
            prune_step(join_step(frequent.keys().cloned().collect()), &prev)
        };
        let next = generate_frequent_k_itemset_counts(candidates, &transactions, min_count);
        all_frequent_itemsets.extend(frequent);
        frequent = next;
    }

    all_frequent_itemsets
}

fn generate_frequent_1_itemset_counts(
    matrix: &OccurrenceMatrix,
    min_count: SupportCount,
) -> ItemCounts {
    matrix
        .column_counts()
        .into_iter()
        .enumerate()
        .filter(|&(_, count)| count >= min_count)
        .collect()
}

/// includes pruning
fn generate_frequent_k_itemset_counts(
    candidates: Vec<Itemset>,
    transactions: &[Transaction],
    min_count: SupportCount,
) -> ItemsetCounts {
    candidates
        .into_par_iter()
        .filter_map(|candidate| {
            let candidate_count = transactions
                .iter()
                .filter(|transaction| contains_all(transaction, &candidate))
                .count() as SupportCount;
            if candidate_count >= min_count {
                Some((candidate, candidate_count))
            } else {
                None
            }
        })
        .collect()
}

/// Both slices are sorted.
fn contains_all(transaction: &[ItemId], candidate: &[ItemId]) -> bool {
    candidate
        .iter()
        .all(|item| transaction.binary_search(item).is_ok())
}

fn convert_to_itemset_counts(item_counts: &ItemCounts) -> ItemsetCounts {
    let mut itemset_counts = HashMap::with_capacity(item_counts.len());
    itemset_counts.extend(item_counts.iter().map(|(&k, &v)| (vec![k], v)));
    itemset_counts
}
