use std::collections::HashSet;

use itertools::Itertools;

use crate::types::{ItemId, Itemset};

/// Candidate k-itemsets from frequent (k-1)-itemsets that share their first
/// k-2 items.
///
/// https://github.com/tommyod/Efficient-Apriori/blob/master/efficient_apriori/itemsets.py
pub fn join_step(mut itemsets: Vec<Itemset>) -> Vec<Itemset> {
    itemsets.sort_unstable();

    let mut candidates: Vec<Itemset> = Vec::with_capacity(itemsets.len());
    let mut tail_items: Vec<ItemId> = Vec::with_capacity(itemsets.len());

    let mut i = 0;
    while i < itemsets.len() {
        let (&last, prefix) = match itemsets[i].split_last() {
            Some(split) => split,
            None => {
                i += 1;
                continue;
            }
        };

        tail_items.clear();
        tail_items.push(last);
        let mut skip = 1;

        for other in &itemsets[i + 1..] {
            match other.split_last() {
                Some((&other_last, other_prefix)) if other_prefix == prefix => {
                    tail_items.push(other_last);
                    skip += 1;
                }
                _ => break,
            }
        }

        for (&a, &b) in tail_items.iter().tuple_combinations() {
            let mut candidate = Vec::with_capacity(prefix.len() + 2);
            candidate.extend_from_slice(prefix);
            candidate.push(a);
            candidate.push(b);
            candidates.push(candidate);
        }

        i += skip;
    }

    candidates
}

/// Drops candidates that have an infrequent (k-1)-subset.
pub fn prune_step(candidates: Vec<Itemset>, frequent: &HashSet<&[ItemId]>) -> Vec<Itemset> {
    let mut subset: Itemset = Vec::new();
    candidates
        .into_iter()
        .filter(|candidate| {
            // the two subsets without one of the last two items come from the join
            (0..candidate.len().saturating_sub(2)).all(|skip| {
                subset.clear();
                subset.extend(
                    candidate
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != skip)
                        .map(|(_, &item)| item),
                );
                frequent.contains(subset.as_slice())
            })
        })
        .collect()
}
