//! FP-growth: recursive mining of conditional FP-trees.
use std::collections::HashMap;

use bitvec::prelude::*;
use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    encoder::OccurrenceMatrix,
    itemsets::fptree::FpTree,
    types::{ItemId, Itemset, ItemsetCounts, SupportCount, Transaction},
};

type Found = Vec<(Itemset, SupportCount)>;

/// Every itemset contained in at least `min_count` rows, excluding the empty
/// itemset.
pub fn fpgrowth(
    matrix: &OccurrenceMatrix,
    min_count: SupportCount,
    max_len: Option<usize>,
) -> ItemsetCounts {
    let max_len = max_len.unwrap_or(usize::MAX);

    let mut frequent = bitvec![0; matrix.num_columns()];
    for (id, &count) in matrix.column_counts().iter().enumerate() {
        if count >= min_count {
            frequent.set(id, true);
        }
    }

    let transactions: Vec<Transaction> = matrix
        .rows()
        .map(|row| row.iter().copied().filter(|&id| frequent[id]).collect::<Transaction>())
        .filter(|transaction| !transaction.is_empty())
        .collect();

    let tree = FpTree::build(transactions.iter().map(|t| (t.as_slice(), 1)), min_count);

    // Each top-level item owns a disjoint part of the search space.
    let found: Vec<Found> = tree
        .items()
        .par_iter()
        .map(|&item| {
            let mut found = Vec::new();
            grow(&tree, item, &[], min_count, max_len, &mut found);
            found
        })
        .collect();

    let mut counts: ItemsetCounts = HashMap::with_capacity(found.iter().map(Vec::len).sum());
    counts.extend(found.into_iter().flatten());
    counts
}

fn grow(
    tree: &FpTree,
    item: ItemId,
    suffix: &[ItemId],
    min_count: SupportCount,
    max_len: usize,
    found: &mut Found,
) {
    let mut itemset = Vec::with_capacity(suffix.len() + 1);
    itemset.extend_from_slice(suffix);
    itemset.push(item);
    found.push((sorted(&itemset), tree.count(item)));

    if itemset.len() < max_len {
        let conditional = tree.conditional_tree(item, min_count);
        mine(&conditional, &itemset, min_count, max_len, found);
    }
}

fn mine(
    tree: &FpTree,
    suffix: &[ItemId],
    min_count: SupportCount,
    max_len: usize,
    found: &mut Found,
) {
    if tree.is_empty() {
        return;
    }

    if let Some(path) = tree.single_path() {
        let longest = path.len().min(max_len.saturating_sub(suffix.len()));
        for size in 1..=longest {
            for combi in path.iter().combinations(size) {
                let count = combi.iter().map(|&&(_, count)| count).min().unwrap_or(0);
                let mut itemset: Itemset = suffix.to_vec();
                itemset.extend(combi.iter().map(|&&(item, _)| item));
                found.push((sorted(&itemset), count));
            }
        }
        return;
    }

    for &item in tree.items() {
        grow(tree, item, suffix, min_count, max_len, found);
    }
}

fn sorted(itemset: &[ItemId]) -> Itemset {
    let mut itemset = itemset.to_vec();
    itemset.sort_unstable();
    itemset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TransactionEncoder;
    use maplit::hashmap;

    fn matrix(raw: &[&[&str]]) -> OccurrenceMatrix {
        let baskets: Vec<Vec<String>> = raw
            .iter()
            .map(|basket| basket.iter().map(|s| s.to_string()).collect())
            .collect();
        TransactionEncoder::fit_transform(&baskets).unwrap()
    }

    #[test]
    fn mines_all_itemsets_at_count_one() {
        // a=0, b=1, c=2, d=3
        let m = matrix(&[&["a", "b"], &["a", "c"], &["a", "b", "c"], &["b", "d"]]);
        let counts = fpgrowth(&m, 1, None);

        let expected = hashmap! {
            vec![0] => 3,
            vec![1] => 3,
            vec![2] => 2,
            vec![3] => 1,
            vec![0, 1] => 2,
            vec![0, 2] => 2,
            vec![1, 2] => 1,
            vec![1, 3] => 1,
            vec![0, 1, 2] => 1,
        };
        assert_eq!(counts, expected);
    }

    #[test]
    fn mines_with_pruning() {
        let m = matrix(&[&["a", "b"], &["a", "c"], &["a", "b", "c"], &["b", "d"]]);
        let counts = fpgrowth(&m, 2, None);

        let expected = hashmap! {
            vec![0] => 3,
            vec![1] => 3,
            vec![2] => 2,
            vec![0, 1] => 2,
            vec![0, 2] => 2,
        };
        assert_eq!(counts, expected);
    }

    #[test]
    fn single_path_tree() {
        let m = matrix(&[&["a", "b", "c"], &["a", "b"], &["a"]]);
        let counts = fpgrowth(&m, 1, None);

        let expected = hashmap! {
            vec![0] => 3,
            vec![1] => 2,
            vec![2] => 1,
            vec![0, 1] => 2,
            vec![0, 2] => 1,
            vec![1, 2] => 1,
            vec![0, 1, 2] => 1,
        };
        assert_eq!(counts, expected);
    }

    #[test]
    fn max_len_one() {
        let m = matrix(&[&["a", "b", "c"], &["a", "b"]]);
        let counts = fpgrowth(&m, 1, Some(1));
        assert_eq!(counts, hashmap! { vec![0] => 2, vec![1] => 2, vec![2] => 1 });
    }

    #[test]
    fn nothing_frequent() {
        let m = matrix(&[&["a"], &["b"]]);
        assert!(fpgrowth(&m, 2, None).is_empty());
    }
}
