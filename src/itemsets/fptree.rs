use std::collections::HashMap;

use crate::types::{ItemCounts, ItemId, SupportCount};

const ROOT: usize = 0;

#[derive(Debug)]
struct Node {
    item: Option<ItemId>,
    count: SupportCount,
    parent: usize,
    children: HashMap<ItemId, usize>,
}

/// Prefix tree of transactions whose items are ordered by descending
/// frequency. Nodes live in an arena and point to their parent by index.
#[derive(Debug)]
pub struct FpTree {
    nodes: Vec<Node>,
    /// Node indices per item.
    header: HashMap<ItemId, Vec<usize>>,
    item_counts: ItemCounts,
    /// Frequent items, most frequent first. Ties break on item id.
    order: Vec<ItemId>,
    rank: HashMap<ItemId, usize>,
}

impl FpTree {
    /// Builds a tree from weighted paths, keeping only items whose total
    /// weight reaches `min_count`.
    pub fn build<'p, I>(paths: I, min_count: SupportCount) -> Self
    where
        I: IntoIterator<Item = (&'p [ItemId], SupportCount)> + Clone,
    {
        let mut item_counts: ItemCounts = HashMap::new();
        for (path, weight) in paths.clone() {
            for &item in path {
                *item_counts.entry(item).or_insert(0) += weight;
            }
        }
        item_counts.retain(|_, &mut count| count >= min_count);

        let mut order: Vec<ItemId> = item_counts.keys().copied().collect();
        order.sort_unstable_by(|a, b| item_counts[b].cmp(&item_counts[a]).then(a.cmp(b)));
        let rank: HashMap<ItemId, usize> = order.iter().enumerate().map(|(r, &item)| (item, r)).collect();

        let mut tree = Self {
            nodes: vec![Node {
                item: None,
                count: 0,
                parent: ROOT,
                children: HashMap::new(),
            }],
            header: HashMap::with_capacity(order.len()),
            item_counts,
            order,
            rank,
        };

        let mut ranked: Vec<ItemId> = Vec::new();
        for (path, weight) in paths {
            ranked.clear();
            ranked.extend(path.iter().copied().filter(|item| tree.rank.contains_key(item)));
            ranked.sort_unstable_by_key(|item| tree.rank[item]);
            tree.insert(&ranked, weight);
        }

        tree
    }

    fn insert(&mut self, path: &[ItemId], weight: SupportCount) {
        let mut current = ROOT;
        for &item in path {
            current = match self.nodes[current].children.get(&item) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node {
                        item: Some(item),
                        count: 0,
                        parent: current,
                        children: HashMap::new(),
                    });
                    self.nodes[current].children.insert(item, child);
                    self.header.entry(item).or_default().push(child);
                    child
                }
            };
            self.nodes[current].count += weight;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Frequent items, most frequent first.
    pub fn items(&self) -> &[ItemId] {
        &self.order
    }

    pub fn count(&self, item: ItemId) -> SupportCount {
        self.item_counts.get(&item).copied().unwrap_or(0)
    }

    /// Items along the only branch, root first, with their counts, or `None`
    /// when the tree branches anywhere.
    pub fn single_path(&self) -> Option<Vec<(ItemId, SupportCount)>> {
        let mut path = Vec::new();
        let mut current = ROOT;
        loop {
            let node = &self.nodes[current];
            match node.children.len() {
                0 => return Some(path),
                1 => {
                    let &child = node.children.values().next()?;
                    let child_node = &self.nodes[child];
                    path.push((child_node.item?, child_node.count));
                    current = child;
                }
                _ => return None,
            }
        }
    }

    /// Prefix paths leading to every occurrence of `item`, weighted by the
    /// occurrence count.
    pub fn conditional_pattern_base(&self, item: ItemId) -> Vec<(Vec<ItemId>, SupportCount)> {
        let occurrences = match self.header.get(&item) {
            Some(occurrences) => occurrences,
            None => return Vec::new(),
        };

        occurrences
            .iter()
            .filter_map(|&node| {
                let mut prefix = Vec::new();
                let mut current = self.nodes[node].parent;
                while current != ROOT {
                    let ancestor = &self.nodes[current];
                    prefix.extend(ancestor.item);
                    current = ancestor.parent;
                }
                if prefix.is_empty() {
                    None
                } else {
                    prefix.reverse();
                    Some((prefix, self.nodes[node].count))
                }
            })
            .collect()
    }

    pub fn conditional_tree(&self, item: ItemId, min_count: SupportCount) -> Self {
        let base = self.conditional_pattern_base(item);
        Self::build(base.iter().map(|(path, weight)| (path.as_slice(), *weight)), min_count)
    }
}
