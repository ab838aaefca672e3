use std::collections::VecDeque;

use crate::{
    error::MiningError,
    itemsets::FrequentItemsets,
    rules::metric::RuleMetrics,
    types::{ItemId, Itemset},
};

/// A retained rule `antecedent => consequent`.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationRule {
    pub antecedent: Itemset,
    pub consequent: Itemset,
    pub metrics: RuleMetrics,
}

impl AssociationRule {
    /// Computes the metrics of `antecedent => consequent` from the supports
    /// recorded in `itemsets`. Both sides must be sorted.
    pub fn evaluate(
        itemsets: &FrequentItemsets,
        antecedent: &[ItemId],
        consequent: &[ItemId],
        combi: &[ItemId],
    ) -> Result<Self, MiningError> {
        let support_of = |items: &[ItemId]| {
            itemsets
                .support(items)
                .ok_or_else(|| MiningError::MissingSupport(items.to_vec()))
        };

        Ok(Self {
            metrics: RuleMetrics::new(
                support_of(antecedent)?,
                support_of(consequent)?,
                support_of(combi)?,
            ),
            antecedent: antecedent.to_vec(),
            consequent: consequent.to_vec(),
        })
    }

    pub fn antecedent_names<'a>(&self, itemsets: &'a FrequentItemsets) -> Vec<&'a str> {
        itemsets.names(&self.antecedent)
    }

    pub fn consequent_names<'a>(&self, itemsets: &'a FrequentItemsets) -> Vec<&'a str> {
        itemsets.names(&self.consequent)
    }
}

/// A split of one frequent itemset: `combi[..split]` is the antecedent and
/// `combi[split..]` the consequent, each sorted.
#[derive(Clone, Debug)]
pub struct RuleCandidate {
    pub split: usize,
    pub combi: Vec<ItemId>,
}

impl RuleCandidate {
    /// All rules with a single-item consequent.
    pub fn from_pattern(pattern: &[ItemId]) -> Vec<RuleCandidate> {
        let mother = RuleCandidate {
            split: pattern.len(),
            combi: pattern.to_vec(),
        };
        mother.create_children(&[], None)
    }

    /// Moves each antecedent item in turn into the consequent, skipping
    /// children already queued and children of blacklisted rules.
    pub fn create_children(
        &self,
        blacklist: &[Self],
        to_create: Option<&VecDeque<Self>>,
    ) -> Vec<Self> {
        if self.split <= 1 {
            return Vec::new();
        }

        let new_split = self.split - 1;
        let mut rules = Vec::with_capacity(self.split);
        let mut tmp_combi = self.combi.to_owned();

        for _ in 0..self.split {
            let window = &mut tmp_combi[..self.split];
            window.rotate_left(1);

            let mut combi = tmp_combi.clone();
            combi[..new_split].sort_unstable();
            combi[new_split..].sort_unstable();

            let rule = Self {
                split: new_split,
                combi,
            };

            if rule.is_going_to_be_created(to_create) || rules.contains(&rule) {
                continue;
            }

            if !rule.is_a_child_of_a_blacklisted_rule(blacklist) {
                rules.push(rule);
            }
        }

        rules
    }

    fn is_going_to_be_created(&self, to_create: Option<&VecDeque<Self>>) -> bool {
        to_create.map_or(false, |queue| queue.contains(self))
    }

    pub fn is_a_child_of_a_blacklisted_rule(&self, blacklist: &[Self]) -> bool {
        blacklist
            .iter()
            .any(|blacklisted_rule| self.is_child_of(blacklisted_rule))
    }

    pub fn antecedent(&self) -> &[ItemId] {
        &self.combi[..self.split]
    }

    pub fn consequent(&self) -> &[ItemId] {
        &self.combi[self.split..]
    }

    /// True when `self` has a strictly larger consequent that contains the
    /// parent's consequent.
    fn is_child_of(&self, parent: &Self) -> bool {
        if self.combi.len() != parent.combi.len() {
            return false;
        }
        if self.consequent().len() <= parent.consequent().len() {
            return false;
        }

        let conseq = self.consequent();
        parent.consequent().iter().all(|x| conseq.contains(x))
    }
}

impl PartialEq for RuleCandidate {
    fn eq(&self, other: &RuleCandidate) -> bool {
        // assumes same pattern
        self.split == other.split && self.consequent() == other.consequent()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::encoder::TransactionEncoder;
    use crate::itemsets::{frequent_itemsets, Algorithm};

    fn candidate(split: usize, combi: Vec<ItemId>) -> RuleCandidate {
        RuleCandidate { split, combi }
    }

    #[test]
    fn test_rule_eq_same_consequent() {
        assert!(candidate(2, vec![1, 2, 3, 5]) == candidate(2, vec![1, 2, 3, 5]));
        assert!(candidate(2, vec![1, 2, 3, 5]) == candidate(2, vec![9, 10, 3, 5]));
        assert!(candidate(2, vec![1, 2, 3, 5]) != candidate(2, vec![9, 10, 5]));
    }

    #[test]
    fn test_rule_contains() {
        let rules = VecDeque::from(vec![candidate(3, vec![1, 3, 4, 2])]);
        assert!(!rules.contains(&candidate(2, vec![3, 5, 1, 2])));
    }

    #[test]
    fn test_from_pattern() {
        let rules = RuleCandidate::from_pattern(&[1, 2, 3]);
        let mut consequents: Vec<&[ItemId]> = rules.iter().map(|r| r.consequent()).collect();
        consequents.sort_unstable();
        assert_eq!(consequents, vec![&[1][..], &[2][..], &[3][..]]);
        for rule in &rules {
            assert_eq!(rule.antecedent().len(), 2);
            assert!(rule.antecedent().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_rule_children() {
        let rule = candidate(4, vec![1, 2, 3, 4, 5]);
        let children = rule.create_children(&[], None);
        assert_eq!(children.len(), 4);
        for child in &children {
            assert_eq!(child.split, 3);
            assert!(child.consequent().contains(&5));
            assert!(child.consequent().windows(2).all(|w| w[0] < w[1]));
        }
        assert!(candidate(1, vec![1, 2]).create_children(&[], None).is_empty());
    }

    #[test]
    fn test_heritage() {
        let parent = candidate(
            4,
            vec![
                1, 2, 3, 4, // ante
                5, // conseq
            ],
        );
        let child = candidate(
            3,
            vec![
                1, 2, 3, // ante
                4, 5, // conseq
            ],
        );
        assert!(child.is_child_of(&parent));
        assert!(!parent.is_child_of(&child));
        assert!(child.is_a_child_of_a_blacklisted_rule(&[parent]));
    }

    #[test]
    fn evaluate_reads_supports() {
        let baskets: Vec<Vec<String>> = vec![
            vec!["a".into(), "b".into()],
            vec!["a".into()],
            vec!["b".into()],
            vec!["a".into(), "b".into()],
        ];
        let matrix = TransactionEncoder::fit_transform(&baskets).unwrap();
        let itemsets = frequent_itemsets(&matrix, 0.25, None, Algorithm::FpGrowth).unwrap();

        let rule = AssociationRule::evaluate(&itemsets, &[0], &[1], &[0, 1]).unwrap();
        assert_eq!(rule.metrics.antecedent_support, 0.75);
        assert_eq!(rule.metrics.support, 0.5);
        assert_eq!(rule.antecedent_names(&itemsets), vec!["a"]);
        assert_eq!(rule.consequent_names(&itemsets), vec!["b"]);

        assert_eq!(
            AssociationRule::evaluate(&itemsets, &[0], &[2], &[0, 2]),
            Err(MiningError::MissingSupport(vec![2]))
        );
    }
}
