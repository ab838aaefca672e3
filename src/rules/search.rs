use std::collections::VecDeque;

use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    error::MiningError,
    itemsets::FrequentItemsets,
    rules::{
        metric::RuleMetric,
        rule::{AssociationRule, RuleCandidate},
    },
    types::ItemId,
};

/// Generate every rule whose `metric` is at least `min_threshold`.
///
/// Fails with [`MiningError::NoRuleCandidates`] when no itemset has two or
/// more items. Rules come back sorted by antecedent, then consequent.
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    metric: RuleMetric,
    min_threshold: f64,
) -> Result<Vec<AssociationRule>, MiningError> {
    let patterns: Vec<&[ItemId]> = itemsets
        .iter()
        .map(|itemset| itemset.items.as_slice())
        .filter(|items| items.len() > 1)
        .collect();

    if patterns.is_empty() {
        return Err(MiningError::NoRuleCandidates);
    }

    let per_pattern: Vec<Vec<AssociationRule>> = patterns
        .par_iter()
        .map(|&combi| match metric {
            RuleMetric::Confidence => bfs(itemsets, combi, min_threshold),
            _ => exhaustive(itemsets, combi, metric, min_threshold),
        })
        .collect::<Result<_, _>>()?;

    let mut rules: Vec<AssociationRule> = per_pattern.into_iter().flatten().collect();
    rules.sort_unstable_by(|a, b| {
        a.antecedent
            .cmp(&b.antecedent)
            .then_with(|| a.consequent.cmp(&b.consequent))
    });
    Ok(rules)
}

/// Every split of `combi` into a non-empty antecedent and consequent.
fn exhaustive(
    itemsets: &FrequentItemsets,
    combi: &[ItemId],
    metric: RuleMetric,
    min_threshold: f64,
) -> Result<Vec<AssociationRule>, MiningError> {
    let mut rules = Vec::new();
    for size in 1..combi.len() {
        for antecedent in combi.iter().copied().combinations(size) {
            let consequent: Vec<ItemId> = combi
                .iter()
                .copied()
                .filter(|item| !antecedent.contains(item))
                .collect();
            let rule = AssociationRule::evaluate(itemsets, &antecedent, &consequent, combi)?;
            if rule.metrics.get(metric) >= min_threshold {
                rules.push(rule);
            }
        }
    }
    Ok(rules)
}

/// Given a combination, find the rules meeting `min_conf`, growing
/// consequents breadth first.
///
/// Moving an item from the antecedent to the consequent can only lower the
/// confidence, so once a rule fails, every rule whose consequent contains
/// its consequent is skipped.
fn bfs(
    itemsets: &FrequentItemsets,
    combi: &[ItemId],
    min_conf: f64,
) -> Result<Vec<AssociationRule>, MiningError> {
    let mut queue: VecDeque<RuleCandidate> = VecDeque::new();
    let mut blacklist = vec![];
    let mut final_rules = vec![];

    queue.extend(RuleCandidate::from_pattern(combi));

    while let Some(candidate) = queue.pop_front() {
        if candidate.is_a_child_of_a_blacklisted_rule(&blacklist) {
            continue;
        }

        let rule = AssociationRule::evaluate(
            itemsets,
            candidate.antecedent(),
            candidate.consequent(),
            combi,
        )?;

        if rule.metrics.confidence >= min_conf {
            let children = candidate.create_children(&blacklist, Some(&queue));
            queue.extend(children);
            final_rules.push(rule);
        } else {
            blacklist.push(candidate);
        }
    }

    Ok(final_rules)
}
