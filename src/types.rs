use std::collections::HashMap;

/// Column index into the sorted token vocabulary.
pub type ItemId = usize;
pub type ItemName<'l> = &'l str;
/// Sorted, duplicate-free column indices.
pub type Itemset = Vec<ItemId>;

pub type ReverseLookup<'l> = HashMap<ItemName<'l>, ItemId>;

/// Ordered tokens describing one report.
pub type Basket = Vec<String>;
pub type Transaction = Vec<ItemId>;

pub type SupportCount = u32;
pub type ItemCounts = HashMap<ItemId, SupportCount>;
pub type ItemsetCounts = HashMap<Itemset, SupportCount>;

pub type ItemsetLength = usize;

/// `VAERS_ID`.
pub type ReportKey = i64;
