//! One-hot encoding of baskets into a sparse boolean occurrence matrix.
use std::collections::BTreeSet;

use crate::error::Result;
use crate::types::{Basket, ItemId, ReverseLookup, SupportCount, Transaction};

/// Learns the token vocabulary of a corpus and encodes baskets against it.
///
/// Columns are the distinct tokens in sorted order, so the column set depends
/// only on the corpus, not on basket order.
#[derive(Clone, Debug, Default)]
pub struct TransactionEncoder {
    columns: Vec<String>,
}

impl TransactionEncoder {
    pub fn fit(baskets: &[Basket]) -> Self {
        let columns: BTreeSet<&str> = baskets
            .iter()
            .flat_map(|basket| basket.iter().map(String::as_str))
            .collect();

        Self {
            columns: columns.into_iter().map(String::from).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Tokens not seen by [`fit`](Self::fit) are ignored.
    ///
    /// Rows are written straight into the compressed buffers, which are
    /// reserved up front for the total basket length.
    pub fn transform(&self, baskets: &[Basket]) -> Result<OccurrenceMatrix> {
        let lookup: ReverseLookup = self
            .columns
            .iter()
            .enumerate()
            .map(|(id, name)| (name.as_str(), id))
            .collect();

        let upper_bound = baskets.iter().map(Vec::len).sum();
        let mut indices: Vec<ItemId> = Vec::new();
        reserve_exact(&mut indices, upper_bound)?;
        let mut indptr: Vec<usize> = Vec::new();
        reserve_exact(&mut indptr, baskets.len() + 1)?;

        indptr.push(0);
        for basket in baskets {
            let start = indices.len();
            indices.extend(
                basket
                    .iter()
                    .filter_map(|token| lookup.get(token.as_str()).copied()),
            );
            sort_dedup_tail(&mut indices, start);
            indptr.push(indices.len());
        }

        Ok(OccurrenceMatrix {
            columns: self.columns.clone(),
            indptr,
            indices,
        })
    }

    pub fn fit_transform(baskets: &[Basket]) -> Result<OccurrenceMatrix> {
        Self::fit(baskets).transform(baskets)
    }
}

/// Compressed sparse rows: row `r` holds the sorted column ids
/// `indices[indptr[r]..indptr[r + 1]]`.
#[derive(Clone, Debug, PartialEq)]
pub struct OccurrenceMatrix {
    columns: Vec<String>,
    indptr: Vec<usize>,
    indices: Vec<ItemId>,
}

impl OccurrenceMatrix {
    /// Each row must be sorted and free of duplicates.
    pub fn from_rows(columns: Vec<String>, rows: &[Transaction]) -> Result<Self> {
        let nnz = rows.iter().map(Vec::len).sum();

        let mut indices = Vec::new();
        reserve_exact(&mut indices, nnz)?;
        let mut indptr = Vec::new();
        reserve_exact(&mut indptr, rows.len() + 1)?;

        indptr.push(0);
        for row in rows {
            indices.extend_from_slice(row);
            indptr.push(indices.len());
        }

        Ok(Self {
            columns,
            indptr,
            indices,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of `true` cells.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn row(&self, row: usize) -> &[ItemId] {
        &self.indices[self.indptr[row]..self.indptr[row + 1]]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[ItemId]> + '_ {
        self.indptr
            .windows(2)
            .map(move |bounds| &self.indices[bounds[0]..bounds[1]])
    }

    pub fn contains(&self, row: usize, column: ItemId) -> bool {
        self.row(row).binary_search(&column).is_ok()
    }

    /// Tokens present in `row`, in column order.
    pub fn decode_row(&self, row: usize) -> Vec<&str> {
        self.row(row)
            .iter()
            .map(|&id| self.columns[id].as_str())
            .collect()
    }

    /// Number of rows each column is present in.
    pub fn column_counts(&self) -> Vec<SupportCount> {
        let mut counts = vec![0; self.columns.len()];
        for &id in &self.indices {
            counts[id] += 1;
        }
        counts
    }
}

/// Allocation failure becomes [`ResourceLimit`](crate::error::Error::ResourceLimit)
/// instead of an abort.
pub(crate) fn reserve_exact<T>(buffer: &mut Vec<T>, additional: usize) -> Result<()> {
    buffer.try_reserve_exact(additional)?;
    Ok(())
}

/// Sorts `indices[start..]` and drops repeated ids from it.
fn sort_dedup_tail(indices: &mut Vec<ItemId>, start: usize) {
    indices[start..].sort_unstable();
    let mut write = start;
    for read in start..indices.len() {
        if write == start || indices[read] != indices[write - 1] {
            indices[write] = indices[read];
            write += 1;
        }
    }
    indices.truncate(write);
}
