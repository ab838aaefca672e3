//! Keyed tables and the inner join that merges the three VAERS files.
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;

use crate::error::SchemaError;
use crate::types::ReportKey;

const LEFT_SUFFIX: &str = "_x";
const RIGHT_SUFFIX: &str = "_y";

/// A single cell.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    /// NaN counts as missing, the same way an empty cell does.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            _ => None,
        }
    }

    /// Token form of a present value, `None` when missing.
    pub fn to_token(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Number(n) => write!(f, "{}", n),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}

/// Rows keyed by report id, kept in ascending key order.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    key_column: String,
    columns: Vec<String>,
    rows: BTreeMap<ReportKey, Vec<Value>>,
}

impl Table {
    pub fn new(name: &str, key_column: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            key_column: key_column.to_string(),
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Inserts a row. Values beyond the column count are dropped and short
    /// rows are padded with `Missing`.
    pub fn insert(&mut self, key: ReportKey, mut values: Vec<Value>) -> Result<(), SchemaError> {
        if self.rows.contains_key(&key) {
            return Err(SchemaError::DuplicateKey {
                table: self.name.clone(),
                key,
            });
        }
        values.resize(self.columns.len(), Value::Missing);
        self.rows.insert(key, values);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = ReportKey> + '_ {
        self.rows.keys().copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (ReportKey, &[Value])> + '_ {
        self.rows.iter().map(|(&key, values)| (key, values.as_slice()))
    }

    pub fn row(&self, key: ReportKey) -> Option<&[Value]> {
        self.rows.get(&key).map(Vec::as_slice)
    }

    pub fn column_index(&self, column: &str) -> Result<usize, SchemaError> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| SchemaError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn get(&self, key: ReportKey, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(&key).map(|values| &values[idx])
    }
}

/// Inner join of two tables on their keys. Column names present on both sides
/// get `_x` / `_y` suffixes.
pub fn merge(left: &Table, right: &Table) -> Table {
    let right_names: HashSet<&str> = right.columns.iter().map(String::as_str).collect();
    let left_names: HashSet<&str> = left.columns.iter().map(String::as_str).collect();

    let columns = left
        .columns
        .iter()
        .map(|c| suffixed(c, right_names.contains(c.as_str()), LEFT_SUFFIX))
        .chain(
            right
                .columns
                .iter()
                .map(|c| suffixed(c, left_names.contains(c.as_str()), RIGHT_SUFFIX)),
        )
        .collect();

    let rows = left
        .rows
        .iter()
        .filter_map(|(key, left_values)| {
            right.rows.get(key).map(|right_values| {
                let mut values = Vec::with_capacity(left_values.len() + right_values.len());
                values.extend(left_values.iter().cloned());
                values.extend(right_values.iter().cloned());
                (*key, values)
            })
        })
        .collect();

    Table {
        name: format!("{}+{}", left.name, right.name),
        key_column: left.key_column.clone(),
        columns,
        rows,
    }
}

/// Folds [`merge`] over all tables, left to right. `None` when `tables` is
/// empty.
pub fn merge_tables(tables: &[&Table]) -> Option<Table> {
    let (&first, rest) = tables.split_first()?;
    Some(rest.iter().fold(first.clone(), |acc, &table| merge(&acc, table)))
}

fn suffixed(column: &str, collides: bool, suffix: &str) -> String {
    if collides {
        format!("{}{}", column, suffix)
    } else {
        column.to_string()
    }
}
