//! Reading VAERS CSV files into [`Table`]s and writing mining results.
//!
//! VAERS publishes its files in ISO-8859-1, so cells are decoded byte for byte
//! rather than as UTF-8.
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::itemsets::FrequentItemsets;
use crate::rules::AssociationRule;
use crate::table::{Table, Value};
use crate::types::ReportKey;

pub const KEY_COLUMN: &str = "VAERS_ID";

const DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"];

pub const ITEMSET_HEADER: [&str; 2] = ["support", "itemsets"];
pub const RULE_HEADER: [&str; 9] = [
    "antecedents",
    "consequents",
    "antecedent support",
    "consequent support",
    "support",
    "confidence",
    "lift",
    "leverage",
    "conviction",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Float,
    Date,
}

/// Column types of one input table. Columns not listed are read as text.
#[derive(Clone, Debug)]
pub struct TableSchema {
    pub name: String,
    pub key: String,
    types: HashMap<String, ColumnType>,
}

impl TableSchema {
    pub fn new(name: &str, key: &str) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            types: HashMap::new(),
        }
    }

    pub fn with_column(mut self, column: &str, column_type: ColumnType) -> Self {
        self.types.insert(column.to_string(), column_type);
        self
    }

    pub fn with_columns(self, columns: &[&str], column_type: ColumnType) -> Self {
        columns
            .iter()
            .fold(self, |schema, column| schema.with_column(column, column_type))
    }

    pub fn column_type(&self, column: &str) -> ColumnType {
        self.types.get(column).copied().unwrap_or(ColumnType::Text)
    }

    /// `VAERSDATA`: case-level fields.
    pub fn vaers_data() -> Self {
        Self::new("data", KEY_COLUMN)
            .with_columns(
                &["AGE_YRS", "CAGE_YR", "CAGE_MO", "HOSPDAYS", "NUMDAYS", "FORM_VERS"],
                ColumnType::Float,
            )
            .with_columns(
                &[
                    "RECVDATE",
                    "RPT_DATE",
                    "DATEDIED",
                    "VAX_DATE",
                    "ONSET_DATE",
                    "TODAYS_DATE",
                ],
                ColumnType::Date,
            )
    }

    /// `VAERSSYMPTOMS`: up to five MedDRA terms per row.
    pub fn vaers_symptoms() -> Self {
        Self::new("symptoms", KEY_COLUMN)
    }

    /// `VAERSVAX`: vaccine product details.
    pub fn vaers_vax() -> Self {
        Self::new("vax", KEY_COLUMN)
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn parse_cell(raw: &[u8], column_type: ColumnType) -> Value {
    if raw.is_empty() {
        return Value::Missing;
    }
    let text = decode_latin1(raw);
    match column_type {
        ColumnType::Text => Value::Text(text),
        ColumnType::Float => text
            .trim()
            .parse::<f64>()
            .map_or(Value::Missing, Value::Number),
        ColumnType::Date => DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text.trim(), format).ok())
            .map_or(Value::Missing, Value::Date),
    }
}

/// Reads a headed CSV table keyed by `schema.key`.
pub fn read_table<R: Read>(reader: R, schema: &TableSchema) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.byte_headers()?.iter().map(decode_latin1).collect();
    let key_index = headers
        .iter()
        .position(|h| h.trim() == schema.key)
        .ok_or_else(|| SchemaError::MissingColumn {
            table: schema.name.clone(),
            column: schema.key.clone(),
        })?;

    let value_columns: Vec<(usize, ColumnType)> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != key_index)
        .map(|(i, name)| (i, schema.column_type(name)))
        .collect();
    let names = value_columns
        .iter()
        .map(|&(i, _)| headers[i].clone())
        .collect();

    let mut table = Table::new(&schema.name, &schema.key, names);
    for record in reader.byte_records() {
        let record = record?;
        let raw_key = decode_latin1(record.get(key_index).unwrap_or_default());
        let key: ReportKey = raw_key
            .trim()
            .parse()
            .map_err(|_| SchemaError::InvalidKey {
                table: schema.name.clone(),
                value: raw_key.clone(),
            })?;

        let values = value_columns
            .iter()
            .map(|&(i, column_type)| {
                record
                    .get(i)
                    .map_or(Value::Missing, |raw| parse_cell(raw, column_type))
            })
            .collect();
        table.insert(key, values)?;
    }

    debug!(table = %schema.name, rows = table.len(), columns = table.columns().len(), "read table");
    Ok(table)
}

pub fn read_table_path(path: &Path, schema: &TableSchema) -> Result<Table> {
    read_table(File::open(path)?, schema)
}

fn format_float(value: f64) -> String {
    format!("{}", value)
}

fn format_items(names: &[&str]) -> Result<String> {
    Ok(serde_json::to_string(names)?)
}

/// One row per itemset: its support and its tokens as a JSON array.
pub fn write_frequent_itemsets<W: Write>(writer: W, itemsets: &FrequentItemsets) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(ITEMSET_HEADER)?;
    for itemset in itemsets {
        writer.write_record(&[
            format_float(itemset.support),
            format_items(&itemsets.names(&itemset.items))?,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per rule with all of its metrics.
pub fn write_association_rules<W: Write>(
    writer: W,
    rules: &[AssociationRule],
    itemsets: &FrequentItemsets,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(RULE_HEADER)?;
    for rule in rules {
        let m = &rule.metrics;
        writer.write_record(&[
            format_items(&rule.antecedent_names(itemsets))?,
            format_items(&rule.consequent_names(itemsets))?,
            format_float(m.antecedent_support),
            format_float(m.consequent_support),
            format_float(m.support),
            format_float(m.confidence),
            format_float(m.lift),
            format_float(m.leverage),
            format_float(m.conviction),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_frequent_itemsets(path: &Path, itemsets: &FrequentItemsets) -> Result<()> {
    write_frequent_itemsets(File::create(path)?, itemsets)
}

pub fn save_association_rules(
    path: &Path,
    rules: &[AssociationRule],
    itemsets: &FrequentItemsets,
) -> Result<()> {
    write_association_rules(File::create(path)?, rules, itemsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::rules::RuleMetrics;
    use maplit::hashmap;

    const DATA: &str = "\
VAERS_ID,RECVDATE,STATE,AGE_YRS,SEX,DIED
916600,01/01/2021,TX,33.0,F,
916601,01/01/2021,CA,73.0,F,Y
916602,,,,U,
";

    #[test]
    fn reads_typed_columns() {
        let table = read_table(DATA.as_bytes(), &TableSchema::vaers_data()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns(), &["RECVDATE", "STATE", "AGE_YRS", "SEX", "DIED"]);
        assert_eq!(table.get(916600, "AGE_YRS"), Some(&Value::Number(33.0)));
        assert_eq!(
            table.get(916600, "RECVDATE"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()))
        );
        assert_eq!(table.get(916601, "DIED"), Some(&Value::from("Y")));
        assert_eq!(table.get(916600, "DIED"), Some(&Value::Missing));
        assert_eq!(table.get(916602, "STATE"), Some(&Value::Missing));
        assert_eq!(table.get(916602, "AGE_YRS"), Some(&Value::Missing));
    }

    #[test]
    fn latin1_bytes_are_decoded() {
        let raw: &[u8] = b"VAERS_ID,SYMPTOM1\n1,Caf\xe9\n";
        let table = read_table(raw, &TableSchema::vaers_symptoms()).unwrap();
        assert_eq!(table.get(1, "SYMPTOM1"), Some(&Value::from("Caf\u{e9}")));
    }

    #[test]
    fn unparseable_numbers_and_dates_are_missing() {
        let raw = "VAERS_ID,AGE_YRS,VAX_DATE\n1,old,someday\n";
        let table = read_table(raw.as_bytes(), &TableSchema::vaers_data()).unwrap();
        assert_eq!(table.get(1, "AGE_YRS"), Some(&Value::Missing));
        assert_eq!(table.get(1, "VAX_DATE"), Some(&Value::Missing));
    }

    #[test]
    fn missing_key_column() {
        let raw = "ID,STATE\n1,CA\n";
        let err = read_table(raw.as_bytes(), &TableSchema::vaers_data()).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::MissingColumn { ref column, .. }) if column == KEY_COLUMN
        ));
    }

    #[test]
    fn duplicate_key() {
        let raw = "VAERS_ID,VAX_NAME\n5,A\n5,B\n";
        let err = read_table(raw.as_bytes(), &TableSchema::vaers_vax()).unwrap_err();
        assert!(matches!(
            err,
            Error::Schema(SchemaError::DuplicateKey { key: 5, .. })
        ));
    }

    #[test]
    fn non_integer_key() {
        let raw = "VAERS_ID,VAX_NAME\nabc,A\n";
        let err = read_table(raw.as_bytes(), &TableSchema::vaers_vax()).unwrap_err();
        assert!(matches!(err, Error::Schema(SchemaError::InvalidKey { .. })));
    }

    fn sample_itemsets() -> FrequentItemsets {
        FrequentItemsets::new(
            vec!["CA".to_string(), "Died".to_string()],
            4,
            hashmap! { vec![0] => 4, vec![1] => 2, vec![0, 1] => 2 },
        )
    }

    #[test]
    fn writes_itemsets() {
        let mut out = Vec::new();
        write_frequent_itemsets(&mut out, &sample_itemsets()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "support,itemsets\n1,\"[\"\"CA\"\"]\"\n0.5,\"[\"\"Died\"\"]\"\n0.5,\"[\"\"CA\"\",\"\"Died\"\"]\"\n"
        );
    }

    #[test]
    fn writes_rules_with_infinite_conviction() {
        let itemsets = sample_itemsets();
        let rules = vec![AssociationRule {
            antecedent: vec![1],
            consequent: vec![0],
            metrics: RuleMetrics::new(0.5, 1.0, 0.5),
        }];

        let mut out = Vec::new();
        write_association_rules(&mut out, &rules, &itemsets).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(RULE_HEADER.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("\"[\"\"Died\"\"]\",\"[\"\"CA\"\"]\",0.5,1,0.5,1,1,0,inf")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_tables_still_have_headers() {
        let itemsets = FrequentItemsets::empty(Vec::new(), 0);

        let mut out = Vec::new();
        write_frequent_itemsets(&mut out, &itemsets).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "support,itemsets\n");

        let mut out = Vec::new();
        write_association_rules(&mut out, &[], &itemsets).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", RULE_HEADER.join(",")));
    }
}
