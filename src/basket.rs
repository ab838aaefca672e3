//! Conversion of merged VAERS rows into baskets of categorical tokens.
//!
//! The conversion is driven by a [`BasketSchema`]: an ordered table of
//! `(column, transform, omit-when-missing)` rules. Each rule contributes at
//! most one token, in table order.
use rayon::prelude::*;

use crate::error::SchemaError;
use crate::table::{Table, Value};
use crate::types::Basket;

pub const FLAG_MARKER: &str = "Y";

pub const FEMALE: &str = "Female";
pub const MALE: &str = "Male";
pub const UNKNOWN_SEX: &str = "Unknown Sex";

/// Lower bounds of the age groups after the first, in years.
pub const AGE_GROUP_BOUNDS: [f64; 8] = [3.0, 6.0, 14.0, 19.0, 34.0, 49.0, 65.0, 79.0];
pub const AGE_GROUP_LABELS: [&str; 9] = [
    "0-2", "3-5", "6-13", "14-18", "19-33", "34-48", "49-64", "65-78", "79+",
];

/// Boolean VAERS columns and the token emitted when they are set.
pub const FLAG_FIELDS: [(&str, &str); 9] = [
    ("DIED", "Died"),
    ("L_THREAT", "Life-threatening illness"),
    ("ER_VISIT", "Emergency room visit"),
    ("HOSPITAL", "Hospitalized"),
    ("X_STAY", "Prolongation of existing hospitalization"),
    ("DISABLE", "Disability"),
    ("RECOVD", "Recovered"),
    ("BIRTH_DEFECT", "Birth defect"),
    ("OFC_VISIT", "Doctor or other healthcare provider office visit"),
];

static MISSING: Value = Value::Missing;

pub const SYMPTOM_FIELDS: [&str; 5] = ["SYMPTOM1", "SYMPTOM2", "SYMPTOM3", "SYMPTOM4", "SYMPTOM5"];

/// Fixed, ordered age ranges. A value belongs to the first group whose upper
/// bound it is below; bounds themselves belong to the upper group.
#[derive(Clone, Debug, PartialEq)]
pub struct AgeGroups {
    bounds: Vec<f64>,
    labels: Vec<String>,
}

impl AgeGroups {
    /// `labels` must have exactly one more entry than `bounds`, and `bounds`
    /// must be ascending.
    pub fn new(bounds: Vec<f64>, labels: Vec<String>) -> Option<Self> {
        let ascending = bounds.windows(2).all(|w| w[0] < w[1]);
        if labels.len() == bounds.len() + 1 && ascending {
            Some(Self { bounds, labels })
        } else {
            None
        }
    }

    pub fn label(&self, age: f64) -> &str {
        let group = self.bounds.partition_point(|&bound| bound <= age);
        &self.labels[group]
    }
}

impl Default for AgeGroups {
    fn default() -> Self {
        Self {
            bounds: AGE_GROUP_BOUNDS.to_vec(),
            labels: AGE_GROUP_LABELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// How a field value becomes a token.
#[derive(Clone, Debug, PartialEq)]
pub enum Transform {
    /// The value itself.
    PassThrough,
    /// The age group containing the numeric value.
    AgeGroup,
    /// `"F"` / `"M"`, anything else is unknown.
    Sex,
    /// `label` when the value equals the flag marker.
    Flag { label: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldRule {
    pub column: String,
    pub transform: Transform,
    /// Skip the field entirely when its value is missing.
    pub omit_when_missing: bool,
}

impl FieldRule {
    pub fn new(column: &str, transform: Transform) -> Self {
        Self {
            column: column.to_string(),
            transform,
            omit_when_missing: true,
        }
    }

    pub fn always(column: &str, transform: Transform) -> Self {
        Self {
            omit_when_missing: false,
            ..Self::new(column, transform)
        }
    }
}

/// Immutable description of how rows become baskets.
#[derive(Clone, Debug, PartialEq)]
pub struct BasketSchema {
    pub fields: Vec<FieldRule>,
    pub age_groups: AgeGroups,
    pub flag_marker: String,
}

impl BasketSchema {
    /// Region, age group, sex, the nine outcome flags, vaccine name and up to
    /// five symptoms.
    ///
    /// Sex is the one field that is never omitted: a missing or unrecognised
    /// value still yields "Unknown Sex".
    ///
    /// `OFC_VISIT` is the ninth flag, on top of the eight outcome flags
    /// (`DIED` through `BIRTH_DEFECT`). Reports with `OFC_VISIT = Y` gain a
    /// "Doctor or other healthcare provider office visit" token; drop the
    /// last entry of [`FLAG_FIELDS`] from `fields` to mine without it.
    pub fn vaers() -> Self {
        let mut fields = vec![
            FieldRule::new("STATE", Transform::PassThrough),
            FieldRule::new("AGE_YRS", Transform::AgeGroup),
            FieldRule::always("SEX", Transform::Sex),
        ];
        fields.extend(FLAG_FIELDS.iter().map(|&(column, label)| {
            FieldRule::new(
                column,
                Transform::Flag {
                    label: label.to_string(),
                },
            )
        }));
        fields.push(FieldRule::new("VAX_NAME", Transform::PassThrough));
        fields.extend(
            SYMPTOM_FIELDS
                .iter()
                .map(|&column| FieldRule::new(column, Transform::PassThrough)),
        );

        Self {
            fields,
            age_groups: AgeGroups::default(),
            flag_marker: FLAG_MARKER.to_string(),
        }
    }

    fn apply(&self, rule: &FieldRule, value: &Value) -> Option<String> {
        if rule.omit_when_missing && value.is_missing() {
            return None;
        }

        match &rule.transform {
            Transform::PassThrough => value.to_token(),
            Transform::AgeGroup => value
                .as_f64()
                .map(|age| self.age_groups.label(age).to_string()),
            Transform::Sex => Some(convert_to_sex_group(value).to_string()),
            Transform::Flag { label } => match value.as_str() {
                Some(raw) if raw == self.flag_marker => Some(label.clone()),
                _ => None,
            },
        }
    }
}

impl Default for BasketSchema {
    fn default() -> Self {
        Self::vaers()
    }
}

pub fn convert_to_sex_group(value: &Value) -> &'static str {
    match value.as_str() {
        Some("F") => FEMALE,
        Some("M") => MALE,
        _ => UNKNOWN_SEX,
    }
}

/// A [`BasketSchema`] bound to the column layout of one merged table.
#[derive(Clone, Debug)]
pub struct BasketBuilder {
    schema: BasketSchema,
    positions: Vec<usize>,
}

impl BasketBuilder {
    /// Fails when a column named by the schema is absent from `table`.
    pub fn new(schema: BasketSchema, table: &Table) -> Result<Self, SchemaError> {
        let positions = schema
            .fields
            .iter()
            .map(|rule| table.column_index(&rule.column))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, positions })
    }

    /// `row` is laid out like the table the builder was bound to.
    pub fn build(&self, row: &[Value]) -> Basket {
        self.schema
            .fields
            .iter()
            .zip(&self.positions)
            .filter_map(|(rule, &position)| {
                let value = row.get(position).unwrap_or(&MISSING);
                self.schema.apply(rule, value)
            })
            .collect()
    }

    /// One basket per row, in key order.
    pub fn build_all(&self, table: &Table) -> Vec<Basket> {
        let rows: Vec<&[Value]> = table.rows().map(|(_, row)| row).collect();
        rows.par_iter().map(|row| self.build(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vaers_table() -> Table {
        let columns = BasketSchema::vaers()
            .fields
            .iter()
            .map(|rule| rule.column.clone())
            .collect();
        Table::new("merged", "VAERS_ID", columns)
    }

    fn row(pairs: &[(&str, Value)]) -> Vec<Value> {
        let table = vaers_table();
        let mut values = vec![Value::Missing; table.columns().len()];
        for (column, value) in pairs {
            values[table.column_index(column).unwrap()] = value.clone();
        }
        values
    }

    fn builder() -> BasketBuilder {
        BasketBuilder::new(BasketSchema::vaers(), &vaers_table()).unwrap()
    }

    #[test]
    fn full_row_in_field_order() {
        let basket = builder().build(&row(&[
            ("SYMPTOM2", Value::from("Headache")),
            ("STATE", Value::from("CA")),
            ("AGE_YRS", Value::from(42.0)),
            ("SEX", Value::from("F")),
            ("DIED", Value::from("Y")),
            ("HOSPITAL", Value::from("Y")),
            ("OFC_VISIT", Value::from("Y")),
            ("VAX_NAME", Value::from("COVID19 (COVID19 (MODERNA))")),
            ("SYMPTOM1", Value::from("Chills")),
        ]));

        assert_eq!(
            basket,
            vec![
                "CA",
                "34-48",
                "Female",
                "Died",
                "Hospitalized",
                "Doctor or other healthcare provider office visit",
                "COVID19 (COVID19 (MODERNA))",
                "Chills",
                "Headache",
            ]
        );
    }

    #[test]
    fn office_visit_is_the_ninth_flag() {
        let flags: Vec<&str> = FLAG_FIELDS.iter().map(|&(column, _)| column).collect();
        assert_eq!(flags.len(), 9);
        assert_eq!(flags[8], "OFC_VISIT");

        let mut schema = BasketSchema::vaers();
        schema.fields.retain(|rule| rule.column != "OFC_VISIT");
        let without = BasketBuilder::new(schema, &vaers_table()).unwrap();

        let values = row(&[("OFC_VISIT", Value::from("Y")), ("SEX", Value::from("M"))]);
        assert_eq!(
            builder().build(&values),
            vec!["Male", "Doctor or other healthcare provider office visit"]
        );
        assert_eq!(without.build(&values), vec!["Male"]);
    }

    #[test]
    fn missing_fields_are_omitted_except_sex() {
        let basket = builder().build(&row(&[]));
        assert_eq!(basket, vec![UNKNOWN_SEX]);
    }

    #[test]
    fn sex_mapping() {
        assert_eq!(convert_to_sex_group(&Value::from("F")), FEMALE);
        assert_eq!(convert_to_sex_group(&Value::from("M")), MALE);
        assert_eq!(convert_to_sex_group(&Value::from("U")), UNKNOWN_SEX);
        assert_eq!(convert_to_sex_group(&Value::from("f")), UNKNOWN_SEX);
        assert_eq!(convert_to_sex_group(&Value::Missing), UNKNOWN_SEX);
    }

    #[test]
    fn flags_need_the_exact_marker() {
        let basket = builder().build(&row(&[
            ("DIED", Value::from("N")),
            ("L_THREAT", Value::from("y")),
            ("ER_VISIT", Value::from("Y")),
            ("RECOVD", Value::from("U")),
        ]));
        assert_eq!(basket, vec![UNKNOWN_SEX, "Emergency room visit"]);
    }

    #[test]
    fn age_group_boundaries_belong_to_upper_group() {
        let groups = AgeGroups::default();
        let cases = [
            (0.0, "0-2"),
            (2.99, "0-2"),
            (3.0, "3-5"),
            (5.5, "3-5"),
            (6.0, "6-13"),
            (14.0, "14-18"),
            (19.0, "19-33"),
            (34.0, "34-48"),
            (49.0, "49-64"),
            (64.9, "49-64"),
            (65.0, "65-78"),
            (79.0, "79+"),
            (120.0, "79+"),
        ];
        for (age, label) in cases {
            assert_eq!(groups.label(age), label, "age {}", age);
        }
    }

    #[test]
    fn nan_age_is_omitted() {
        let basket = builder().build(&row(&[("AGE_YRS", Value::from(f64::NAN))]));
        assert_eq!(basket, vec![UNKNOWN_SEX]);
    }

    #[test]
    fn numeric_text_age_is_binned() {
        let basket = builder().build(&row(&[("AGE_YRS", Value::from("0.5"))]));
        assert_eq!(basket, vec!["0-2", UNKNOWN_SEX]);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let table = Table::new("merged", "VAERS_ID", vec!["STATE".to_string()]);
        let err = BasketBuilder::new(BasketSchema::vaers(), &table).unwrap_err();
        assert_eq!(
            err,
            SchemaError::MissingColumn {
                table: "merged".to_string(),
                column: "AGE_YRS".to_string()
            }
        );
    }

    #[test]
    fn build_all_follows_key_order() {
        let mut table = vaers_table();
        let width = table.columns().len();
        let state = table.column_index("STATE").unwrap();
        for (key, name) in [(20, "TX"), (10, "CA")] {
            let mut values = vec![Value::Missing; width];
            values[state] = Value::from(name);
            table.insert(key, values).unwrap();
        }

        let baskets = builder().build_all(&table);
        assert_eq!(baskets, vec![vec!["CA", UNKNOWN_SEX], vec!["TX", UNKNOWN_SEX]]);
    }

    #[test]
    fn invalid_age_groups_are_rejected() {
        assert!(AgeGroups::new(vec![1.0, 2.0], vec!["a".into(), "b".into()]).is_none());
        assert!(AgeGroups::new(vec![2.0, 1.0], vec!["a".into(), "b".into(), "c".into()]).is_none());
        let groups = AgeGroups::new(vec![18.0], vec!["minor".into(), "adult".into()]).unwrap();
        assert_eq!(groups.label(18.0), "adult");
    }
}
