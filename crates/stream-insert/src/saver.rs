//! The `ValueSaver` capability and its implementations.
//!
//! A saver produces one row plus the insert id (dedup token) that should
//! accompany it. The request builder treats every saver the same way.

use std::fmt;
use std::sync::Arc;

use crate::error::SaveError;
use crate::model::{infer_schema, FieldSchema, FieldType, Record, Row, Schema, Value};

/// Token that explicitly disables deduplication for a row.
pub const NO_DEDUPE_ID: &str = "NoDedupeID";

/// The dedup token a saver asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum InsertId {
    /// Let the builder assign a random token.
    #[default]
    Auto,
    /// Send the row with no token at all.
    NoDedupe,
    /// Send exactly this token.
    Explicit(String),
}

impl InsertId {
    /// Interprets a raw token: `""` is `Auto`, [`NO_DEDUPE_ID`] is `NoDedupe`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "" => InsertId::Auto,
            NO_DEDUPE_ID => InsertId::NoDedupe,
            other => InsertId::Explicit(other.to_string()),
        }
    }

    /// Returns the raw token form (inverse of [`InsertId::from_token`]).
    pub fn as_token(&self) -> &str {
        match self {
            InsertId::Auto => "",
            InsertId::NoDedupe => NO_DEDUPE_ID,
            InsertId::Explicit(token) => token,
        }
    }
}

impl From<&str> for InsertId {
    fn from(token: &str) -> Self {
        InsertId::from_token(token)
    }
}

impl From<String> for InsertId {
    fn from(token: String) -> Self {
        match InsertId::from_token(&token) {
            InsertId::Explicit(_) => InsertId::Explicit(token),
            classified => classified,
        }
    }
}

impl fmt::Display for InsertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Something that can be turned into one row of an insert request.
pub trait ValueSaver: fmt::Debug {
    /// Returns the row and the insert id to send it with.
    ///
    /// An error aborts the whole batch.
    fn save(&self) -> Result<(Row, InsertId), SaveError>;
}

impl<T: ValueSaver + ?Sized> ValueSaver for &T {
    fn save(&self) -> Result<(Row, InsertId), SaveError> {
        (**self).save()
    }
}

impl<T: ValueSaver + ?Sized> ValueSaver for Box<T> {
    fn save(&self) -> Result<(Row, InsertId), SaveError> {
        (**self).save()
    }
}

// =============================================================================
// SAVERS
// =============================================================================

/// A row the caller has already built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSaver {
    pub row: Row,
    pub insert_id: InsertId,
}

impl RowSaver {
    pub fn new(row: Row) -> Self {
        Self {
            row,
            insert_id: InsertId::Auto,
        }
    }

    /// Sets the insert id.
    pub fn insert_id(mut self, insert_id: impl Into<InsertId>) -> Self {
        self.insert_id = insert_id.into();
        self
    }
}

impl ValueSaver for RowSaver {
    fn save(&self) -> Result<(Row, InsertId), SaveError> {
        for (name, value) in &self.row {
            check_range(name, value)?;
        }
        Ok((self.row.clone(), self.insert_id.clone()))
    }
}

/// Saves a [`Record`] using a schema inferred from its shape.
///
/// The schema may be supplied up front; otherwise it is inferred when the
/// saver is normalized, or at the latest when it is saved.
#[derive(Debug, Default)]
pub struct StructSaver<'a> {
    pub record: Option<Box<dyn Record + 'a>>,
    pub schema: Option<Arc<Schema>>,
    pub insert_id: InsertId,
}

impl<'a> StructSaver<'a> {
    /// Creates a saver for `record` with no schema and an automatic insert id.
    pub fn new(record: impl Record + 'a) -> Self {
        Self {
            record: Some(Box::new(record)),
            schema: None,
            insert_id: InsertId::Auto,
        }
    }

    /// Sets the insert id.
    pub fn insert_id(mut self, insert_id: impl Into<InsertId>) -> Self {
        self.insert_id = insert_id.into();
        self
    }

    /// Sets the schema, skipping inference.
    pub fn schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl ValueSaver for StructSaver<'_> {
    fn save(&self) -> Result<(Row, InsertId), SaveError> {
        let record = self.record.as_ref().ok_or(SaveError::MissingRecord)?;
        let row = match &self.schema {
            Some(schema) => values_to_row(schema, record.values())?,
            None => values_to_row(&infer_schema(&record.shape())?, record.values())?,
        };
        Ok((row, self.insert_id.clone()))
    }
}

/// Saves a positional list of values against an explicit schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesSaver {
    pub schema: Arc<Schema>,
    pub insert_id: InsertId,
    /// One value per schema field, in schema order.
    pub values: Vec<Value>,
}

impl ValuesSaver {
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Self {
        Self {
            schema,
            insert_id: InsertId::Auto,
            values,
        }
    }

    /// Sets the insert id.
    pub fn insert_id(mut self, insert_id: impl Into<InsertId>) -> Self {
        self.insert_id = insert_id.into();
        self
    }
}

impl ValueSaver for ValuesSaver {
    fn save(&self) -> Result<(Row, InsertId), SaveError> {
        let row = values_to_row(&self.schema, self.values.clone())?;
        Ok((row, self.insert_id.clone()))
    }
}

// =============================================================================
// CONVERSION
// =============================================================================

/// Zips positional values with schema fields into a row.
///
/// Null repeated fields are left out of the row; null nullable fields are
/// kept as explicit nulls.
pub fn values_to_row(schema: &Schema, values: Vec<Value>) -> Result<Row, SaveError> {
    if values.len() != schema.len() {
        return Err(SaveError::FieldCountMismatch {
            expected: schema.len(),
            actual: values.len(),
        });
    }

    let mut row = Row::new();
    for (field, value) in schema.fields().iter().zip(values) {
        if let Some(value) = convert_field(field, value)? {
            row.insert(field.name.clone(), value);
        }
    }
    Ok(row)
}

fn convert_field(field: &FieldSchema, value: Value) -> Result<Option<Value>, SaveError> {
    if field.repeated {
        return match value {
            Value::Null => Ok(None),
            Value::Array(items) => {
                let items = items
                    .into_iter()
                    .map(|item| convert_element(field, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Value::Array(items)))
            }
            other => Err(SaveError::ExpectedArray {
                field: field.name.clone(),
                found: other.kind_name(),
            }),
        };
    }

    match value {
        Value::Null if field.required => Err(SaveError::RequiredFieldNull {
            field: field.name.clone(),
        }),
        Value::Null => Ok(Some(Value::Null)),
        other => convert_element(field, other).map(Some),
    }
}

/// Converts one non-null value of a field (an element, for repeated fields).
fn convert_element(field: &FieldSchema, value: Value) -> Result<Value, SaveError> {
    match value {
        Value::Null => Err(SaveError::RequiredFieldNull {
            field: field.name.clone(),
        }),
        Value::Record(nested) if field.field_type == FieldType::Record => {
            convert_nested(&field.fields, nested).map(Value::Record)
        }
        other if other.field_type() == Some(field.field_type) => match other.validate() {
            Some(reason) => Err(SaveError::OutOfRange {
                field: field.name.clone(),
                reason,
            }),
            None => Ok(other),
        },
        other => Err(SaveError::TypeMismatch {
            field: field.name.clone(),
            expected: field.field_type,
            found: other.kind_name(),
        }),
    }
}

/// Range-checks a schemaless value, descending into arrays and records.
fn check_range(field: &str, value: &Value) -> Result<(), SaveError> {
    match value {
        Value::Array(items) => items.iter().try_for_each(|item| check_range(field, item)),
        Value::Record(row) => row.iter().try_for_each(|(name, v)| check_range(name, v)),
        other => match other.validate() {
            Some(reason) => Err(SaveError::OutOfRange {
                field: field.to_string(),
                reason,
            }),
            None => Ok(()),
        },
    }
}

fn convert_nested(schema: &Schema, mut nested: Row) -> Result<Row, SaveError> {
    if let Some(unknown) = nested.keys().find(|name| schema.field(name).is_none()) {
        return Err(SaveError::UnknownField {
            field: unknown.clone(),
        });
    }

    let mut row = Row::new();
    for field in schema.fields() {
        let value = nested.remove(&field.name).unwrap_or(Value::Null);
        if let Some(value) = convert_field(field, value)? {
            row.insert(field.name.clone(), value);
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldKind, RecordShape};

    #[derive(Debug, Clone)]
    struct Item {
        name: String,
        qty: Option<i64>,
        tags: Vec<String>,
    }

    impl Record for Item {
        fn shape(&self) -> RecordShape {
            RecordShape::new("Item")
                .field("name", FieldKind::Scalar(FieldType::String))
                .field("qty", FieldKind::optional(FieldKind::Scalar(FieldType::Int64)))
                .field("tags", FieldKind::repeated(FieldKind::Scalar(FieldType::String)))
        }

        fn values(&self) -> Vec<Value> {
            vec![
                self.name.clone().into(),
                self.qty.into(),
                Value::Array(self.tags.iter().map(|t| Value::from(t.as_str())).collect()),
            ]
        }
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_insert_id_from_token() {
        assert_eq!(InsertId::from_token(""), InsertId::Auto);
        assert_eq!(InsertId::from_token(NO_DEDUPE_ID), InsertId::NoDedupe);
        assert_eq!(InsertId::from("abc"), InsertId::Explicit("abc".into()));
        assert_eq!(InsertId::from(String::new()), InsertId::Auto);
        assert_eq!(InsertId::from(NO_DEDUPE_ID.to_string()), InsertId::NoDedupe);
        assert_eq!(InsertId::from("k".to_string()), InsertId::Explicit("k".into()));
        assert_eq!(InsertId::NoDedupe.as_token(), NO_DEDUPE_ID);
        assert_eq!(InsertId::Explicit("k".into()).to_string(), "k");
    }

    #[test]
    fn test_row_saver() {
        let saver = RowSaver::new(row(&[("one", Value::Int64(1))])).insert_id("a");
        let (saved, id) = saver.save().unwrap();
        assert_eq!(saved, row(&[("one", Value::Int64(1))]));
        assert_eq!(id, InsertId::Explicit("a".into()));
    }

    #[test]
    fn test_struct_saver_infers_schema_lazily() {
        let item = Item {
            name: "bolt".into(),
            qty: None,
            tags: vec!["m4".into()],
        };
        let (saved, id) = StructSaver::new(item).insert_id("foo").save().unwrap();
        assert_eq!(
            saved,
            row(&[
                ("name", Value::from("bolt")),
                ("qty", Value::Null),
                ("tags", Value::Array(vec![Value::from("m4")])),
            ])
        );
        assert_eq!(id, InsertId::Explicit("foo".into()));
    }

    #[test]
    fn test_struct_saver_without_record() {
        let saver = StructSaver::default();
        assert_eq!(saver.save().unwrap_err(), SaveError::MissingRecord);
    }

    #[test]
    fn test_struct_saver_propagates_schema_error() {
        #[derive(Debug)]
        struct Bad;
        impl Record for Bad {
            fn shape(&self) -> RecordShape {
                RecordShape::new("Bad").field("m", FieldKind::Unsupported("map"))
            }
            fn values(&self) -> Vec<Value> {
                vec![Value::Null]
            }
        }
        assert!(matches!(
            StructSaver::new(Bad).save(),
            Err(SaveError::Schema(_))
        ));
    }

    #[test]
    fn test_values_saver() {
        let schema = Arc::new(Schema::new(vec![
            FieldSchema::new("id", FieldType::Int64),
            FieldSchema::new("note", FieldType::String).nullable(),
        ]));
        let saver = ValuesSaver::new(Arc::clone(&schema), vec![Value::Int64(7), Value::Null]);
        let (saved, id) = saver.save().unwrap();
        assert_eq!(saved, row(&[("id", Value::Int64(7)), ("note", Value::Null)]));
        assert_eq!(id, InsertId::Auto);

        let short = ValuesSaver::new(schema, vec![Value::Int64(7)]);
        assert_eq!(
            short.save().unwrap_err(),
            SaveError::FieldCountMismatch { expected: 2, actual: 1 }
        );
    }

    #[test]
    fn test_conversion_errors() {
        let schema = Schema::new(vec![
            FieldSchema::new("n", FieldType::Int64),
            FieldSchema::new("xs", FieldType::Int64).repeated(),
        ]);

        let err = values_to_row(&schema, vec![Value::Null, Value::Null]).unwrap_err();
        assert!(matches!(err, SaveError::RequiredFieldNull { .. }));

        let err = values_to_row(&schema, vec![Value::from("x"), Value::Null]).unwrap_err();
        assert!(matches!(
            err,
            SaveError::TypeMismatch { expected: FieldType::Int64, found: "STRING", .. }
        ));

        let err = values_to_row(&schema, vec![Value::Int64(1), Value::Int64(2)]).unwrap_err();
        assert!(matches!(err, SaveError::ExpectedArray { .. }));

        let ok = values_to_row(&schema, vec![Value::Int64(1), Value::Null]).unwrap();
        assert!(!ok.contains_key("xs"));
    }

    #[test]
    fn test_out_of_range_temporal_values_fail_to_save() {
        let schema = Arc::new(Schema::new(vec![FieldSchema::new("t", FieldType::Time)]));

        let late = ValuesSaver::new(Arc::clone(&schema), vec![Value::Time { time_us: 86_405_000_000 }]);
        assert!(matches!(
            late.save().unwrap_err(),
            SaveError::OutOfRange { ref field, .. } if field == "t"
        ));
        let negative = ValuesSaver::new(Arc::clone(&schema), vec![Value::Time { time_us: -1 }]);
        assert!(matches!(negative.save(), Err(SaveError::OutOfRange { .. })));

        let noon = ValuesSaver::new(schema, vec![Value::Time { time_us: 43_200_000_000 }]);
        let (saved, _) = noon.save().unwrap();
        assert_eq!(serde_json::to_value(&saved).unwrap(), serde_json::json!({"t": "12:00:00"}));

        let dates = Schema::new(vec![FieldSchema::new("d", FieldType::Date).repeated()]);
        let err = values_to_row(
            &dates,
            vec![Value::Array(vec![Value::Date { days: 0 }, Value::Date { days: i32::MAX }])],
        )
        .unwrap_err();
        assert!(matches!(err, SaveError::OutOfRange { .. }));

        let nested = row(&[("when", Value::Date { days: -800_000 })]);
        let raw = RowSaver::new(row(&[("inner", Value::Record(nested))]));
        assert_eq!(
            raw.save().unwrap_err(),
            SaveError::OutOfRange {
                field: "when".into(),
                reason: "DATE outside range [0001-01-01, 9999-12-31]",
            }
        );
    }

    #[test]
    fn test_nested_record_conversion() {
        let schema = Schema::new(vec![FieldSchema::record(
            "addr",
            Schema::new(vec![
                FieldSchema::new("city", FieldType::String),
                FieldSchema::new("zip", FieldType::String).nullable(),
            ]),
        )]);

        let nested = row(&[("city", Value::from("Oslo"))]);
        let saved = values_to_row(&schema, vec![Value::Record(nested)]).unwrap();
        assert_eq!(
            saved,
            row(&[(
                "addr",
                Value::Record(row(&[("city", Value::from("Oslo")), ("zip", Value::Null)]))
            )])
        );

        let unknown = row(&[("city", Value::from("Oslo")), ("planet", Value::from("Earth"))]);
        let err = values_to_row(&schema, vec![Value::Record(unknown)]).unwrap_err();
        assert_eq!(err, SaveError::UnknownField { field: "planet".into() });
    }

    #[test]
    fn test_custom_save_error() {
        #[derive(Debug)]
        struct Failing;
        impl ValueSaver for Failing {
            fn save(&self) -> Result<(Row, InsertId), SaveError> {
                Err(SaveError::custom("bang"))
            }
        }
        assert_eq!(Failing.save().unwrap_err().to_string(), "bang");
        let boxed: Box<dyn ValueSaver> = Box::new(Failing);
        assert!(boxed.save().is_err());
    }
}
