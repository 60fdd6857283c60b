//! Record shapes, table schemas, and schema inference.
//!
//! A [`RecordShape`] is the type-level description a structured value
//! gives of itself. [`infer_schema`] turns a shape into a [`Schema`] the
//! savers use to materialize rows.

use std::borrow::Cow;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::SchemaError;
use crate::model::FieldType;

// =============================================================================
// SHAPES
// =============================================================================

/// The declared kind of a single record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A non-record column type.
    Scalar(FieldType),
    /// A field that may be absent (`Option<T>`).
    Optional(Box<FieldKind>),
    /// A repeated field (`Vec<T>`).
    Repeated(Box<FieldKind>),
    /// A nested record.
    Record(RecordShape),
    /// A field type with no column mapping (maps, trait objects, ...).
    Unsupported(&'static str),
}

impl FieldKind {
    /// Shorthand for `FieldKind::Optional(Box::new(inner))`.
    pub fn optional(inner: FieldKind) -> Self {
        FieldKind::Optional(Box::new(inner))
    }

    /// Shorthand for `FieldKind::Repeated(Box::new(inner))`.
    pub fn repeated(inner: FieldKind) -> Self {
        FieldKind::Repeated(Box::new(inner))
    }
}

/// A named field within a record shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldShape {
    pub name: Cow<'static, str>,
    pub kind: FieldKind,
}

impl FieldShape {
    pub fn new(name: impl Into<Cow<'static, str>>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The type-level description of a structured value.
///
/// All values of one Rust type report equal shapes, which is what lets
/// inferred schemas be shared between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordShape {
    /// Type name, used in error messages.
    pub name: Cow<'static, str>,
    /// Fields in declaration order.
    pub fields: Vec<FieldShape>,
}

impl RecordShape {
    /// Creates an empty shape with the given type name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<Cow<'static, str>>, kind: FieldKind) -> Self {
        self.fields.push(FieldShape::new(name, kind));
        self
    }
}

// =============================================================================
// SCHEMA
// =============================================================================

/// A single column of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub field_type: FieldType,
    /// The field may not be null.
    pub required: bool,
    /// The field holds a list of values.
    pub repeated: bool,
    /// Sub-fields, for `FieldType::Record` only.
    pub fields: Schema,
}

impl FieldSchema {
    /// Creates a required, non-repeated field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
            repeated: false,
            fields: Schema::default(),
        }
    }

    /// Marks the field nullable.
    pub fn nullable(mut self) -> Self {
        self.required = false;
        self
    }

    /// Marks the field repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self.required = false;
        self
    }

    /// Creates a required record field with the given sub-schema.
    pub fn record(name: impl Into<String>, fields: Schema) -> Self {
        Self {
            fields,
            ..Self::new(name, FieldType::Record)
        }
    }
}

/// An ordered list of columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema(pub Vec<FieldSchema>);

impl Schema {
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.0.iter().find(|f| f.name == name)
    }
}

// =============================================================================
// INFERENCE
// =============================================================================

/// Infers a schema from a record shape.
///
/// Rules:
/// - scalar fields are required
/// - `Optional` makes a scalar or record field nullable
/// - `Repeated` makes a scalar or record field repeated
/// - nested records must have at least one field
/// - field names must be unique within a record
pub fn infer_schema(shape: &RecordShape) -> Result<Schema, SchemaError> {
    infer_record(shape, false)
}

fn infer_record(shape: &RecordShape, nested: bool) -> Result<Schema, SchemaError> {
    if nested && shape.fields.is_empty() {
        return Err(SchemaError::EmptyRecord {
            record: shape.name.to_string(),
        });
    }

    let mut seen = FxHashSet::with_capacity_and_hasher(shape.fields.len(), Default::default());
    let mut fields = Vec::with_capacity(shape.fields.len());
    for field in &shape.fields {
        if !seen.insert(field.name.as_ref()) {
            return Err(SchemaError::DuplicateField {
                record: shape.name.to_string(),
                field: field.name.to_string(),
            });
        }
        fields.push(infer_field(&field.name, &field.kind)?);
    }
    Ok(Schema(fields))
}

fn infer_field(name: &str, kind: &FieldKind) -> Result<FieldSchema, SchemaError> {
    match kind {
        FieldKind::Scalar(FieldType::Record) => Err(SchemaError::UnsupportedType {
            field: name.to_string(),
            kind: "record without shape",
        }),
        FieldKind::Scalar(t) => Ok(FieldSchema::new(name, *t)),
        FieldKind::Record(shape) => Ok(FieldSchema::record(name, infer_record(shape, true)?)),
        FieldKind::Optional(inner) => match inner.as_ref() {
            FieldKind::Optional(_) => Err(SchemaError::NestedOptional {
                field: name.to_string(),
            }),
            FieldKind::Repeated(_) => Err(SchemaError::OptionalRepeated {
                field: name.to_string(),
            }),
            other => Ok(infer_field(name, other)?.nullable()),
        },
        FieldKind::Repeated(inner) => match inner.as_ref() {
            FieldKind::Repeated(_) => Err(SchemaError::NestedRepeated {
                field: name.to_string(),
            }),
            FieldKind::Optional(_) => Err(SchemaError::RepeatedOptional {
                field: name.to_string(),
            }),
            other => Ok(infer_field(name, other)?.repeated()),
        },
        FieldKind::Unsupported(kind) => Err(SchemaError::UnsupportedType {
            field: name.to_string(),
            kind: *kind,
        }),
    }
}

/// Memoizes inferred schemas by record shape.
///
/// Scoped to a single normalization pass; nothing is shared between calls.
#[derive(Debug, Default)]
pub struct SchemaCache {
    schemas: FxHashMap<RecordShape, Arc<Schema>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema for `shape`, inferring it on first use.
    pub fn get_or_infer(&mut self, shape: RecordShape) -> Result<Arc<Schema>, SchemaError> {
        if let Some(schema) = self.schemas.get(&shape) {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(infer_schema(&shape)?);
        tracing::trace!(record = %shape.name, fields = schema.len(), "inferred schema");
        self.schemas.insert(shape, Arc::clone(&schema));
        Ok(schema)
    }

    /// Number of distinct shapes inferred so far.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
