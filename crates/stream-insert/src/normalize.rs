//! Row normalization: flexible caller input to an ordered list of savers.
//!
//! Callers can hand an insert a single saver, a single record, a struct
//! saver, or a list mixing all three. [`normalize`] classifies the input
//! and returns savers in input order, wrapping bare records in
//! [`StructSaver`]s with an inferred schema.

use std::fmt;

use crate::error::{NormalizeError, SchemaError};
use crate::model::{Record, SchemaCache, Value};
use crate::saver::{StructSaver, ValueSaver};

/// A saver ready for the request builder.
pub type BoxedSaver<'a> = Box<dyn ValueSaver + 'a>;

/// Caller input to an insert, in any supported shape.
pub enum Rows<'a> {
    /// No rows.
    Null,
    /// A value that already knows how to save itself.
    Saver(BoxedSaver<'a>),
    /// A struct saver, possibly still lacking a schema or a record.
    Struct(StructSaver<'a>),
    /// A structured value to be wrapped in a `StructSaver`.
    Record(Box<dyn Record + 'a>),
    /// A bare value. Never a valid row.
    Scalar(Value),
    /// Several inputs, each classified on its own.
    List(Vec<Rows<'a>>),
}

impl<'a> Rows<'a> {
    pub fn saver(saver: impl ValueSaver + 'a) -> Self {
        Rows::Saver(Box::new(saver))
    }

    pub fn record(record: impl Record + 'a) -> Self {
        Rows::Record(Box::new(record))
    }

    /// A list of savers.
    pub fn savers<S: ValueSaver + 'a>(savers: impl IntoIterator<Item = S>) -> Self {
        Rows::List(savers.into_iter().map(Rows::saver).collect())
    }

    /// A list of records.
    pub fn records<R: Record + 'a>(records: impl IntoIterator<Item = R>) -> Self {
        Rows::List(records.into_iter().map(Rows::record).collect())
    }

    /// Short description of the input's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Rows::Null => "null",
            Rows::Saver(_) => "value saver",
            Rows::Struct(s) if s.record.is_none() => "struct saver without a record",
            Rows::Struct(_) => "struct saver",
            Rows::Record(_) => "record",
            Rows::Scalar(_) => "scalar",
            Rows::List(_) => "list",
        }
    }
}

impl fmt::Debug for Rows<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rows::Null => f.write_str("Null"),
            Rows::Saver(s) => f.debug_tuple("Saver").field(s).finish(),
            Rows::Struct(s) => f.debug_tuple("Struct").field(s).finish(),
            Rows::Record(r) => f.debug_tuple("Record").field(r).finish(),
            Rows::Scalar(v) => f.debug_tuple("Scalar").field(v).finish(),
            Rows::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

impl<'a> From<StructSaver<'a>> for Rows<'a> {
    fn from(saver: StructSaver<'a>) -> Self {
        Rows::Struct(saver)
    }
}

impl From<Value> for Rows<'_> {
    fn from(value: Value) -> Self {
        Rows::Scalar(value)
    }
}

impl<'a> From<Vec<Rows<'a>>> for Rows<'a> {
    fn from(items: Vec<Rows<'a>>) -> Self {
        Rows::List(items)
    }
}

impl<'a> From<Option<Rows<'a>>> for Rows<'a> {
    fn from(rows: Option<Rows<'a>>) -> Self {
        rows.unwrap_or(Rows::Null)
    }
}

/// Classifies `rows` into savers, preserving input order.
///
/// - `Null` and empty lists produce no savers
/// - savers pass through unchanged
/// - records become struct savers with an inferred schema
/// - struct savers get their schema filled in if it is missing
/// - lists are classified element by element; nested lists, nulls and
///   scalars inside a list fail with the element's position
///
/// Each distinct record shape is inferred at most once per call.
pub fn normalize<'a>(rows: Rows<'a>) -> Result<Vec<BoxedSaver<'a>>, NormalizeError> {
    let mut schemas = SchemaCache::new();
    let savers = match rows {
        Rows::Null => Vec::new(),
        Rows::List(items) => {
            let mut savers = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let found = item.kind_name();
                let saver = to_saver(item, &mut schemas).map_err(|source| {
                    NormalizeError::Schema {
                        position: Some(i),
                        source,
                    }
                })?;
                match saver {
                    Some(saver) => savers.push(saver),
                    None => {
                        return Err(NormalizeError::InvalidInputKind {
                            position: Some(i),
                            found,
                        });
                    }
                }
            }
            savers
        }
        single => {
            let found = single.kind_name();
            let saver = to_saver(single, &mut schemas).map_err(|source| {
                NormalizeError::Schema {
                    position: None,
                    source,
                }
            })?;
            match saver {
                Some(saver) => vec![saver],
                None => {
                    return Err(NormalizeError::InvalidInputKind {
                        position: None,
                        found,
                    });
                }
            }
        }
    };

    tracing::debug!(rows = savers.len(), schemas = schemas.len(), "normalized rows");
    Ok(savers)
}

/// Converts one non-list input into a saver.
///
/// Returns `Ok(None)` if the input is not a row on its own.
fn to_saver<'a>(
    rows: Rows<'a>,
    schemas: &mut SchemaCache,
) -> Result<Option<BoxedSaver<'a>>, SchemaError> {
    match rows {
        Rows::Saver(saver) => Ok(Some(saver)),
        Rows::Struct(StructSaver { record: None, .. }) => Ok(None),
        Rows::Struct(mut saver) => {
            if saver.schema.is_none() {
                if let Some(record) = &saver.record {
                    saver.schema = Some(schemas.get_or_infer(record.shape())?);
                }
            }
            Ok(Some(Box::new(saver)))
        }
        Rows::Record(record) => {
            let schema = schemas.get_or_infer(record.shape())?;
            Ok(Some(Box::new(StructSaver {
                record: Some(record),
                schema: Some(schema),
                insert_id: Default::default(),
            })))
        }
        Rows::Null | Rows::Scalar(_) | Rows::List(_) => Ok(None),
    }
}
