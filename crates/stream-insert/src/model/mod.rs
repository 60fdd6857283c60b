//! Data model types for staged rows.
//!
//! This module contains the types a row is made of before it goes on the wire:
//! - Values (dynamically-typed field values) and rows
//! - Record shapes and the schemas inferred from them
//! - The `Record` capability for structured values

pub mod record;
pub mod schema;
pub mod value;

pub use record::Record;
pub use schema::{
    infer_schema, FieldKind, FieldSchema, FieldShape, RecordShape, Schema, SchemaCache,
};
pub use value::{FieldType, Row, Value};
