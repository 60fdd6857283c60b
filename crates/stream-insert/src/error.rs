//! Error types for row normalization, request building, and insert-error mapping.

use std::fmt;

use thiserror::Error;

use crate::model::FieldType;

/// Error reported by the transport collaborator. Passed through unchanged.
pub type TransportError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error during schema inference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field {field:?} has unsupported type: {kind}")]
    UnsupportedType { field: String, kind: &'static str },

    #[error("field {field:?} is a repeated field of repeated values")]
    NestedRepeated { field: String },

    #[error("field {field:?} is a repeated field of optional values")]
    RepeatedOptional { field: String },

    #[error("field {field:?} is an optional repeated field")]
    OptionalRepeated { field: String },

    #[error("field {field:?} is an optional of an optional")]
    NestedOptional { field: String },

    #[error("nested record {record} has no fields")]
    EmptyRecord { record: String },

    #[error("record {record} declares field {field:?} more than once")]
    DuplicateField { record: String, field: String },
}

/// Error while classifying caller input into savers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("{}", invalid_input_message(.position, .found))]
    InvalidInputKind {
        /// Position of the offending element when the input was a list.
        position: Option<usize>,
        found: &'static str,
    },

    #[error("{}", schema_failure_message(.position, .source))]
    Schema {
        /// Position of the offending element when the input was a list.
        position: Option<usize>,
        #[source]
        source: SchemaError,
    },
}

fn schema_failure_message(position: &Option<usize>, source: &SchemaError) -> String {
    match position {
        Some(i) => format!("schema inference failed for rows[{i}]: {source}"),
        None => format!("schema inference failed: {source}"),
    }
}

fn invalid_input_message(position: &Option<usize>, found: &str) -> String {
    match position {
        Some(i) => format!(
            "rows[{i}] is a {found}, which is not a value saver, struct saver or record"
        ),
        None => format!("{found} is not a value saver, struct saver, record, or list of them"),
    }
}

/// Error while a saver materializes its row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("struct saver has no record to save")]
    MissingRecord,

    #[error("row has {actual} values but schema has {expected} fields")]
    FieldCountMismatch { expected: usize, actual: usize },

    #[error("field {field:?}: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("field {field:?}: {reason}")]
    OutOfRange { field: String, reason: &'static str },

    #[error("field {field:?} is required but the value is null")]
    RequiredFieldNull { field: String },

    #[error("field {field:?} is repeated but the value is a {found}")]
    ExpectedArray { field: String, found: &'static str },

    #[error("nested record field {field:?} is not in the schema")]
    UnknownField { field: String },

    #[error("schema inference failed: {0}")]
    Schema(#[from] SchemaError),

    #[error("{message}")]
    Custom { message: String },
}

impl SaveError {
    /// Creates a saver-specific error with the given message.
    pub fn custom(message: impl fmt::Display) -> Self {
        SaveError::Custom {
            message: message.to_string(),
        }
    }
}

/// The server reported a failure that does not correspond to a submitted row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("internal error: unexpected row index: {index}")]
    UnexpectedRowIndex { index: i64 },
}

// =============================================================================
// PER-ROW FAILURES
// =============================================================================

/// One reason the server gave for rejecting a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{{Location: {location:?}; Message: {message:?}; Reason: {reason:?}}}")]
pub struct ErrorCause {
    /// Where the error occurred, if the server said (usually a field name).
    pub location: String,
    /// Human-readable description.
    pub message: String,
    /// Short machine-readable code, e.g. `"invalid"`.
    pub reason: String,
}

/// A list of causes, displayed as the first plus a count of the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiError(pub Vec<ErrorCause>);

impl MultiError {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorCause> {
        self.0.iter()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [] => f.write_str("(0 errors)"),
            [only] => write!(f, "{only}"),
            [first, _] => write!(f, "{first} (and 1 other error)"),
            [first, rest @ ..] => write!(f, "{first} (and {} other errors)", rest.len()),
        }
    }
}

impl std::error::Error for MultiError {}

/// A row the server refused to insert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("insertion of row [insertID: {insert_id:?}; insertIndex: {row_index}] failed with error: {errors}")]
pub struct RowInsertionError {
    /// The insert id that was transmitted for the row (empty if dedup was disabled).
    pub insert_id: String,
    /// 0-based position of the row in the submitted batch.
    pub row_index: usize,
    pub errors: MultiError,
}

/// The rows of a batch the server rejected, in the order it reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutMultiError(pub Vec<RowInsertionError>);

impl PutMultiError {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RowInsertionError> {
        self.0.iter()
    }

    /// Returns the failure for the given submitted row, if any.
    pub fn for_row(&self, row_index: usize) -> Option<&RowInsertionError> {
        self.0.iter().find(|e| e.row_index == row_index)
    }
}

impl<'a> IntoIterator for &'a PutMultiError {
    type Item = &'a RowInsertionError;
    type IntoIter = std::slice::Iter<'a, RowInsertionError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PutMultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.0.len() == 1 { "" } else { "s" };
        write!(f, "{} row insertion{plural} failed", self.0.len())?;
        if self.0.is_empty() {
            return Ok(());
        }

        f.write_str(" (")?;
        for (i, e) in self.0.iter().take(3).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{e}")?;
        }
        if self.0.len() > 3 {
            f.write_str(", ...")?;
        }
        f.write_str(")")
    }
}

impl std::error::Error for PutMultiError {}

// =============================================================================
// CALLER SURFACE
// =============================================================================

/// Everything an insert call can fail with.
#[derive(Debug, Error)]
pub enum PutError {
    #[error(transparent)]
    InvalidInput(#[from] NormalizeError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Some rows were rejected; the rest were accepted.
    #[error(transparent)]
    Rows(#[from] PutMultiError),
}

impl PutError {
    /// Returns the per-row failures if this is a partial failure.
    pub fn row_errors(&self) -> Option<&PutMultiError> {
        match self {
            PutError::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}
