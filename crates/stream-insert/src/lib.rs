//! Row staging and partial-failure mapping for streaming bulk inserts.
//!
//! This crate turns caller rows into an `insertAll`-style batch request and
//! turns the server's per-row failure report back into errors the caller
//! can act on. The network round trip itself is left to a [`Transport`].
//!
//! # Overview
//!
//! One insert call runs three steps in order:
//! - **Normalize**: flexible input ([`Rows`]) becomes an ordered list of
//!   [`ValueSaver`]s; bare records are wrapped in [`StructSaver`]s with an
//!   inferred [`Schema`]
//! - **Build**: each saver is saved and given its insert id (dedup token),
//!   producing an [`InsertAllRequest`]
//! - **Map**: reported failures are matched to submitted rows by position,
//!   producing a [`PutMultiError`]
//!
//! # Quick Start
//!
//! ```rust
//! use stream_insert::{
//!     Inserter, InsertAllRequest, InsertAllResponse, InsertOptions, Rows, Transport,
//!     TransportError,
//! };
//! use stream_insert::model::{FieldKind, FieldType, Record, RecordShape, Value};
//!
//! #[derive(Debug)]
//! struct Visit {
//!     page: String,
//!     millis: i64,
//! }
//!
//! impl Record for Visit {
//!     fn shape(&self) -> RecordShape {
//!         RecordShape::new("Visit")
//!             .field("page", FieldKind::Scalar(FieldType::String))
//!             .field("millis", FieldKind::Scalar(FieldType::Int64))
//!     }
//!
//!     fn values(&self) -> Vec<Value> {
//!         vec![self.page.clone().into(), self.millis.into()]
//!     }
//! }
//!
//! struct AcceptAll;
//!
//! impl Transport for AcceptAll {
//!     fn insert_all(&self, _: &InsertAllRequest) -> Result<InsertAllResponse, TransportError> {
//!         Ok(InsertAllResponse::default())
//!     }
//! }
//!
//! let inserter = Inserter::new(AcceptAll).with_options(InsertOptions::new().skip_invalid_rows(true));
//! inserter
//!     .put(Rows::records([
//!         Visit { page: "/".into(), millis: 12 },
//!         Visit { page: "/about".into(), millis: 40 },
//!     ]))
//!     .unwrap();
//! ```
//!
//! # Modules
//!
//! - [`model`]: Values, rows, record shapes and schemas
//! - [`saver`]: The `ValueSaver` capability and insert ids
//! - [`normalize`]: Input classification
//! - [`request`]: Request building and insert id generation
//! - [`response`]: Response decoding and failure mapping
//! - [`inserter`]: The caller-facing insert call
//! - [`error`]: Error types
//!
//! # Insert ids
//!
//! A saver may ask for an automatic id (empty token), no deduplication
//! ([`NO_DEDUPE_ID`]) or an explicit token. Automatic ids come from the
//! inserter's [`IdGenerator`] and are the ids reported back on failure.

pub mod error;
pub mod inserter;
pub mod model;
pub mod normalize;
pub mod request;
pub mod response;
pub mod saver;
pub mod util;

// Re-export commonly used types at crate root
pub use error::{
    ErrorCause, MultiError, NormalizeError, ProtocolError, PutError, PutMultiError,
    RowInsertionError, SaveError, SchemaError, TransportError,
};
pub use inserter::{Inserter, Transport};
pub use model::{FieldSchema, FieldType, Record, RecordShape, Row, Schema, Value};
pub use normalize::{normalize, BoxedSaver, Rows};
pub use request::{build_request, IdGenerator, InsertAllRequest, InsertOptions, InsertRow, RandomIds};
pub use response::{map_insert_errors, ErrorProto, InsertAllResponse, InsertErrors};
pub use saver::{InsertId, RowSaver, StructSaver, ValueSaver, ValuesSaver, NO_DEDUPE_ID};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
