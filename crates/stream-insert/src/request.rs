//! Insert request building.
//!
//! Saves every row in order, resolves its insert id, and assembles the
//! wire request. Row position in the request is the only thing that ties
//! a server-reported failure back to the caller's row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SaveError;
use crate::model::Row;
use crate::saver::{InsertId, ValueSaver};

// =============================================================================
// OPTIONS
// =============================================================================

/// Per-call uploader configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertOptions {
    /// Insert into `<table><suffix>`, creating it from the base table's
    /// schema if needed.
    pub template_suffix: Option<String>,

    /// Accept rows with values that do not match the table schema; the
    /// unknown values are dropped.
    pub ignore_unknown_values: bool,

    /// Insert the valid rows of a batch even if some rows are invalid.
    ///
    /// When false, one invalid row fails the whole batch.
    pub skip_invalid_rows: bool,
}

impl InsertOptions {
    /// Creates default options: no suffix, strict values, all-or-nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.template_suffix = Some(suffix.into());
        self
    }

    pub fn ignore_unknown_values(mut self, ignore: bool) -> Self {
        self.ignore_unknown_values = ignore;
        self
    }

    pub fn skip_invalid_rows(mut self, skip: bool) -> Self {
        self.skip_invalid_rows = skip;
        self
    }
}

// =============================================================================
// INSERT IDS
// =============================================================================

/// Source of insert ids for rows that did not bring their own.
///
/// Ids only need to be practically unique. Any `Fn() -> String` closure is
/// a generator, which is how tests get deterministic ids.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// Random UUIDv4 ids in simple (32 hex digit) form.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

// =============================================================================
// WIRE REQUEST
// =============================================================================

/// One row of an insert request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertRow {
    /// Dedup token; empty means the row is not deduplicated.
    #[serde(rename = "insertId", skip_serializing_if = "String::is_empty")]
    pub insert_id: String,
    pub json: Row,
}

/// A batch insert request, rows in caller order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAllRequest {
    pub rows: Vec<InsertRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_suffix: Option<String>,
    #[serde(skip_serializing_if = "is_false")]
    pub skip_invalid_rows: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub ignore_unknown_values: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl InsertAllRequest {
    /// The insert ids that were assigned, by row position.
    pub fn insert_ids(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.insert_id.as_str())
    }

    /// Encodes the request as JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Resolves the token a saver asked for into the token sent on the wire.
fn wire_insert_id(insert_id: InsertId, ids: &dyn IdGenerator) -> String {
    match insert_id {
        InsertId::NoDedupe => String::new(),
        InsertId::Auto => ids.generate(),
        InsertId::Explicit(token) => token,
    }
}

/// Builds an insert request from savers, in order.
///
/// Returns `Ok(None)` when there is nothing to send. The first failing
/// saver aborts the build with its error.
pub fn build_request<S: ValueSaver>(
    options: &InsertOptions,
    savers: &[S],
    ids: &dyn IdGenerator,
) -> Result<Option<InsertAllRequest>, SaveError> {
    if savers.is_empty() {
        return Ok(None);
    }

    let mut rows = Vec::with_capacity(savers.len());
    for (index, saver) in savers.iter().enumerate() {
        let (json, insert_id) = saver.save().inspect_err(|err| {
            tracing::debug!(index, error = %err, "row failed to save");
        })?;
        rows.push(InsertRow {
            insert_id: wire_insert_id(insert_id, ids),
            json,
        });
    }

    tracing::debug!(rows = rows.len(), "built insert request");
    Ok(Some(InsertAllRequest {
        rows,
        template_suffix: options.template_suffix.clone(),
        skip_invalid_rows: options.skip_invalid_rows,
        ignore_unknown_values: options.ignore_unknown_values,
    }))
}
