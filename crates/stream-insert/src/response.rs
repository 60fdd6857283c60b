//! Insert response decoding and per-row failure mapping.
//!
//! The server reports rejected rows by their position in the request.
//! [`map_insert_errors`] turns those reports back into errors that carry
//! the insert id each row was actually sent with.

use serde::Deserialize;

use crate::error::{ErrorCause, MultiError, ProtocolError, PutMultiError, RowInsertionError};
use crate::request::InsertRow;

/// Response to an insert request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertAllResponse {
    /// Rows that failed, if any. Absent when every row was inserted.
    pub insert_errors: Vec<InsertErrors>,
}

impl InsertAllResponse {
    /// Decodes a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// The failures of one submitted row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct InsertErrors {
    /// Position of the row in the request.
    pub index: i64,
    pub errors: Vec<ErrorProto>,
}

/// A single error as described on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorProto {
    pub location: String,
    pub message: String,
    pub reason: String,
    /// Server-internal detail; not surfaced to callers.
    pub debug_info: String,
}

impl From<&ErrorProto> for ErrorCause {
    fn from(e: &ErrorProto) -> Self {
        ErrorCause {
            location: e.location.clone(),
            message: e.message.clone(),
            reason: e.reason.clone(),
        }
    }
}

/// Maps reported failures onto the rows that were sent.
///
/// Returns `Ok(None)` if nothing failed. Failures keep the order the server
/// reported them in, one error per report even if an index repeats. An
/// index outside the submitted rows fails the whole mapping.
pub fn map_insert_errors(
    insert_errors: &[InsertErrors],
    rows: &[InsertRow],
) -> Result<Option<PutMultiError>, ProtocolError> {
    if insert_errors.is_empty() {
        return Ok(None);
    }

    let mut errs = Vec::with_capacity(insert_errors.len());
    for e in insert_errors {
        let row_index = usize::try_from(e.index)
            .ok()
            .filter(|&i| i < rows.len())
            .ok_or(ProtocolError::UnexpectedRowIndex { index: e.index })
            .inspect_err(|_| {
                tracing::warn!(index = e.index, rows = rows.len(), "insert error for unknown row");
            })?;

        errs.push(RowInsertionError {
            insert_id: rows[row_index].insert_id.clone(),
            row_index,
            errors: MultiError(e.errors.iter().map(ErrorCause::from).collect()),
        });
    }

    tracing::debug!(failed = errs.len(), submitted = rows.len(), "rows rejected");
    Ok(Some(PutMultiError(errs)))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::model::Row;

    fn rows(ids: &[&str]) -> Vec<InsertRow> {
        ids.iter()
            .map(|id| InsertRow {
                insert_id: id.to_string(),
                json: Row::new(),
            })
            .collect()
    }

    fn report(index: i64, messages: &[&str]) -> InsertErrors {
        InsertErrors {
            index,
            errors: messages
                .iter()
                .map(|m| ErrorProto {
                    message: m.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn cause(message: &str) -> ErrorCause {
        ErrorCause {
            message: message.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_errors() {
        assert_eq!(map_insert_errors(&[], &rows(&["a", "b"])), Ok(None));
    }

    #[test]
    fn test_single_error_last_row() {
        let got = map_insert_errors(&[report(1, &[])], &rows(&["a", "b"])).unwrap();
        assert_eq!(
            got,
            Some(PutMultiError(vec![RowInsertionError {
                insert_id: "b".into(),
                row_index: 1,
                errors: MultiError::default(),
            }]))
        );
    }

    #[test]
    fn test_single_error_first_row() {
        let got = map_insert_errors(&[report(0, &[])], &rows(&["a", "b"])).unwrap();
        assert_eq!(
            got,
            Some(PutMultiError(vec![RowInsertionError {
                insert_id: "a".into(),
                row_index: 0,
                errors: MultiError::default(),
            }]))
        );
    }

    #[test]
    fn test_errors_with_messages() {
        let got = map_insert_errors(&[report(0, &["m0"]), report(1, &["m1"])], &rows(&["a", "b"]))
            .unwrap();
        assert_eq!(
            got,
            Some(PutMultiError(vec![
                RowInsertionError {
                    insert_id: "a".into(),
                    row_index: 0,
                    errors: MultiError(vec![cause("m0")]),
                },
                RowInsertionError {
                    insert_id: "b".into(),
                    row_index: 1,
                    errors: MultiError(vec![cause("m1")]),
                },
            ]))
        );
    }

    #[test]
    fn test_invalid_index() {
        let err = map_insert_errors(&[report(2, &["m0"])], &rows(&["a", "b"])).unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedRowIndex { index: 2 });
        assert_eq!(err.to_string(), "internal error: unexpected row index: 2");

        // A bad index anywhere discards the failures already mapped.
        let err = map_insert_errors(&[report(0, &[]), report(-1, &[])], &rows(&["a"])).unwrap_err();
        assert_eq!(err, ProtocolError::UnexpectedRowIndex { index: -1 });
    }

    #[test]
    fn test_reported_order_and_duplicates_kept() {
        let reports = [report(1, &["x"]), report(0, &[]), report(1, &["y"])];
        let got = map_insert_errors(&reports, &rows(&["a", "b"])).unwrap().unwrap();
        let got: Vec<_> = got.iter().map(|e| (e.row_index, e.insert_id.as_str())).collect();
        assert_eq!(got, vec![(1, "b"), (0, "a"), (1, "b")]);
    }

    #[test]
    fn test_empty_insert_id_is_reported() {
        let got = map_insert_errors(&[report(0, &[])], &rows(&[""])).unwrap().unwrap();
        assert_eq!(got.0[0].insert_id, "");
    }

    #[test]
    fn test_response_json() {
        let body = br#"{
            "kind": "bigquery#tableDataInsertAllResponse",
            "insertErrors": [
                {"index": 1, "errors": [{"reason": "invalid", "location": "age", "message": "bad", "debugInfo": "x"}]},
                {"errors": []}
            ]
        }"#;
        let resp = InsertAllResponse::from_json(body).unwrap();
        assert_eq!(resp.insert_errors.len(), 2);
        assert_eq!(resp.insert_errors[0].index, 1);
        assert_eq!(
            ErrorCause::from(&resp.insert_errors[0].errors[0]),
            ErrorCause {
                location: "age".into(),
                message: "bad".into(),
                reason: "invalid".into(),
            }
        );
        assert_eq!(resp.insert_errors[1], InsertErrors::default());

        let ok = InsertAllResponse::from_json(b"{}").unwrap();
        assert!(ok.insert_errors.is_empty());
    }

    proptest! {
        #[test]
        fn prop_in_range_reports_map_in_order(
            n in 1usize..16,
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
        ) {
            let ids: Vec<String> = (0..n).map(|i| format!("id{i}")).collect();
            let sent: Vec<InsertRow> = ids
                .iter()
                .map(|id| InsertRow { insert_id: id.clone(), json: Row::new() })
                .collect();
            let reports: Vec<InsertErrors> =
                picks.iter().map(|p| report(p.index(n) as i64, &[])).collect();

            let got = map_insert_errors(&reports, &sent).unwrap();
            match got {
                None => prop_assert!(reports.is_empty()),
                Some(errs) => {
                    prop_assert_eq!(errs.len(), reports.len());
                    for (e, r) in errs.iter().zip(&reports) {
                        prop_assert_eq!(e.row_index as i64, r.index);
                        prop_assert_eq!(&e.insert_id, &ids[e.row_index]);
                    }
                }
            }
        }
    }
}
