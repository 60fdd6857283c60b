//! The caller-facing insert call.
//!
//! [`Inserter::put`] runs one self-contained cycle: normalize the input,
//! build the request, hand it to the [`Transport`], and map any per-row
//! failures back onto the submitted rows.

use std::fmt;
use std::sync::Arc;

use tracing::instrument;

use crate::error::{PutError, TransportError};
use crate::normalize::{normalize, Rows};
use crate::request::{build_request, IdGenerator, InsertAllRequest, InsertOptions, RandomIds};
use crate::response::{map_insert_errors, InsertAllResponse};
use crate::saver::ValueSaver;

/// Sends insert requests to the server.
///
/// Retries, timeouts and authentication belong to the implementation.
pub trait Transport {
    fn insert_all(&self, request: &InsertAllRequest) -> Result<InsertAllResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn insert_all(&self, request: &InsertAllRequest) -> Result<InsertAllResponse, TransportError> {
        (**self).insert_all(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn insert_all(&self, request: &InsertAllRequest) -> Result<InsertAllResponse, TransportError> {
        (**self).insert_all(request)
    }
}

/// Inserts rows into one table through a transport.
pub struct Inserter<T> {
    transport: T,
    options: InsertOptions,
    ids: Arc<dyn IdGenerator>,
}

impl<T> Inserter<T> {
    /// Creates an inserter with default options and random insert ids.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            options: InsertOptions::default(),
            ids: Arc::new(RandomIds),
        }
    }

    pub fn with_options(mut self, options: InsertOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the source of automatically assigned insert ids.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn options(&self) -> &InsertOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> Inserter<T> {
    /// Inserts `rows`.
    ///
    /// Empty input succeeds without contacting the server. If the server
    /// rejects some rows the result is [`PutError::Rows`], listing the
    /// rejected rows by position and insert id.
    #[instrument(name = "stream_insert::put", level = "debug", skip_all)]
    pub fn put(&self, rows: Rows<'_>) -> Result<(), PutError> {
        let savers = normalize(rows)?;
        self.put_savers(&savers)
    }

    /// Inserts rows from savers that are already normalized.
    pub fn put_savers<S: ValueSaver>(&self, savers: &[S]) -> Result<(), PutError> {
        let Some(request) = build_request(&self.options, savers, self.ids.as_ref())? else {
            tracing::debug!("nothing to insert");
            return Ok(());
        };

        let response = self
            .transport
            .insert_all(&request)
            .map_err(PutError::Transport)?;

        match map_insert_errors(&response.insert_errors, &request.rows)? {
            Some(rejected) => Err(PutError::Rows(rejected)),
            None => Ok(()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Inserter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inserter")
            .field("transport", &self.transport)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
