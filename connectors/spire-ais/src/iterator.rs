//! Cursor-paginated vessel iterator.
//!
//! Pulls one page at a time through a [`QueryClient`], buffers it, and hands
//! out vessels in fetch order. All pagination state lives here and changes
//! only when a page fetch succeeds.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::{
    client::QueryClient,
    config::SpireConfig,
    error::{AisError, AisResult, GraphqlClientError},
    query::GraphqlRequest,
    record::{Position, Record, wrap_vessel},
    retry::RetryPolicy,
    types::Vessel,
};

/// Externally visible iterator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// Nothing buffered and the remote may have more pages.
    NoData,
    /// At least one vessel is buffered.
    HasBufferedRecords,
    /// Nothing buffered and the last page reported no further pages.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pagination {
    /// No page fetched yet.
    Unstarted { resume_from: Option<String> },
    /// The last page reported more data.
    More { cursor: Option<String> },
    /// The last page reported no more data.
    Exhausted,
}

impl Pagination {
    /// `after` variable for the next request.
    ///
    /// Once exhausted, the next fetch starts over from the first page.
    fn after(&self) -> Option<String> {
        match self {
            Self::Unstarted { resume_from } => resume_from.clone(),
            Self::More { cursor } => cursor.clone(),
            Self::Exhausted => None,
        }
    }

    const fn may_have_more(&self) -> bool {
        !matches!(self, Self::Exhausted)
    }
}

/// Page fetcher and cursor tracker for the vessels connection.
pub struct VesselIterator {
    client: Arc<dyn QueryClient>,
    query: String,
    batch_size: u32,
    retry: RetryPolicy,
    pagination: Pagination,
    buffer: VecDeque<Vessel>,
    position: Position,
    nodes_processed: u64,
}

impl std::fmt::Debug for VesselIterator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VesselIterator")
            .field("batch_size", &self.batch_size)
            .field("retry", &self.retry)
            .field("pagination", &self.pagination)
            .field("buffered", &self.buffer.len())
            .field("position", &self.position)
            .field("nodes_processed", &self.nodes_processed)
            .finish_non_exhaustive()
    }
}

impl VesselIterator {
    /// Create an iterator resuming from `position`.
    ///
    /// A non-empty position is the end cursor of the last page handed out
    /// before a restart and becomes the `after` cursor of the first request.
    pub fn new(
        client: Arc<dyn QueryClient>,
        query: impl Into<String>,
        batch_size: u32,
        position: Position,
    ) -> AisResult<Self> {
        let resume_from = position.to_cursor()?;
        Ok(Self {
            client,
            query: query.into(),
            batch_size,
            retry: RetryPolicy::default(),
            pagination: Pagination::Unstarted { resume_from },
            buffer: VecDeque::new(),
            position,
            nodes_processed: 0,
        })
    }

    /// Create an iterator from connector configuration.
    pub fn from_config(
        client: Arc<dyn QueryClient>,
        config: &SpireConfig,
        position: Position,
    ) -> AisResult<Self> {
        Ok(Self::new(client, config.query(), config.batch_size, position)?
            .with_retry_policy(config.retry_policy()))
    }

    /// Set the retry policy applied to each page fetch.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether a vessel can be read.
    ///
    /// With an empty buffer this fetches at most one page, unless the last
    /// page said there are no more. Fetch failures are logged and reported
    /// as `false`; the next [`next`](Self::next) call surfaces them.
    pub async fn has_next(&mut self) -> bool {
        if !self.buffer.is_empty() {
            return true;
        }
        if !self.pagination.may_have_more() {
            return false;
        }

        match self.fetch_page().await {
            Ok(()) => !self.buffer.is_empty() || self.pagination.may_have_more(),
            Err(err) => {
                error!(error = %err, "failed to fetch vessel page");
                false
            }
        }
    }

    /// Read the next vessel as a record.
    ///
    /// Fetches one page first when the buffer is empty. Returns `Ok(None)`
    /// when that page holds no vessels. A vessel that fails to convert stays
    /// buffered; see [`discard_next`](Self::discard_next).
    pub async fn next(&mut self) -> AisResult<Option<Record>> {
        if self.buffer.is_empty() {
            self.fetch_page().await?;
        }

        let Some(vessel) = self.buffer.front() else {
            return Ok(None);
        };
        let record = wrap_vessel(vessel, self.position.clone())?;
        self.buffer.pop_front();
        self.nodes_processed += 1;
        debug!(nodes_processed = self.nodes_processed, "vessel read");

        Ok(Some(record))
    }

    /// Drop the vessel at the head of the buffer without reading it.
    pub fn discard_next(&mut self) -> Option<Vessel> {
        let vessel = self.buffer.pop_front()?;
        debug!(id = %vessel.id, "vessel discarded");
        Some(vessel)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> IteratorState {
        if !self.buffer.is_empty() {
            IteratorState::HasBufferedRecords
        } else if self.pagination.may_have_more() {
            IteratorState::NoData
        } else {
            IteratorState::Exhausted
        }
    }

    /// Position attached to records read now.
    #[must_use]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Cursor the next request will continue after.
    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        self.pagination.after()
    }

    /// Vessels waiting in the buffer.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Vessels read since the iterator was created.
    #[must_use]
    pub const fn nodes_processed(&self) -> u64 {
        self.nodes_processed
    }

    /// Fetch one page and replace the buffer, cursor and position with it.
    ///
    /// On failure nothing changes, so the next attempt asks for the same page.
    #[instrument(skip(self), fields(batch_size = self.batch_size))]
    async fn fetch_page(&mut self) -> AisResult<()> {
        let after = self.pagination.after();
        let request = GraphqlRequest::page(self.query.as_str(), self.batch_size, after.clone());

        let client = self.client.as_ref();
        let request = &request;
        let data = self
            .retry
            .run(
                "fetch vessel page",
                |_: &GraphqlClientError| true,
                move |attempt| {
                    debug!(attempt, after = ?request.variables.after, "requesting vessel page");
                    client.run(request)
                },
            )
            .await
            .map_err(|exhausted| AisError::Fetch {
                attempts: exhausted.attempts,
                source: exhausted.last_error,
            })?;

        let vessels = data.vessels;
        let has_next_page = vessels.page_info.has_next_page;
        let end_cursor = vessels.page_info.cursor().map(str::to_owned);
        info!(
            nodes = vessels.nodes.len(),
            has_next_page,
            end_cursor = ?end_cursor,
            total_count = ?vessels.total_count.as_ref().map(|count| count.value),
            "vessel page fetched"
        );

        if has_next_page && end_cursor.is_none() {
            warn!(
                after = ?after,
                "page reports more vessels but no end cursor; next request repeats the same cursor"
            );
        }

        self.buffer = VecDeque::from(vessels.nodes);
        self.pagination = if has_next_page {
            Pagination::More {
                cursor: end_cursor.clone().or(after),
            }
        } else {
            Pagination::Exhausted
        };
        if let Some(cursor) = end_cursor {
            self.position = Position::from_cursor(&cursor);
        }

        Ok(())
    }
}
