//! Shared fixtures for Spire AIS integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing_subscriber::fmt::MakeWriter;
use fcp_spire_ais::{
    GraphqlClientError, GraphqlRequest, PageInfo, QueryClient, RetryPolicy, Vessel, Vessels,
    VesselsData,
};

/// Retry policy that keeps tests fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

/// Vessel with a valid update timestamp.
pub fn vessel(id: &str) -> Vessel {
    vessel_at(id, "2021-10-01T15:00:00Z")
}

/// Vessel with the given update timestamp.
pub fn vessel_at(id: &str, update_timestamp: &str) -> Vessel {
    Vessel {
        id: id.to_string(),
        update_timestamp: update_timestamp.to_string(),
        ..Vessel::default()
    }
}

/// Vessels `prefix-0` .. `prefix-{count-1}`.
pub fn vessels(prefix: &str, count: usize) -> Vec<Vessel> {
    (0..count).map(|i| vessel(&format!("{prefix}-{i}"))).collect()
}

/// One page response.
pub fn page(nodes: Vec<Vessel>, has_next_page: bool, end_cursor: &str) -> VesselsData {
    VesselsData {
        vessels: Vessels {
            page_info: PageInfo {
                has_next_page,
                end_cursor: Some(end_cursor.to_string()),
            },
            nodes,
            total_count: None,
        },
    }
}

/// Transient transport failure.
pub fn transient(message: &str) -> GraphqlClientError {
    GraphqlClientError::Protocol {
        message: message.to_string(),
    }
}

/// In-memory [`QueryClient`] replaying scripted responses.
#[derive(Default)]
pub struct FakeClient {
    responses: Mutex<VecDeque<Result<VesselsData, GraphqlClientError>>>,
    requests: Mutex<Vec<GraphqlRequest>>,
}

impl FakeClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_page(&self, data: VesselsData) {
        self.responses.lock().unwrap().push_back(Ok(data));
    }

    pub fn push_error(&self, error: GraphqlClientError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<GraphqlRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `after` variable of each request, in order.
    pub fn afters(&self) -> Vec<Option<String>> {
        self.requests()
            .into_iter()
            .map(|request| request.variables.after)
            .collect()
    }
}

#[async_trait]
impl QueryClient for FakeClient {
    async fn run(&self, request: &GraphqlRequest) -> Result<VesselsData, GraphqlClientError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transient("no scripted response")))
    }
}

/// Collects formatted log output for assertions.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Dispatcher writing every event at `debug` and above into this capture.
    pub fn subscriber(&self) -> tracing::Dispatch {
        tracing::Dispatch::new(
            tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish(),
        )
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
