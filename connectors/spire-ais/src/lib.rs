//! FCP Spire AIS Connector
//!
//! A source connector that pages through the Spire Maritime vessels GraphQL
//! API and emits one create record per vessel.
//!
//! ## Components
//!
//! - [`QueryClient`] - one GraphQL request/response exchange (injectable)
//! - [`VesselIterator`] - cursor pagination, page buffer, bounded retry
//! - [`wrap_vessel`] - vessel to [`Record`] conversion
//! - [`SpireSource`] - host lifecycle (configure, open, read, ack, teardown)
//!
//! Positions are page end cursors. Opening with a saved position continues
//! after that page.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod client;
mod config;
mod error;
mod iterator;
mod query;
mod record;
mod retry;
mod source;
mod types;

pub use client::{GraphqlClient, QueryClient};
pub use config::{
    DEFAULT_API_URL, DEFAULT_BATCH_SIZE, FirstReadPolicy, ParameterSpec, SpireConfig,
};
pub use error::{AisError, AisResult, GraphqlClientError, GraphqlError, HttpErrorInfo};
pub use iterator::{IteratorState, VesselIterator};
pub use query::{GraphqlRequest, PageVariables, VESSEL_QUERY};
pub use record::{METADATA_CREATED_AT, Operation, Payload, Position, Record, wrap_vessel};
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryExhausted, RetryPolicy};
pub use source::{CONNECTOR_NAME, Specification, SpireSource};
pub use types::{
    CurrentVoyage, Dimensions, LastPositionUpdate, PageInfo, StaticData, TotalCount, Vessel,
    Vessels, VesselsData,
};
