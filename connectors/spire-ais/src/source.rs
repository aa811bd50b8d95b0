//! Spire AIS source connector.
//!
//! Drives the host lifecycle: `configure`, `open`, repeated `read`/`ack`,
//! then `teardown`.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::{
    client::{GraphqlClient, QueryClient},
    config::{ParameterSpec, SpireConfig},
    error::{AisError, AisResult},
    iterator::VesselIterator,
    record::{Position, Record},
};

/// Connector name.
pub const CONNECTOR_NAME: &str = "spire-ais";

/// Connector description published to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Specification {
    /// Connector name.
    pub name: &'static str,
    /// One-line summary.
    pub summary: &'static str,
    /// Longer description.
    pub description: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Connector author.
    pub author: &'static str,
}

/// Source connector reading vessels from the Spire Maritime GraphQL API.
#[derive(Debug, Default)]
pub struct SpireSource {
    /// Configuration (set via configure)
    config: Option<SpireConfig>,

    /// Page iterator (created on open)
    iterator: Option<VesselIterator>,

    /// Skip the `has_next` probe on the next read
    force_next_read: bool,
}

impl SpireSource {
    /// Create an unconfigured source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector specification.
    #[must_use]
    pub const fn specification() -> Specification {
        Specification {
            name: CONNECTOR_NAME,
            summary: "A source connector for vessel data from the Spire Maritime AIS GraphQL API",
            description: "Pages through the Spire vessels query with a bearer token and emits one \
                          create record per vessel, resuming from the last page cursor.",
            version: env!("CARGO_PKG_VERSION"),
            author: "Meroxa, Inc.",
        }
    }

    /// Configuration parameters accepted by [`configure`](Self::configure).
    #[must_use]
    pub fn parameters() -> Vec<ParameterSpec> {
        SpireConfig::parameters()
    }

    /// Parse and validate the host's parameter map.
    #[instrument(skip(self, params))]
    pub fn configure(&mut self, params: Value) -> AisResult<()> {
        debug!("Configuring Spire AIS source");
        let config = SpireConfig::from_value(params)?;
        info!(api_url = %config.api_url, batch_size = config.batch_size, "Spire AIS source configured");
        self.config = Some(config);
        Ok(())
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> Option<&SpireConfig> {
        self.config.as_ref()
    }

    /// Open the source against the configured API, resuming from `position`.
    pub fn open(&mut self, position: Position) -> AisResult<()> {
        let config = self.config.as_ref().ok_or(AisError::NotConfigured)?;
        let client = GraphqlClient::from_config(config)
            .map_err(|e| AisError::Config(format!("failed to create GraphQL client: {e}")))?;
        self.open_with_client(position, Arc::new(client))
    }

    /// Open the source with a caller-supplied query client.
    #[instrument(skip(self, client))]
    pub fn open_with_client(
        &mut self,
        position: Position,
        client: Arc<dyn QueryClient>,
    ) -> AisResult<()> {
        let config = self.config.as_ref().ok_or(AisError::NotConfigured)?;
        let resuming = !position.is_empty();
        let iterator = VesselIterator::from_config(client, config, position)?;

        self.force_next_read = config.first_read.forces_first_read(resuming);
        info!(
            resuming,
            force_first_read = self.force_next_read,
            "Opening Spire AIS source"
        );
        self.iterator = Some(iterator);
        Ok(())
    }

    /// Read the next record.
    ///
    /// Returns [`AisError::BackoffRetry`] when no vessel is available right
    /// now. Other errors are fatal to the read.
    pub async fn read(&mut self) -> AisResult<Record> {
        let forced = std::mem::take(&mut self.force_next_read);
        let iterator = self.iterator.as_mut().ok_or(AisError::NotOpened)?;

        if !forced && !iterator.has_next().await {
            return Err(AisError::BackoffRetry);
        }

        let record = iterator.next().await;
        debug!(
            nodes_processed = iterator.nodes_processed(),
            "Nodes processed"
        );
        record?.ok_or(AisError::BackoffRetry)
    }

    /// Acknowledge a record. Nothing is held per record, so this only logs.
    pub fn ack(&self, position: &Position) -> AisResult<()> {
        debug!(position = ?position, "got ack");
        Ok(())
    }

    /// Release the iterator. Safe to call without `open`.
    pub fn teardown(&mut self) -> AisResult<()> {
        if self.iterator.take().is_some() {
            info!("Spire AIS source torn down");
        }
        self.force_next_read = false;
        Ok(())
    }

    /// Iterator of the open source.
    #[must_use]
    pub const fn iterator(&self) -> Option<&VesselIterator> {
        self.iterator.as_ref()
    }

    /// Mutable iterator of the open source, e.g. to discard a vessel that
    /// fails to convert.
    pub fn iterator_mut(&mut self) -> Option<&mut VesselIterator> {
        self.iterator.as_mut()
    }
}
