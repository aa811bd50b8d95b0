//! Spire AIS connector configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{AisError, AisResult},
    query::VESSEL_QUERY,
    retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy},
};

/// Default Spire Maritime GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://api.spire.com/graphql";

/// Default number of vessels requested per page.
pub const DEFAULT_BATCH_SIZE: u32 = 100;

/// Whether the first read after `open` skips the `has_next` probe.
///
/// A forced first read goes straight to `next`, so a failing first fetch is
/// reported as an error instead of a backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FirstReadPolicy {
    /// Force the first read only when resuming from a saved position.
    #[default]
    OnResume,
    /// Force the first read after every open.
    Always,
    /// Always trust `has_next`.
    Never,
}

impl FirstReadPolicy {
    /// Whether the first read should be forced for this open.
    #[must_use]
    pub const fn forces_first_read(self, resuming: bool) -> bool {
        match self {
            Self::OnResume => resuming,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Configuration for the Spire AIS source.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpireConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token for the Spire API.
    #[serde(default)]
    pub token: String,

    /// Vessels per page.
    #[serde(default = "default_batch_size", with = "lenient_u32")]
    pub batch_size: u32,

    /// Replacement query; empty means the built-in vessel query.
    #[serde(default)]
    pub query: String,

    /// HTTP request timeout.
    #[serde(
        default = "default_timeout",
        rename = "timeoutSecs",
        with = "duration_secs"
    )]
    pub timeout: Duration,

    /// Attempts per page fetch.
    #[serde(default = "default_retry_attempts", with = "lenient_u32")]
    pub retry_attempts: u32,

    /// Delay between attempts.
    #[serde(
        default = "default_retry_delay",
        rename = "retryDelayMs",
        with = "duration_millis"
    )]
    pub retry_delay: Duration,

    /// First-read-after-open behaviour.
    #[serde(default)]
    pub first_read: FirstReadPolicy,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

const fn default_batch_size() -> u32 {
    DEFAULT_BATCH_SIZE
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_retry_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_retry_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

impl Default for SpireConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: String::new(),
            batch_size: default_batch_size(),
            query: String::new(),
            timeout: default_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay: default_retry_delay(),
            first_read: FirstReadPolicy::default(),
        }
    }
}

impl fmt::Debug for SpireConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpireConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("batch_size", &self.batch_size)
            .field("query_overridden", &!self.query.is_empty())
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("first_read", &self.first_read)
            .finish()
    }
}

impl SpireConfig {
    /// Parse and validate a host parameter map.
    pub fn from_value(params: serde_json::Value) -> AisResult<Self> {
        let config: Self = serde_json::from_value(params)
            .map_err(|e| AisError::Config(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> AisResult<()> {
        if self.token.trim().is_empty() {
            return Err(AisError::Config("token is required".into()));
        }

        let url = Url::parse(&self.api_url)
            .map_err(|e| AisError::Config(format!("apiUrl {:?} is not a URL: {e}", self.api_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AisError::Config(format!(
                "apiUrl must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.batch_size == 0 {
            return Err(AisError::Config("batchSize must be greater than 0".into()));
        }
        if self.retry_attempts == 0 {
            return Err(AisError::Config(
                "retryAttempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Query text sent for every page.
    #[must_use]
    pub fn query(&self) -> &str {
        if self.query.trim().is_empty() {
            VESSEL_QUERY
        } else {
            &self.query
        }
    }

    /// Retry policy applied to each page fetch.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }

    /// Parameter descriptions published by the connector.
    #[must_use]
    pub fn parameters() -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::optional(
                "apiUrl",
                "Spire GraphQL API URL.",
                DEFAULT_API_URL.to_string(),
            ),
            ParameterSpec::required("token", "Access token for the Spire GraphQL API."),
            ParameterSpec::optional(
                "batchSize",
                "Number of vessels to retrieve per API call.",
                DEFAULT_BATCH_SIZE.to_string(),
            ),
            ParameterSpec::optional(
                "query",
                "GraphQL query used to pull vessels; must accept $first and $after.",
                String::new(),
            ),
            ParameterSpec::optional(
                "timeoutSecs",
                "HTTP request timeout in seconds.",
                default_timeout().as_secs().to_string(),
            ),
            ParameterSpec::optional(
                "retryAttempts",
                "Attempts per page before the fetch fails.",
                DEFAULT_MAX_ATTEMPTS.to_string(),
            ),
            ParameterSpec::optional(
                "retryDelayMs",
                "Delay between attempts in milliseconds.",
                DEFAULT_RETRY_DELAY.as_millis().to_string(),
            ),
            ParameterSpec::optional(
                "firstRead",
                "First read after open skips the has-next probe: onResume, always or never.",
                "onResume".to_string(),
            ),
        ]
    }
}

/// Description of one configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSpec {
    /// Parameter key.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Default value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether the parameter must be supplied.
    pub required: bool,
}

impl ParameterSpec {
    fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            default: None,
            required: true,
        }
    }

    fn optional(name: &'static str, description: &'static str, default: String) -> Self {
        Self {
            name,
            description,
            default: Some(default),
            required: false,
        }
    }
}

/// Numbers may arrive as JSON numbers or as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::String(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected an unsigned integer, got {s:?}"))),
        }
    }
}

mod lenient_u32 {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NumberOrString;

    pub fn serialize<S>(value: &u32, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u32(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let n = NumberOrString::deserialize(deserializer)?.into_u64::<D::Error>()?;
        u32::try_from(n).map_err(|_| serde::de::Error::custom(format!("{n} is out of range")))
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::NumberOrString;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = NumberOrString::deserialize(deserializer)?.into_u64::<D::Error>()?;
        Ok(Duration::from_secs(secs))
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::NumberOrString;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = NumberOrString::deserialize(deserializer)?.into_u64::<D::Error>()?;
        Ok(Duration::from_millis(millis))
    }
}
