//! FCP Spire AIS Connector - Main entrypoint
//!
//! Serves the source lifecycle as line-delimited JSON-RPC on stdin/stdout.
//! Logs go to stderr; set `SPIRE_AIS_LOG_FORMAT=json` for JSON logs.

#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use anyhow::Result;
use fcp_spire_ais::{AisError, Position, SpireSource};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    init_tracing();

    tracing::info!("FCP Spire AIS Connector starting");

    run_protocol_loop()?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("SPIRE_AIS_LOG_FORMAT").is_ok_and(|format| format == "json") {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Run the JSON-RPC style protocol loop until stdin closes.
fn run_protocol_loop() -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut source = SpireSource::new();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = runtime.block_on(handle_message(&mut source, &line));

        let response_json = serde_json::to_string(&response)?;
        writeln!(stdout, "{response_json}")?;
        stdout.flush()?;
    }

    source.teardown()?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
struct PositionParams {
    #[serde(default)]
    position: Option<Position>,
}

fn position_param(params: Value) -> Result<Position, AisError> {
    let params: PositionParams =
        serde_json::from_value(params).map_err(|e| AisError::InvalidPosition(e.to_string()))?;
    Ok(params.position.unwrap_or_default())
}

/// Handle a single request line.
async fn handle_message(source: &mut SpireSource, message: &str) -> Value {
    let request: Value = match serde_json::from_str(message) {
        Ok(v) => v,
        Err(e) => {
            return json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": "invalid_json",
                    "message": format!("Invalid JSON: {e}")
                }
            });
        }
    };

    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let id = request.get("id").cloned();
    let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

    let result = dispatch(source, method, params).await;

    let mut response = match result {
        Ok(value) => json!({
            "jsonrpc": "2.0",
            "result": value
        }),
        Err(e) => {
            if !e.is_backoff() {
                tracing::error!(method, error = %e, "request failed");
            }
            json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": e.code(),
                    "message": e.to_string()
                }
            })
        }
    };
    if let Some(id) = id {
        response["id"] = id;
    }
    response
}

async fn dispatch(source: &mut SpireSource, method: &str, params: Value) -> Result<Value, AisError> {
    match method {
        "specify" => Ok(json!(SpireSource::specification())),
        "parameters" => Ok(json!(SpireSource::parameters())),
        "configure" => {
            source.configure(params)?;
            Ok(json!({"status": "configured"}))
        }
        "open" => {
            source.open(position_param(params)?)?;
            Ok(json!({"status": "opened"}))
        }
        "read" => {
            let record = source.read().await?;
            serde_json::to_value(&record).map_err(|e| AisError::Transform {
                id: String::from_utf8_lossy(&record.key).into_owned(),
                message: format!("failed to serialize record: {e}"),
            })
        }
        "discard" => {
            let iterator = source.iterator_mut().ok_or(AisError::NotOpened)?;
            let discarded = iterator.discard_next().map(|vessel| vessel.id);
            Ok(json!({"discarded": discarded}))
        }
        "ack" => {
            source.ack(&position_param(params)?)?;
            Ok(json!({"status": "acked"}))
        }
        "teardown" => {
            source.teardown()?;
            Ok(json!({"status": "torn_down"}))
        }
        _ => Err(AisError::InvalidRequest(format!("unknown method: {method}"))),
    }
}
