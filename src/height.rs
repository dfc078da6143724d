//! Height sources: one HTTP round trip per check, shared result extraction.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client as HttpClient;
use serde_json::Value;
use tracing::debug;

use crate::errors::FetchError;
use crate::monitor::HeightSource;

/// A block number as reported by a node or reference source.
pub type Height = u64;

/// Public block-explorer proxy for the reference block number.
pub const DEFAULT_ORACLE_URL: &str =
    "https://api.etherscan.io/api?module=proxy&action=eth_blockNumber";

/// How a height request is shaped on the wire.
#[derive(Debug, Clone)]
pub enum RequestShape {
    /// `eth_blockNumber` JSON-RPC call over HTTP POST.
    JsonRpcPost,
    /// Plain HTTP GET, all parameters in the URL.
    Get,
}

/// Identifies one height source: a label for diagnostics, the endpoint URL
/// and the request shape.
#[derive(Debug, Clone)]
pub struct HeightQuery {
    pub label: String,
    pub url: String,
    pub shape: RequestShape,
}

impl HeightQuery {
    pub fn local_node(endpoint: &str) -> Self {
        Self {
            label: "local node".to_string(),
            url: endpoint.to_string(),
            shape: RequestShape::JsonRpcPost,
        }
    }

    pub fn oracle(url: &str) -> Self {
        Self {
            label: "oracle".to_string(),
            url: url.to_string(),
            shape: RequestShape::Get,
        }
    }
}

/// Stateless HTTP fetcher shared by both height sources.
#[derive(Clone)]
pub struct HeightClient {
    client: HttpClient,
}

impl HeightClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Performs a single request for `query` and extracts the block height.
    /// No retries happen here; retry emerges from the next check cycle.
    pub async fn fetch(&self, query: &HeightQuery) -> Result<Height, FetchError> {
        debug!("Querying {} block number at {}", query.label, query.url);

        let request = match query.shape {
            RequestShape::JsonRpcPost => self.client.post(&query.url).json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": "eth_blockNumber",
                "params": [],
                "id": 1,
            })),
            RequestShape::Get => self.client.get(&query.url),
        };

        let response = request.send().await.map_err(|e| FetchError::Transport {
            source: query.label.clone(),
            cause: e.to_string(),
        })?;

        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await.map_err(|e| FetchError::Transport {
            source: query.label.clone(),
            cause: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(FetchError::Protocol {
                source: query.label.clone(),
                status: status.as_u16(),
                url,
                body,
            });
        }

        extract_height(&query.label, &url, &body)
    }
}

/// One height source of the decision loop: a client paired with the query it
/// keeps re-issuing.
#[derive(Clone)]
pub struct RemoteHeightSource {
    client: HeightClient,
    query: HeightQuery,
}

impl RemoteHeightSource {
    pub fn new(client: HeightClient, query: HeightQuery) -> Self {
        Self { client, query }
    }
}

impl HeightSource for RemoteHeightSource {
    async fn height(&self) -> Result<Height, FetchError> {
        self.client.fetch(&self.query).await
    }
}

/// Parses the `{"result": "<hex>"}` envelope both sources share. The `result`
/// field must be present, non-null and a hex block number string.
fn extract_height(source: &str, url: &str, body: &str) -> Result<Height, FetchError> {
    let format_error = |reason: &str| FetchError::Format {
        source: source.to_string(),
        url: url.to_string(),
        body: body.to_string(),
        reason: reason.to_string(),
    };

    let envelope: Value =
        serde_json::from_str(body).map_err(|_| format_error("body is not valid JSON"))?;

    let result = match envelope.get("result") {
        Some(value) if !value.is_null() => value,
        _ => return Err(format_error("missing a result in response")),
    };

    let text = result
        .as_str()
        .ok_or_else(|| format_error("result is not a string"))?;

    parse_hex_height(text).ok_or_else(|| format_error("result is not a hex block number"))
}

/// Interprets a hex integer string, with or without a `0x` prefix.
pub fn parse_hex_height(text: &str) -> Option<Height> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    Height::from_str_radix(digits, 16).ok()
}
