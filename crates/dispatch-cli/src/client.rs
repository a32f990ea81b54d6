//! Dispatch server client for order submission and simulation control.

use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use dispatch_core::{CatalogStats, Drone, LocationRegistry, Order, OrderRequest, SimulationSnapshot};

/// Client for the dispatch server REST API.
pub struct DispatchClient {
    base_url: String,
    client: reqwest::Client,
}

/// One message from the snapshot stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    pub event: String,
    pub snapshot: SimulationSnapshot,
}

/// WebSocket snapshot stream.
pub struct SnapshotStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl DispatchClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn locations(&self) -> Result<LocationRegistry> {
        self.get("/v1/locations").await
    }

    pub async fn route_stats(&self) -> Result<CatalogStats> {
        self.get("/v1/routes/stats").await
    }

    pub async fn snapshot(&self) -> Result<SimulationSnapshot> {
        self.get("/v1/snapshot").await
    }

    pub async fn submit_order(&self, request: &OrderRequest) -> Result<Order> {
        let response = self.client.post(self.url("/v1/orders")).json(request).send().await?;
        decode(response).await
    }

    pub async fn dispatch_order(&self, order_id: &str) -> Result<Drone> {
        let response = self
            .client
            .post(self.url(&format!("/v1/orders/{}/dispatch", order_id)))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn start(&self, speed: Option<f64>) -> Result<SimulationSnapshot> {
        let response = self
            .client
            .post(self.url("/v1/simulation/start"))
            .json(&json!({ "speed": speed }))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn stop(&self) -> Result<SimulationSnapshot> {
        let response = self.client.post(self.url("/v1/simulation/stop")).send().await?;
        decode(response).await
    }

    pub async fn reset(&self) -> Result<SimulationSnapshot> {
        let response = self.client.post(self.url("/v1/simulation/reset")).send().await?;
        decode(response).await
    }

    pub async fn set_speed(&self, speed: f64) -> Result<SimulationSnapshot> {
        let response = self
            .client
            .put(self.url("/v1/simulation/speed"))
            .json(&json!({ "speed": speed }))
            .send()
            .await?;
        decode(response).await
    }

    /// Connect to the snapshot WebSocket, optionally limited to some events.
    pub async fn connect_stream(&self, events: Option<&str>) -> Result<SnapshotStream> {
        let url = build_ws_url(&self.base_url, "/v1/stream", events)?;
        let (socket, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("connecting to {}", url))?;
        Ok(SnapshotStream { socket })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send().await?;
        decode(response).await
    }
}

/// Parse a success body, or turn the server's `{ "error": ... }` into an error.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    match status {
        StatusCode::NOT_FOUND => anyhow::bail!("not found: {}", message),
        StatusCode::CONFLICT => anyhow::bail!("conflict: {}", message),
        _ => anyhow::bail!("server returned {}: {}", status, message),
    }
}

fn build_ws_url(base_url: &str, path: &str, events: Option<&str>) -> Result<Url> {
    let mut url = Url::parse(base_url).with_context(|| format!("invalid server url {}", base_url))?;
    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| anyhow::anyhow!("cannot use {} for a websocket url", base_url))?;
    url.set_path(path);
    if let Some(events) = events {
        url.query_pairs_mut().append_pair("events", events);
    }
    Ok(url)
}

impl SnapshotStream {
    /// Next frame, or `None` once the server closes the stream.
    pub async fn next_frame(&mut self) -> Result<Option<StreamFrame>> {
        while let Some(msg) = self.socket.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(serde_json::from_str(&text)?)),
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}
