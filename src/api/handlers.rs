//! Request handlers.
//!
//! Framework-free: each handler takes the raw request pieces and returns a
//! status code with a JSON body, so any HTTP server can sit in front.

use crate::core::{Error, OrderId, OrderStatus, Result, ServiceType};
use crate::engine::{SimulateRequest, SlaEngine};
use crate::query::MetricPoint;
use crate::registry::Order;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Message returned when the journal cannot be written.
pub const STORAGE_UNAVAILABLE: &str = "storage unavailable, retry later";

/// Status code and JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status, body },
            Err(e) => Self::from_error(&Error::from(e)),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Map an engine error to a response. Server-side details are logged,
    /// not returned.
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Validation(message) => Self::error(400, message.clone()),
            Error::OrderNotFound(id) => Self::error(404, format!("order {} not found", id)),
            Error::StorageFailure(_) => {
                warn!(error = %err, "request failed on storage");
                Self::error(503, STORAGE_UNAVAILABLE)
            }
            _ => {
                error!(error = %err, "request failed");
                Self::error(500, "internal error")
            }
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One request in line form: `METHOD PATH [BODY]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestLine<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: Option<&'a str>,
}

/// Parse a raw request line. Blank lines yield `None`.
pub fn parse_request_line(raw: &[u8]) -> Result<Option<RequestLine<'_>>> {
    let line = std::str::from_utf8(raw)
        .map_err(|e| Error::validation(format!("request line is not valid UTF-8: {}", e)))?
        .trim();
    if line.is_empty() {
        return Ok(None);
    }

    let mut parts = line.splitn(3, ' ');
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or("/");
    let body = parts.next().map(str::trim).filter(|body| !body.is_empty());
    Ok(Some(RequestLine { method, path, body }))
}

/// Body of `POST /orders`.
#[derive(Debug, Deserialize)]
struct CreateOrderRequest {
    user_name: String,
    service_type: String,
    sla_uptime_pct: f64,
    sla_latency_ms: f64,
}

impl CreateOrderRequest {
    fn latency_threshold(&self) -> Result<u64> {
        let ms = self.sla_latency_ms;
        if !ms.is_finite() || ms.fract() != 0.0 || ms < 1.0 || ms > u32::MAX as f64 {
            return Err(Error::validation(format!(
                "sla_latency_ms must be a positive integer, got {}",
                ms
            )));
        }
        Ok(ms as u64)
    }
}

#[derive(Debug, Serialize)]
struct SimulateResponse {
    samples: Vec<MetricPoint>,
    status: OrderStatus,
}

/// JSON API over an [`SlaEngine`].
#[derive(Clone)]
pub struct ApiService {
    engine: Arc<SlaEngine>,
}

impl ApiService {
    /// Create a service for `engine`.
    pub fn new(engine: Arc<SlaEngine>) -> Self {
        Self { engine }
    }

    /// Underlying engine.
    pub fn engine(&self) -> &Arc<SlaEngine> {
        &self.engine
    }

    /// Dispatch a request by method and path.
    pub async fn handle(&self, method: &str, path: &str, body: Option<&str>) -> ApiResponse {
        let path = path.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let method = method.to_ascii_uppercase();
        debug!(method = %method, path = %path, "api request");

        match (segments.as_slice(), method.as_str()) {
            (["orders"], "POST") => self.create_order(body.unwrap_or_default()).await,
            (["orders"], "GET") => self.list_orders().await,
            (["orders", id], "GET") => self.get_order(id).await,
            (["simulate", id], "POST") => self.simulate(id, body).await,
            (["health"], "GET") => self.health().await,
            (["orders"], _) | (["orders", _], _) | (["simulate", _], _) | (["health"], _) => {
                ApiResponse::error(405, format!("method {} not allowed", method))
            }
            _ => ApiResponse::error(404, format!("no route for {}", path)),
        }
    }

    /// `POST /orders`
    pub async fn create_order(&self, body: &str) -> ApiResponse {
        let request: CreateOrderRequest = match serde_json::from_str(body) {
            Ok(request) => request,
            Err(e) => return ApiResponse::error(400, format!("invalid payload: {}", e)),
        };

        match self.place_order(request).await {
            Ok(order) => ApiResponse::ok(201, &order),
            Err(e) => ApiResponse::from_error(&e),
        }
    }

    /// `GET /orders`
    pub async fn list_orders(&self) -> ApiResponse {
        ApiResponse::ok(200, &self.engine.order_summaries().await)
    }

    /// `GET /orders/{id}`
    pub async fn get_order(&self, id: &str) -> ApiResponse {
        let Some(id) = parse_id(id) else {
            return ApiResponse::error(404, format!("order {} not found", id));
        };
        match self.engine.order_view(id).await {
            Ok(view) => ApiResponse::ok(200, &view),
            Err(e) => ApiResponse::from_error(&e),
        }
    }

    /// `POST /simulate/{id}`
    pub async fn simulate(&self, id: &str, body: Option<&str>) -> ApiResponse {
        let Some(id) = parse_id(id) else {
            return ApiResponse::error(404, format!("order {} not found", id));
        };

        let request: SimulateRequest = match body.map(str::trim).filter(|b| !b.is_empty()) {
            None => SimulateRequest::default(),
            Some(raw) => match serde_json::from_str(raw) {
                Ok(request) => request,
                Err(e) => return ApiResponse::error(400, format!("invalid payload: {}", e)),
            },
        };

        match self.run_simulation(id, &request).await {
            Ok(response) => ApiResponse::ok(200, &response),
            Err(e) => ApiResponse::from_error(&e),
        }
    }

    /// `GET /health`
    pub async fn health(&self) -> ApiResponse {
        ApiResponse::ok(200, &self.engine.health().await)
    }

    async fn place_order(&self, request: CreateOrderRequest) -> Result<Order> {
        let service_type: ServiceType = request.service_type.parse()?;
        let latency = request.latency_threshold()?;
        self.engine
            .create_order(&request.user_name, service_type, request.sla_uptime_pct, latency)
            .await
    }

    async fn run_simulation(&self, id: OrderId, request: &SimulateRequest) -> Result<SimulateResponse> {
        let samples = self.engine.simulate(id, request).await?;
        Ok(SimulateResponse {
            samples: samples.iter().map(MetricPoint::from).collect(),
            status: self.engine.status(id).await?,
        })
    }
}

fn parse_id(raw: &str) -> Option<OrderId> {
    raw.parse().ok()
}
