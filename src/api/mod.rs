//! API Module
//!
//! JSON request handling for the order, query and simulation routes:
//! - `POST /orders`, `GET /orders`, `GET /orders/{id}`
//! - `POST /simulate/{id}`
//! - `GET /health`

pub mod handlers;

pub use handlers::{parse_request_line, ApiResponse, ApiService, RequestLine, STORAGE_UNAVAILABLE};
