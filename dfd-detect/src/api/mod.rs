//! HTTP API handlers for dfd-detect
//!
//! JSON endpoints for every workflow operation, an SSE event stream and a
//! health check.

pub mod detection;
pub mod health;
pub mod sse;

pub use detection::detection_routes;
pub use health::health_routes;
pub use sse::event_stream;
