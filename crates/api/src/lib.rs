//! HTTP API: routing, bearer-token middleware and request/response mapping.

pub mod app;
pub mod middleware;
