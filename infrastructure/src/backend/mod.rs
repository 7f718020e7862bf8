//! HTTP adapter for the coaching backend's REST API

mod client;
mod dto;
mod error;

pub use client::HttpBackendClient;
pub use error::HttpClientError;
