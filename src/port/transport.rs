//! Outbound transport port used by the dispatcher.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Method;

/// A fully built request, ready for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

/// Raw response as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status_code: u16,
    pub body: String,
}

/// Failures before a response was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Performs one request/response exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        request: &TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}
