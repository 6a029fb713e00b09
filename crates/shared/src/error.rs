use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by XRPC endpoints on a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrpcErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.display_message())]
pub struct XrpcException {
    pub status: u16,
    pub error: String,
    pub message: Option<String>,
}

impl XrpcException {
    pub fn new(status: u16, body: XrpcErrorBody) -> Self {
        Self {
            status,
            error: body.error,
            message: body.message,
        }
    }

    /// Builds an exception for a response whose body was not an XRPC error.
    pub fn from_status(status: u16, raw_body: &str) -> Self {
        let raw_body = raw_body.trim();
        Self {
            status,
            error: format!("HTTP {status}"),
            message: (!raw_body.is_empty()).then(|| raw_body.to_string()),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.error == "AuthenticationRequired" || self.error == "ExpiredToken"
    }

    fn display_message(&self) -> &str {
        match &self.message {
            Some(message) if !message.is_empty() => message,
            _ => &self.error,
        }
    }
}
