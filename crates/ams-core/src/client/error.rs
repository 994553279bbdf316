//! Printer client errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Not connected to printer")]
    NotConnected,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Subscription failed: {0}")]
    SubscribeFailed(String),
}
