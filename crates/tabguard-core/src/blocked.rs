//! Token handed to the blocked-page for a cancelled top-level navigation.
//!
//! The token is JSON encoded with URL-safe base64, so it can sit in a query
//! string unescaped. Only the receiving page interprets it.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason code for a block decided by the policy oracle.
pub const POLICY_REASON: &str = "?";

/// Token errors.
#[derive(Debug, Error)]
pub enum BlockedDetailsError {
    /// The token is not valid base64.
    #[error("invalid token encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The decoded token is not the expected JSON.
    #[error("invalid token payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for token operations.
pub type Result<T> = std::result::Result<T, BlockedDetailsError>;

/// What was blocked and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDetails {
    /// URL of the blocked navigation.
    pub url: String,
    /// Destination hostname.
    pub hn: String,
    /// Reason code.
    pub why: String,
}

impl BlockedDetails {
    /// Details for a navigation blocked by policy.
    pub fn new(url: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            hn: hostname.into(),
            why: POLICY_REASON.to_string(),
        }
    }

    /// Encodes the details as an opaque token.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    /// Decodes a token produced by [`BlockedDetails::encode`].
    pub fn decode(token: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD.decode(token.trim())?;
        Ok(serde_json::from_slice(&json)?)
    }
}
