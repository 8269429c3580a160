// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::CryptoError;

/// Wire shape of every error body: `{error, detail?}` for 4xx, a generic
/// message for 5xx. The expiry fields ride along on 410 responses only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    /// Missing field or malformed input
    InvalidRequest(String),
    /// Proof-of-work check failed
    PowFailed,
    /// Admin token mismatch
    Unauthorized,
    /// Unknown msg_id, user, or receiver
    NotFound(String),
    /// Commitment replay
    DuplicateCommitment,
    /// Read after expiry: the DEK is destroyed, content is unrecoverable
    Gone {
        msg_id: String,
        expiry: Option<DateTime<Utc>>,
    },
    /// Admin endpoints refused because no ADMIN_TOKEN is configured
    AdminDisabled,
    /// I/O failure, entropy failure, or authentication failure on unwrap
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) | ApiError::PowFailed => 400,
            ApiError::Unauthorized => 401,
            ApiError::NotFound(_) => 404,
            ApiError::DuplicateCommitment => 409,
            ApiError::Gone { .. } => 410,
            ApiError::Internal(_) => 500,
            ApiError::AdminDisabled => 503,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let (error, detail, msg_id, expiry) = match self {
            ApiError::InvalidRequest(msg) => ("Invalid request".to_string(), Some(msg.clone()), None, None),
            ApiError::PowFailed => (
                "Proof-of-Work verification failed".to_string(),
                None,
                None,
                None,
            ),
            ApiError::Unauthorized => ("Unauthorized".to_string(), None, None, None),
            ApiError::NotFound(msg) => ("Not found".to_string(), Some(msg.clone()), None, None),
            ApiError::DuplicateCommitment => (
                "Commitment already used".to_string(),
                Some("duplicate submission rejected".to_string()),
                None,
                None,
            ),
            ApiError::Gone { msg_id, expiry } => (
                "Content expired".to_string(),
                Some(
                    "The encryption key for this message has been destroyed. \
                     The content is permanently unrecoverable — even by the server."
                        .to_string(),
                ),
                Some(msg_id.clone()),
                *expiry,
            ),
            ApiError::AdminDisabled => (
                "Admin access not configured".to_string(),
                Some("Set the ADMIN_TOKEN environment variable before starting the node".to_string()),
                None,
                None,
            ),
            // 5xx bodies stay generic; the real cause goes to the log
            ApiError::Internal(_) => ("Internal server error".to_string(), None, None, None),
        };

        ErrorResponse {
            error,
            detail,
            msg_id,
            expiry,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::PowFailed => write!(f, "Proof-of-Work verification failed"),
            ApiError::Unauthorized => write!(f, "Unauthorized"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DuplicateCommitment => write!(f, "Commitment already used"),
            ApiError::Gone { msg_id, .. } => write!(f, "Content expired for msg_id {}", msg_id),
            ApiError::AdminDisabled => write!(f, "Admin access not configured"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", err))
    }
}

// Tag mismatches and malformed envelopes on live records imply corruption;
// none of them may surface as success or as a client error.
impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
