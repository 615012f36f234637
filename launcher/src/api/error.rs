//! Error responses and caller identity

use crate::core::{ErrorClass, LaunchError, StorageError};
use alloy_primitives::Address;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, error};

/// Header carrying the caller identity resolved by the identity layer
pub const CALLER_HEADER: &str = "x-caller-address";

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_mutated: Option<bool>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                class: Some(ErrorClass::Validation),
                step: None,
                state_mutated: None,
            },
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorBody {
                error: message.into(),
                class: None,
                step: None,
                state_mutated: None,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

fn status_for(err: &LaunchError) -> StatusCode {
    match err {
        LaunchError::UnknownInfluencer(_) | LaunchError::NotFound(_) => StatusCode::NOT_FOUND,
        LaunchError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        LaunchError::Storage(
            StorageError::Corrupt(_) | StorageError::Serialization(_) | StorageError::MigrationFailed(_),
        ) => StatusCode::INTERNAL_SERVER_ERROR,
        LaunchError::Bootstrap(failure) => status_for(&failure.source),
        other => match other.class() {
            ErrorClass::Validation => StatusCode::BAD_REQUEST,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorClass::Fatal => StatusCode::UNPROCESSABLE_ENTITY,
        },
    }
}

impl From<LaunchError> for ApiError {
    fn from(err: LaunchError) -> Self {
        let status = status_for(&err);
        let (step, state_mutated) = match &err {
            LaunchError::Bootstrap(failure) => (Some(failure.step.as_str().to_string()), Some(failure.state_mutated)),
            _ => (None, None),
        };

        if status.is_server_error() {
            error!(status = %status, error = %err, "Request failed");
        } else {
            debug!(status = %status, error = %err, "Request rejected");
        }

        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                class: Some(err.class()),
                step,
                state_mutated,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn parse_address(raw: &str) -> Result<Address, ApiError> {
    Address::from_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("invalid address: {}", raw)))
}

/// Identity of the caller, taken from `x-caller-address`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub Address);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(CALLER_HEADER)
            .ok_or_else(|| ApiError::unauthenticated(format!("missing {} header", CALLER_HEADER)))?
            .to_str()
            .map_err(|_| ApiError::unauthenticated(format!("malformed {} header", CALLER_HEADER)))?;
        let caller = Address::from_str(raw.trim())
            .map_err(|_| ApiError::unauthenticated(format!("malformed {} header", CALLER_HEADER)))?;
        Ok(Caller(caller))
    }
}
