use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error_codes::ErrorCode;

/// The request envelope every line of input decodes into before dispatch.
///
/// `data` is kept as a free-form [`Value`] at this layer and re-decoded into a
/// typed struct per `(type, action)` pair by the handler — see §9 of the design
/// notes ("heterogeneous `data` field").
#[derive(Debug, Clone, Deserialize)]
pub struct RawRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

/// The response envelope every line of output is serialized from.
#[derive(Debug, Clone, Serialize)]
pub struct RawResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RawResponse {
    pub fn ok(kind: impl Into<String>, action: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            kind: kind.into(),
            action: action.into(),
            status: Status::Ok,
            data: Some(serde_json::to_value(data).unwrap_or(Value::Null)),
            error: None,
        }
    }

    /// An `ok` response with no payload.
    pub fn ok_empty(kind: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            action: action.into(),
            status: Status::Ok,
            data: Some(Value::Object(serde_json::Map::new())),
            error: None,
        }
    }

    pub fn err(kind: impl Into<String>, action: impl Into<String>, code: ErrorCode) -> Self {
        Self::err_with(kind, action, code, code.default_message().to_string())
    }

    pub fn err_with(
        kind: impl Into<String>,
        action: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            action: action.into(),
            status: Status::Error,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
            }),
        }
    }
}

/// A typed error that carries enough information to become a [`RawResponse`].
///
/// Handlers return `Result<impl Serialize, RpcError>`; the dispatcher attaches
/// `kind`/`action` once at the point it knows them.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
}

impl RpcError {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn into_response(self, kind: impl Into<String>, action: impl Into<String>) -> RawResponse {
        RawResponse::err_with(kind, action, self.code, self.message)
    }
}

impl From<ErrorCode> for RpcError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}
