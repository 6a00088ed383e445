use std::fmt::{Display, Formatter};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CONNECT_FAILURE_MESSAGE: &str =
    "Could not connect to the server. Please try again later.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error payload returned by the backend, normalized from the several shapes
/// its `detail` field takes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ErrorDetail {
    Message(String),
    ValidationErrors(Vec<FieldError>),
}

impl ErrorDetail {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    pub fn from_body(body: &str) -> Option<Self> {
        let value = serde_json::from_str::<Value>(body).ok()?;
        Self::from_detail(value.get("detail")?)
    }

    pub fn from_detail(detail: &Value) -> Option<Self> {
        match detail {
            Value::String(text) if !text.trim().is_empty() => Some(Self::Message(text.clone())),
            Value::Array(items) => {
                let errors = items.iter().filter_map(field_error).collect::<Vec<_>>();
                if errors.is_empty() {
                    None
                } else {
                    Some(Self::ValidationErrors(errors))
                }
            }
            Value::Object(_) => Some(Self::Message(detail.to_string())),
            _ => None,
        }
    }
}

impl Display for ErrorDetail {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Message(text) => write!(f, "{text}"),
            Self::ValidationErrors(errors) => {
                let joined = errors
                    .iter()
                    .map(|e| {
                        if e.field.is_empty() {
                            e.message.clone()
                        } else {
                            format!("{}: {}", e.field, e.message)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                write!(f, "{joined}")
            }
        }
    }
}

fn field_error(item: &Value) -> Option<FieldError> {
    if let Some(text) = item.as_str() {
        return Some(FieldError {
            field: String::new(),
            message: text.to_string(),
        });
    }
    let object = item.as_object()?;
    let message = object.get("msg").and_then(Value::as_str)?.to_string();
    let field = object
        .get("loc")
        .and_then(Value::as_array)
        .map(|loc| {
            loc.iter()
                .skip_while(|segment| segment.as_str() == Some("body"))
                .map(|segment| match segment {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_default();
    Some(FieldError { field, message })
}

pub fn status_message(status: StatusCode) -> String {
    match status {
        StatusCode::UNAUTHORIZED => "Not authenticated. Please log in again.".to_string(),
        StatusCode::FORBIDDEN => "You are not authorized to perform this action.".to_string(),
        StatusCode::NOT_FOUND => "The requested resource was not found.".to_string(),
        other => format!("Request failed with status {}", other.as_u16()),
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Could not connect to the server. Please try again later.")]
    Connect(#[source] reqwest::Error),
    #[error("{}", describe_status(.status, .detail))]
    Status {
        status: StatusCode,
        detail: Option<ErrorDetail>,
    },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("not signed in")]
    MissingToken,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::Status { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.to_string(),
            Self::Connect(_) => CONNECT_FAILURE_MESSAGE.to_string(),
            _ => fallback.to_string(),
        }
    }
}

fn describe_status(status: &StatusCode, detail: &Option<ErrorDetail>) -> String {
    match detail {
        Some(detail) => detail.to_string(),
        None => status_message(*status),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::{ApiError, ErrorDetail, FieldError};

    #[test]
    fn string_detail_becomes_message() {
        let body = json!({ "detail": "Employee ID 4 is already allocated to this project" });
        let detail = ErrorDetail::from_body(&body.to_string());
        assert_eq!(
            detail,
            Some(ErrorDetail::message(
                "Employee ID 4 is already allocated to this project"
            ))
        );
    }

    #[test]
    fn validation_array_becomes_field_errors() {
        let body = json!({
            "detail": [
                { "loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error" },
                { "loc": ["body", "skill_requirements", 0, "skill_id"], "msg": "field required", "type": "missing" }
            ]
        });
        let detail = ErrorDetail::from_body(&body.to_string()).expect("missing detail");
        assert_eq!(
            detail,
            ErrorDetail::ValidationErrors(vec![
                FieldError {
                    field: "email".to_string(),
                    message: "value is not a valid email address".to_string(),
                },
                FieldError {
                    field: "skill_requirements.0.skill_id".to_string(),
                    message: "field required".to_string(),
                },
            ])
        );
        assert!(detail.to_string().contains("email: value is not a valid email address"));
    }

    #[test]
    fn object_detail_is_stringified() {
        let body = json!({ "detail": { "reason": "conflict" } });
        let detail = ErrorDetail::from_body(&body.to_string());
        assert_eq!(
            detail,
            Some(ErrorDetail::message(r#"{"reason":"conflict"}"#))
        );
    }

    #[test]
    fn missing_detail_uses_status_fallback() {
        let detail = ErrorDetail::from_body("<html>oops</html>");
        assert!(detail.is_none());

        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail,
        };
        assert_eq!(err.to_string(), "Request failed with status 500");
        assert_eq!(
            err.user_message("Failed to allocate employees"),
            "Failed to allocate employees"
        );
    }

    #[test]
    fn backend_message_is_preferred_over_fallback() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            detail: Some(ErrorDetail::message(
                "Employee Ana does not have sufficient availability",
            )),
        };
        assert_eq!(
            err.user_message("Failed to allocate employees"),
            "Employee Ana does not have sufficient availability"
        );
    }
}
