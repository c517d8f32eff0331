use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
    /// HTTP-equivalent status reported by (or mapped from) the upstream provider.
    pub status: Option<u16>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{}] {} (status {})", self.code, self.message, status),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        env_var_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        network_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self.code {
            CODE_INVALID_INPUT => StatusCode::BAD_REQUEST,
            CODE_NO_ROUTE => StatusCode::NOT_FOUND,
            CODE_UPSTREAM_REJECTED | CODE_UPSTREAM_TRANSIENT => self
                .status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_message = match self.code {
            1..=3 | 5 => "Internal Server Error",
            _ => self.message.as_str(),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub const CODE_ENV_VAR: i32 = 1;
pub const CODE_NETWORK: i32 = 3;
pub const CODE_UPSTREAM_TRANSIENT: i32 = 4;
pub const CODE_UNEXPECTED: i32 = 5;
pub const CODE_INVALID_INPUT: i32 = 100;
pub const CODE_NO_ROUTE: i32 = 101;
pub const CODE_UPSTREAM_REJECTED: i32 = 102;

impl Error {
    pub fn is_invalid_input_error(&self) -> bool {
        self.code == CODE_INVALID_INPUT
    }

    pub fn is_network_error(&self) -> bool {
        self.code == CODE_NETWORK
    }

    pub fn is_upstream_transient_error(&self) -> bool {
        self.code == CODE_UPSTREAM_TRANSIENT
    }
}

pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error {
        code: CODE_INVALID_INPUT,
        message: message.into(),
        status: Some(400),
    }
}

pub fn no_route_error() -> Error {
    Error {
        code: CODE_NO_ROUTE,
        message: "no route found".into(),
        status: Some(404),
    }
}

pub fn upstream_rejected_error(status: u16, message: impl Into<String>) -> Error {
    Error {
        code: CODE_UPSTREAM_REJECTED,
        message: message.into(),
        status: Some(status),
    }
}

pub fn upstream_transient_error(status: u16, message: impl Into<String>) -> Error {
    Error {
        code: CODE_UPSTREAM_TRANSIENT,
        message: message.into(),
        status: Some(status),
    }
}

pub fn env_var_error(err: env::VarError) -> Error {
    Error {
        code: CODE_ENV_VAR,
        message: format!("environment variable error: {}", err),
        status: None,
    }
}

pub fn network_error(err: reqwest::Error) -> Error {
    Error {
        code: CODE_NETWORK,
        message: format!("network error: {}", err),
        status: err.status().map(|s| s.as_u16()),
    }
}

pub fn unexpected_error(message: impl Into<String>) -> Error {
    Error {
        code: CODE_UNEXPECTED,
        message: message.into(),
        status: None,
    }
}

/// Maps an HTTP-equivalent status into the error taxonomy.
pub fn from_status(status: u16, message: impl Into<String>) -> Error {
    match status {
        400 => invalid_input_error(message),
        404 => Error {
            message: message.into(),
            ..no_route_error()
        },
        429 | 500..=599 => upstream_transient_error(status, message),
        _ => upstream_rejected_error(status, message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::HttpBody;

    async fn respond(err: Error) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();

        let mut body = response.into_body();
        let mut bytes = Vec::new();
        while let Some(chunk) = body.data().await {
            bytes.extend_from_slice(&chunk.unwrap());
        }

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_taxonomy() {
        assert!(from_status(400, "bad").is_invalid_input_error());
        assert_eq!(from_status(404, "gone").code, CODE_NO_ROUTE);
        assert_eq!(from_status(403, "denied").code, CODE_UPSTREAM_REJECTED);
        assert!(from_status(429, "slow down").is_upstream_transient_error());
        assert!(from_status(503, "unavailable").is_upstream_transient_error());
    }

    #[test]
    fn rejected_error_keeps_upstream_status_and_message() {
        let err = upstream_rejected_error(403, "REQUEST_DENIED: key revoked");

        assert_eq!(err.status, Some(403));
        assert_eq!(
            err.to_string(),
            "[102] REQUEST_DENIED: key revoked (status 403)"
        );
    }

    #[tokio::test]
    async fn responses_carry_the_mapped_status() {
        let (status, body) = respond(invalid_input_error("latitude out of range")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "code": 100, "error": "latitude out of range" }));

        let (status, body) = respond(no_route_error()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], 101);

        let (status, body) = respond(upstream_rejected_error(403, "REQUEST_DENIED")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "REQUEST_DENIED");

        let (status, _) = respond(upstream_transient_error(429, "OVER_QUERY_LIMIT")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

        let (status, _) = respond(upstream_transient_error(503, "UNAVAILABLE")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn internal_failures_hide_their_message() {
        let network = Error {
            code: CODE_NETWORK,
            message: "network error: connection reset by 10.0.0.7".into(),
            status: None,
        };

        let (status, body) = respond(network).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "code": 3, "error": "Internal Server Error" }));

        let (status, body) = respond(unexpected_error("server error: addr in use")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
    }
}
