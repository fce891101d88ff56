use serde::Deserialize;
use thiserror::Error;

use crate::sdk::util::rate_limit::LimitWindow;

// Helper structs to parse the JSON error payloads returned by routing vendors
#[derive(Deserialize, Debug)]
pub struct VendorErrorDetail {
    pub code: u32,
    pub message: String,
}
#[derive(Deserialize, Debug)]
pub struct VendorErrorPayload {
    pub error: VendorErrorDetail,
}

/// Errors raised by a single travel-time or stop-lookup provider call.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Routing rate limit exceeded ({window} quota exhausted)")]
    RateLimitExceeded { window: LimitWindow },

    #[error("Provider quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Provider rejected credentials: {0}")]
    Unauthorized(String),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Malformed request (Code {code}): {message}")]
    MalformedRequest { code: u32, message: String },

    // This variant holds the structured error from the API
    #[error("API Error (Code {code}): {message}")]
    ApiError { code: u32, message: String },

    // A fallback for when we get an error that isn't in the expected JSON format
    #[error("Unstructured API Error: {0}")]
    RawApiError(String),

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Response did not match the expected shape: {0}")]
    MalformedResponse(String),

    #[error("Request exceeds provider batch limits: {0}")]
    BatchLimit(String),
}

impl RoutingError {
    /// True for failures scoped to one call (network, timeout, server-side
    /// hiccups, garbled bodies). Other failures will repeat on every call.
    pub fn is_transient(&self) -> bool {
        match self {
            RoutingError::RequestError(_)
            | RoutingError::ParseError(_)
            | RoutingError::MalformedResponse(_)
            | RoutingError::RawApiError(_) => true,
            RoutingError::ApiError { code, .. } => *code >= 500,
            _ => false,
        }
    }

    /// Classifies a non-success HTTP response into the error taxonomy,
    /// preferring the vendor's structured payload when the body has one.
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<VendorErrorPayload>(body)
            .ok()
            .map(|payload| payload.error);
        let message = detail
            .as_ref()
            .map(|d| d.message.clone())
            .unwrap_or_else(|| body.to_string());

        match status {
            400 | 422 => RoutingError::MalformedRequest {
                code: detail.map(|d| d.code).unwrap_or(status as u32),
                message,
            },
            401 | 403 => RoutingError::Unauthorized(message),
            429 => RoutingError::QuotaExceeded(message),
            _ => match detail {
                Some(d) => RoutingError::ApiError {
                    code: status as u32,
                    message: format!("{} (vendor code {})", d.message, d.code),
                },
                None => {
                    log::error!(
                        "API returned non-success status: {}. Unparseable Body: {}",
                        status,
                        body
                    );
                    RoutingError::RawApiError(format!("HTTP {}: {}", status, body))
                }
            },
        }
    }
}

/// Errors surfaced by the meet-point pipeline to its caller.
#[derive(Error, Debug)]
pub enum MeetpointError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid optimization criterion '{0}': expected 'minisum' or 'minimax'")]
    InvalidCriterion(String),

    #[error("Routing rate limit exceeded ({0} quota exhausted), retry later")]
    RateLimitExceeded(LimitWindow),

    #[error("Travel-time provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl From<RoutingError> for MeetpointError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::RateLimitExceeded { window } => MeetpointError::RateLimitExceeded(window),
            other => MeetpointError::ProviderUnavailable(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_bad_request_is_malformed_request() {
        let body = r#"{"error":{"code":6003,"message":"Request parameters exceed the server configuration limits"}}"#;
        match RoutingError::from_response(400, body) {
            RoutingError::MalformedRequest { code, message } => {
                assert_eq!(code, 6003);
                assert!(message.contains("exceed"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_status_classes_are_distinct() {
        assert!(matches!(
            RoutingError::from_response(429, "slow down"),
            RoutingError::QuotaExceeded(_)
        ));
        assert!(matches!(
            RoutingError::from_response(403, "bad key"),
            RoutingError::Unauthorized(_)
        ));
        let server = RoutingError::from_response(502, "<html>bad gateway</html>");
        assert!(matches!(server, RoutingError::RawApiError(_)));
        assert!(server.is_transient());
        assert!(!RoutingError::Unauthorized("x".into()).is_transient());
    }

    #[test]
    fn test_rate_limit_maps_to_pipeline_rate_limit() {
        let err: MeetpointError = RoutingError::RateLimitExceeded {
            window: LimitWindow::Minute,
        }
        .into();
        assert!(matches!(err, MeetpointError::RateLimitExceeded(LimitWindow::Minute)));

        let err: MeetpointError = RoutingError::MissingCredentials("ORS_API_KEY".into()).into();
        assert!(matches!(err, MeetpointError::ProviderUnavailable(_)));
    }
}
