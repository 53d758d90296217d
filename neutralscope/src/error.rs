use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, RelayError>;

/// Failures of a single relay run, each mapped to one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("query parameter \"q\" is missing or empty")]
    BadRequest,

    #[error("news service returned no articles")]
    NotFound,

    #[error("{service} request failed: {detail}")]
    Upstream { service: &'static str, detail: String },

    #[error("{service} request timed out after {seconds}s")]
    UpstreamTimeout { service: &'static str, seconds: u64 },

    #[error("completion service returned no message content")]
    NoContent,

    #[error("model output rejected: {reason}")]
    MalformedResponse { reason: String, raw: String },
}

/// JSON body sent for every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            raw: None,
        }
    }
}

impl RelayError {
    pub fn upstream(service: &'static str, detail: impl std::fmt::Display) -> Self {
        RelayError::Upstream {
            service,
            detail: detail.to_string(),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            RelayError::BadRequest => Status::BadRequest,
            RelayError::NotFound => Status::NotFound,
            RelayError::UpstreamTimeout { .. } => Status::GatewayTimeout,
            RelayError::Upstream { .. }
            | RelayError::NoContent
            | RelayError::MalformedResponse { .. } => Status::InternalServerError,
        }
    }

    /// Client-facing body. Upstream details stay in the logs; only malformed model
    /// output is echoed back so the UI can show what the model actually said.
    pub fn body(&self) -> ErrorBody {
        match self {
            RelayError::BadRequest => ErrorBody::new("Query parameter \"q\" is required."),
            RelayError::NotFound => ErrorBody::new("No articles found for this topic."),
            RelayError::UpstreamTimeout { .. } => ErrorBody::new("Upstream service timed out."),
            RelayError::Upstream { .. } | RelayError::NoContent => {
                ErrorBody::new("Internal server error.")
            }
            RelayError::MalformedResponse { raw, .. } => ErrorBody {
                error: "Failed to parse model response.".to_string(),
                raw: Some(raw.clone()),
            },
        }
    }
}

impl<'r> Responder<'r, 'static> for RelayError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        match self.status().code {
            400..=499 => tracing::warn!(error = %self, "request rejected"),
            _ => tracing::error!(error = %self, "request failed"),
        }
        (self.status(), Json(self.body())).respond_to(req)
    }
}
