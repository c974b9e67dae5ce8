//! Failure conditions of the lookup endpoint.
//!
//! Every variant is terminal for the request that raised it and maps to a
//! single HTTP status. The `Display` text is the message the client sees.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the provider rejects a query without giving a reason.
pub const GENERIC_REJECTION: &str = "IP 조회에 실패했습니다";

#[derive(Debug, Error)]
pub enum LookupError {
  /// The `ip` query parameter was absent or empty.
  #[error("IP 주소가 필요합니다")]
  MissingParameter,

  /// The provider answered with a non-success status.
  #[error("IP 정보를 가져올 수 없습니다")]
  UpstreamError { status: reqwest::StatusCode },

  /// The provider body could not be parsed.
  #[error("서버 응답을 처리할 수 없습니다")]
  MalformedUpstreamResponse(#[source] serde_json::Error),

  /// The provider parsed the request but flagged it as an error.
  #[error("{}", .reason.as_deref().unwrap_or(GENERIC_REJECTION))]
  ProviderRejected { reason: Option<String> },

  /// Anything else: connection failures, timeouts, unreadable bodies.
  #[error("IP 조회 중 오류가 발생했습니다")]
  UnexpectedFailure(#[source] reqwest::Error),
}

impl LookupError {
  #[must_use]
  pub const fn status(&self) -> StatusCode {
    match self {
      Self::MissingParameter
      | Self::UpstreamError { .. }
      | Self::ProviderRejected { .. } => StatusCode::BAD_REQUEST,
      Self::MalformedUpstreamResponse(_) | Self::UnexpectedFailure(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  /// Short machine-friendly name, used in log events.
  #[must_use]
  pub const fn kind(&self) -> &'static str {
    match self {
      Self::MissingParameter => "missing_parameter",
      Self::UpstreamError { .. } => "upstream_error",
      Self::MalformedUpstreamResponse(_) => "malformed_upstream_response",
      Self::ProviderRejected { .. } => "provider_rejected",
      Self::UnexpectedFailure(_) => "unexpected_failure",
    }
  }
}

/// Error payload shared by the endpoint and its callers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorBody {
  pub error: String,
}

impl IntoResponse for LookupError {
  fn into_response(self) -> Response {
    let body = ErrorBody {
      error: self.to_string(),
    };
    (self.status(), Json(body)).into_response()
  }
}
