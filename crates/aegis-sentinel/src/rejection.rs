//! Mapping failed validations to client-error responses.

use std::fmt;

use http::StatusCode;
use serde::Serialize;

use crate::error::ValidationError;

/// Why a request was turned away before reaching business logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRejection {
    /// The method is not in the endpoint's allowed set.
    MethodNotAllowed {
        /// Always the single `method` error.
        errors: Vec<ValidationError>,
    },
    /// The method is allowed but the request does not fit its shape.
    ShapeViolation {
        /// Every recorded error, in discovery order.
        errors: Vec<ValidationError>,
    },
}

/// Serializable response body for a rejection.
#[derive(Debug, Clone, Serialize)]
pub struct RejectionBody<'a> {
    /// Machine-readable rejection code.
    pub error: &'static str,
    /// The validation errors.
    pub errors: &'a [ValidationError],
}

impl RequestRejection {
    /// HTTP status for the response.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::ShapeViolation { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::ShapeViolation { .. } => "shape_violation",
        }
    }

    /// The validation errors behind the rejection.
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::MethodNotAllowed { errors } | Self::ShapeViolation { errors } => errors,
        }
    }

    /// Response body to send to the client.
    pub fn body(&self) -> RejectionBody<'_> {
        RejectionBody {
            error: self.code(),
            errors: self.errors(),
        }
    }
}

impl fmt::Display for RequestRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodNotAllowed { .. } => write!(f, "method not allowed"),
            Self::ShapeViolation { errors } => {
                write!(f, "request shape violation: {} error(s)", errors.len())
            }
        }
    }
}

impl std::error::Error for RequestRejection {}
