//! API error mapping.
//!
//! Every handler returns `Result<_, ApiError>`. The `IntoResponse` impl
//! serializes errors as `{ "code": "...", "message": "..." }` with the
//! matching HTTP status:
//!
//! | Condition                          | Status | Code              |
//! |------------------------------------|--------|-------------------|
//! | Input validation failed            | 400    | `validation`      |
//! | Resource missing / soft-deleted    | 404    | `not_found`       |
//! | Duplicate SKU / budget slot        | 409    | `duplicate`       |
//! | Business rule (stock, payments...) | 422    | `business_rule`   |
//! | Storage / unexpected               | 500    | `internal`        |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use khata_core::{CoreError, ValidationError};
use khata_db::DbError;

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// A business rule rejected the request (insufficient stock, bad
    /// payment, protected walk-in customer, ...).
    #[error(transparent)]
    BusinessRule(CoreError),

    #[error("internal error")]
    Internal(#[source] DbError),
}

/// The JSON body every error response carries.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Duplicate { .. } => StatusCode::CONFLICT,
            ApiError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Duplicate { .. } => "duplicate",
            ApiError::BusinessRule(_) => "business_rule",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::NotFound { entity, id },
            DbError::UniqueViolation { field, value } => ApiError::Duplicate { field, value },
            DbError::Domain(core) => match core {
                // Domain lookups that failed are 404s, not rule violations
                CoreError::ProductNotFound(id) => ApiError::NotFound {
                    entity: "Product".to_string(),
                    id,
                },
                CoreError::SaleNotFound(id) => ApiError::NotFound {
                    entity: "Sale".to_string(),
                    id,
                },
                CoreError::CustomerNotFound(id) => ApiError::NotFound {
                    entity: "Customer".to_string(),
                    id,
                },
                CoreError::ShopNotFound(id) => ApiError::NotFound {
                    entity: "Shop".to_string(),
                    id,
                },
                CoreError::Validation(v) => ApiError::Validation(v),
                other => ApiError::BusinessRule(other),
            },
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal errors keep their detail in the log, not the response
        let message = match &self {
            ApiError::Internal(source) => {
                error!(error = %source, "Request failed with internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            code: self.code(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_not_found_maps_to_404() {
        let err: ApiError =
            DbError::Domain(CoreError::ProductNotFound("p1".to_string())).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_insufficient_stock_maps_to_422() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientStock {
            product: "p1".to_string(),
            available: 1,
            requested: 5,
        })
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "business_rule");
    }

    #[test]
    fn test_validation_maps_to_400() {
        let err: ApiError = ValidationError::EmptySale.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unique_violation_maps_to_409() {
        let err: ApiError = DbError::UniqueViolation {
            field: "sku".to_string(),
            value: "RICE".to_string(),
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
