use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::EmptyOrder | DomainError::InvalidQuantity { .. } => {
                AppError::BadRequest(e.to_string())
            }
            DomainError::ProductNotFound(_) | DomainError::OrderNotFound => {
                AppError::NotFound(e.to_string())
            }
            DomainError::Store { .. } => AppError::Internal(e.to_string()),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::BadRequest(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::NotFound(_) => HttpResponse::NotFound().json(serde_json::json!({
                "error": self.to_string()
            })),
            AppError::Internal(cause) => {
                log::error!("request failed: {}", cause);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "Internal server error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::StoreError;
    use actix_web::ResponseError;

    #[test]
    fn bad_request_returns_400() {
        let resp = AppError::BadRequest("nope".to_string()).error_response();
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_returns_404() {
        let resp = AppError::NotFound("Order not found".to_string()).error_response();
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_error_returns_500() {
        let err = AppError::Internal("something went wrong".to_string());
        assert_eq!(
            err.error_response().status(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_display() {
        assert_eq!(
            AppError::Internal("msg".to_string()).to_string(),
            "Internal error: msg"
        );
    }

    #[test]
    fn validation_errors_map_to_bad_request() {
        let empty: AppError = DomainError::EmptyOrder.into();
        assert!(matches!(empty, AppError::BadRequest(ref m) if m == "Order must contain at least one item"));

        let quantity: AppError = DomainError::InvalidQuantity { product_id: 4 }.into();
        assert!(matches!(quantity, AppError::BadRequest(ref m) if m == "Quantity for product 4 must be positive"));
    }

    #[test]
    fn missing_product_maps_to_not_found_with_id() {
        let app_err: AppError = DomainError::ProductNotFound(999).into();
        assert!(matches!(app_err, AppError::NotFound(ref m) if m == "Product with ID 999 not found"));
    }

    #[test]
    fn missing_order_maps_to_not_found() {
        let app_err: AppError = DomainError::OrderNotFound.into();
        assert!(matches!(app_err, AppError::NotFound(ref m) if m == "Order not found"));
    }

    #[test]
    fn store_failure_maps_to_internal_with_context() {
        let app_err: AppError =
            DomainError::store("fetching order x", StoreError::Unavailable("pool timed out".to_string()))
                .into();
        assert!(matches!(
            app_err,
            AppError::Internal(ref m) if m == "fetching order x: store unavailable: pool timed out"
        ));
    }
}
