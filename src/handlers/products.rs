use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::OrderService;
use crate::domain::order::Product;
use crate::domain::ports::Executor;
use crate::errors::AppError;
use crate::money::serialize_as_number;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    #[serde(serialize_with = "serialize_as_number")]
    #[schema(value_type = f64, example = 1499.99)]
    pub price: BigDecimal,
    /// Fraction, e.g. 0.22 for 22%
    #[serde(serialize_with = "serialize_as_number")]
    #[schema(value_type = f64, example = 0.22)]
    pub vat_rate: BigDecimal,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            name: p.name,
            price: p.price,
            vat_rate: p.vat_rate,
        }
    }
}

/// GET /products
///
/// Lists the whole catalog, ordered by id.
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Product catalog", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "products"
)]
pub async fn list_products<E: Executor>(
    service: web::Data<OrderService<E>>,
) -> Result<HttpResponse, AppError> {
    let products = web::block(move || service.list_products()).await??;

    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}
