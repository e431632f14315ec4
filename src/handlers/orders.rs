use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::OrderService;
use crate::domain::order::{IncomingOrderItem, Receipt, ReceiptItem};
use crate::domain::ports::Executor;
use crate::errors::AppError;
use crate::money::serialize_as_number;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub product_id: i32,
    /// Whole units; must be positive.
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub product_id: i32,
    pub quantity: i32,
    /// Unit price at the time of ordering
    #[serde(serialize_with = "serialize_as_number")]
    #[schema(value_type = f64, example = 150.0)]
    pub price: BigDecimal,
    /// VAT for a single unit
    #[serde(serialize_with = "serialize_as_number")]
    #[schema(value_type = f64, example = 33.0)]
    pub vat: BigDecimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: String,
    #[serde(serialize_with = "serialize_as_number")]
    #[schema(value_type = f64, example = 1500.0)]
    pub order_price: BigDecimal,
    #[serde(serialize_with = "serialize_as_number")]
    #[schema(value_type = f64, example = 330.0)]
    pub order_vat: BigDecimal,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderItemRequest> for IncomingOrderItem {
    fn from(item: OrderItemRequest) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
        }
    }
}

impl From<ReceiptItem> for OrderItemResponse {
    fn from(item: ReceiptItem) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price,
            vat: item.vat,
        }
    }
}

impl From<Receipt> for OrderResponse {
    fn from(receipt: Receipt) -> Self {
        Self {
            order_id: receipt.order_id,
            order_price: receipt.order_price,
            order_vat: receipt.order_vat,
            items: receipt.items.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /order
///
/// Prices the requested items against the catalog and stores the order. The
/// header, every line item and the final totals are written in one
/// transaction; on any error nothing is persisted.
#[utoipa::path(
    post,
    path = "/order",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Empty item list, non-positive quantity or malformed body"),
        (status = 404, description = "Unknown product id"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order<E: Executor>(
    service: web::Data<OrderService<E>>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let items: Vec<IncomingOrderItem> = body.into_inner().items.into_iter().map(Into::into).collect();

    let receipt = web::block(move || service.create_order(&items)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(receipt)))
}

/// GET /orders/{id}
///
/// Returns the order totals together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = String, Path, description = "Order id returned on creation"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order<E: Executor>(
    service: web::Data<OrderService<E>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let receipt = web::block(move || service.get_order(&order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(receipt)))
}
