pub mod orders;
pub mod products;

use actix_web::HttpResponse;

/// GET /
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service greeting")),
    tag = "meta"
)]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Welcome to the Order API!" }))
}

/// Fallback for every unmatched route.
pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not Found" }))
}
