use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, orders, products};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Order API",
        description = "Product catalog and order placement with VAT pricing"
    ),
    paths(
        handlers::home,
        products::list_products,
        orders::create_order,
        orders::get_order,
    ),
    components(schemas(
        products::ProductResponse,
        orders::CreateOrderRequest,
        orders::OrderItemRequest,
        orders::OrderResponse,
        orders::OrderItemResponse,
    )),
    tags(
        (name = "products", description = "Product catalog"),
        (name = "orders", description = "Order placement and retrieval"),
        (name = "meta", description = "Service metadata"),
    )
)]
pub struct ApiDoc;

/// Swagger UI at `/swagger-ui/`, backed by the generated document.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/products", "/order", "/orders/{id}"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
