use thiserror::Error;

/// Failures raised by an executor or by the stores built on top of it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
    #[error("scan error: {0}")]
    Scan(String),
    #[error("statement {0} is not supported here")]
    UnsupportedStatement(&'static str),
    #[error("transaction is already closed")]
    TransactionClosed,
    #[error("database error: {0}")]
    Database(String),
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Order must contain at least one item")]
    EmptyOrder,
    #[error("Quantity for product {product_id} must be positive")]
    InvalidQuantity { product_id: i32 },
    #[error("Product with ID {0} not found")]
    ProductNotFound(i32),
    #[error("Order not found")]
    OrderNotFound,
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl DomainError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        DomainError::Store {
            context: context.into(),
            source,
        }
    }
}
