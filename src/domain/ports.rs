use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use super::errors::StoreError;
use super::row::Row;

/// The logical operations every backend understands.
///
/// A relational backend turns these into parameterized queries against the
/// `products`, `orders` and `order_items` tables; the in-memory backend
/// interprets them directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `query_one` -> `(id, name, price, vat_rate)`
    FetchProduct { id: i32 },
    /// `query_many` -> `(id, name, price, vat_rate)` ordered by id
    ListProducts,
    /// `exec`, fails if the order id is taken
    InsertOrder {
        order_id: String,
        total_price: BigDecimal,
        vat_amount: BigDecimal,
        created_at: DateTime<Utc>,
    },
    /// `exec`, affects 0 rows when the order does not exist
    UpdateOrderTotals {
        order_id: String,
        total_price: BigDecimal,
        vat_amount: BigDecimal,
    },
    /// `query_one` -> `(item_id,)`
    InsertOrderItem {
        order_id: String,
        product_id: i32,
        quantity: i32,
        unit_price: BigDecimal,
        item_vat: BigDecimal,
    },
    /// `query_one` -> `(order_id, total_price, vat_amount, created_at)`
    FetchOrder { order_id: String },
    /// `query_many` -> `(item_id, order_id, product_id, quantity, unit_price, item_vat)`
    /// in insertion order
    FetchOrderItems { order_id: String },
}

impl Statement {
    pub fn name(&self) -> &'static str {
        match self {
            Statement::FetchProduct { .. } => "fetch_product",
            Statement::ListProducts => "list_products",
            Statement::InsertOrder { .. } => "insert_order",
            Statement::UpdateOrderTotals { .. } => "update_order_totals",
            Statement::InsertOrderItem { .. } => "insert_order_item",
            Statement::FetchOrder { .. } => "fetch_order",
            Statement::FetchOrderItems { .. } => "fetch_order_items",
        }
    }
}

/// Read access, either autocommit or inside a transaction.
pub trait Session {
    fn query_one(&mut self, statement: &Statement) -> Result<Option<Row>, StoreError>;
    fn query_many(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError>;
}

/// A unit of work. Nothing it writes is visible to other sessions before
/// `commit`.
///
/// `rollback` is idempotent: it succeeds after `commit`, after an earlier
/// rollback, and after a failed statement.
pub trait Transaction: Session {
    /// Returns the number of affected rows.
    fn exec(&mut self, statement: &Statement) -> Result<u64, StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
    fn rollback(&mut self) -> Result<(), StoreError>;
}

pub trait Executor: Send + Sync + 'static {
    type Session: Session;
    type Transaction: Transaction;

    fn session(&self) -> Result<Self::Session, StoreError>;
    fn begin(&self) -> Result<Self::Transaction, StoreError>;
}
