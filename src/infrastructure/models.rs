use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::row::{Row, Value};
use crate::schema::{order_items, orders, products};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub vat_rate: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(primary_key(order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub order_id: String,
    pub total_price: BigDecimal,
    pub vat_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow<'a> {
    pub order_id: &'a str,
    pub total_price: &'a BigDecimal,
    pub vat_amount: &'a BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_items)]
#[diesel(primary_key(item_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub item_id: i32,
    pub order_id: String,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub item_vat: BigDecimal,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow<'a> {
    pub order_id: &'a str,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: &'a BigDecimal,
    pub item_vat: &'a BigDecimal,
}

// ── Row conversions ──────────────────────────────────────────────────────────
// Column order matches the statement documentation on `Statement`.

impl From<ProductRow> for Row {
    fn from(p: ProductRow) -> Self {
        Row::new(vec![
            Value::Int(p.id),
            Value::Text(p.name),
            Value::Decimal(p.price),
            Value::Decimal(p.vat_rate),
        ])
    }
}

impl From<OrderRow> for Row {
    fn from(o: OrderRow) -> Self {
        Row::new(vec![
            Value::Text(o.order_id),
            Value::Decimal(o.total_price),
            Value::Decimal(o.vat_amount),
            Value::Timestamp(o.created_at),
        ])
    }
}

impl From<OrderItemRow> for Row {
    fn from(i: OrderItemRow) -> Self {
        Row::new(vec![
            Value::Int(i.item_id),
            Value::Text(i.order_id),
            Value::Int(i.product_id),
            Value::Int(i.quantity),
            Value::Decimal(i.unit_price),
            Value::Decimal(i.item_vat),
        ])
    }
}
