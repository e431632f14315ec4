//! Order headers and line items.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::domain::errors::StoreError;
use crate::domain::order::{OrderItemRecord, OrderRecord, PricedLine};
use crate::domain::ports::{Session, Statement, Transaction};

pub fn insert_order_header<T>(tx: &mut T, order: &OrderRecord) -> Result<(), StoreError>
where
    T: Transaction + ?Sized,
{
    tx.exec(&Statement::InsertOrder {
        order_id: order.order_id.clone(),
        total_price: order.total_price.clone(),
        vat_amount: order.vat_amount.clone(),
        created_at: order.created_at,
    })?;
    Ok(())
}

pub fn update_order_totals<T>(
    tx: &mut T,
    order_id: &str,
    total_price: &BigDecimal,
    vat_amount: &BigDecimal,
) -> Result<(), StoreError>
where
    T: Transaction + ?Sized,
{
    let affected = tx.exec(&Statement::UpdateOrderTotals {
        order_id: order_id.to_string(),
        total_price: total_price.clone(),
        vat_amount: vat_amount.clone(),
    })?;
    if affected == 0 {
        return Err(StoreError::NotFound(format!("order {order_id}")));
    }
    Ok(())
}

/// Stores a snapshot of the priced line and returns the assigned item id.
pub fn insert_order_item<T>(tx: &mut T, order_id: &str, line: &PricedLine) -> Result<i32, StoreError>
where
    T: Transaction + ?Sized,
{
    let row = tx
        .query_one(&Statement::InsertOrderItem {
            order_id: order_id.to_string(),
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: line.unit_price.clone(),
            item_vat: line.unit_vat.clone(),
        })?
        .ok_or_else(|| StoreError::Database("insert returned no item id".to_string()))?;
    let (item_id,) = row.scan::<(i32,)>()?;
    Ok(item_id)
}

pub fn get_order_header<S>(session: &mut S, order_id: &str) -> Result<Option<OrderRecord>, StoreError>
where
    S: Session + ?Sized,
{
    let Some(row) = session.query_one(&Statement::FetchOrder {
        order_id: order_id.to_string(),
    })?
    else {
        return Ok(None);
    };
    let (order_id, total_price, vat_amount, created_at) =
        row.scan::<(String, BigDecimal, BigDecimal, DateTime<Utc>)>()?;
    Ok(Some(OrderRecord {
        order_id,
        total_price,
        vat_amount,
        created_at,
    }))
}

/// Items in insertion order; empty when the order has none.
pub fn get_order_items<S>(session: &mut S, order_id: &str) -> Result<Vec<OrderItemRecord>, StoreError>
where
    S: Session + ?Sized,
{
    session
        .query_many(&Statement::FetchOrderItems {
            order_id: order_id.to_string(),
        })?
        .into_iter()
        .map(|row| -> Result<OrderItemRecord, StoreError> {
            let (item_id, order_id, product_id, quantity, unit_price, item_vat) =
                row.scan::<(i32, String, i32, i32, BigDecimal, BigDecimal)>()?;
            Ok(OrderItemRecord {
                item_id,
                order_id,
                product_id,
                quantity,
                unit_price,
                item_vat,
            })
        })
        .collect()
}
