//! Read-only product lookups.

use bigdecimal::BigDecimal;

use crate::domain::errors::StoreError;
use crate::domain::order::Product;
use crate::domain::ports::{Session, Statement};
use crate::domain::row::Row;

fn product_from_row(row: Row) -> Result<Product, StoreError> {
    let (id, name, price, vat_rate) = row.scan::<(i32, String, BigDecimal, BigDecimal)>()?;
    Ok(Product {
        id,
        name,
        price,
        vat_rate,
    })
}

/// Works on a plain session as well as inside a transaction.
pub fn get_product<S>(session: &mut S, id: i32) -> Result<Option<Product>, StoreError>
where
    S: Session + ?Sized,
{
    session
        .query_one(&Statement::FetchProduct { id })?
        .map(product_from_row)
        .transpose()
}

/// All products, ordered by id. An empty catalog is an empty vec.
pub fn list_products<S>(session: &mut S) -> Result<Vec<Product>, StoreError>
where
    S: Session + ?Sized,
{
    session
        .query_many(&Statement::ListProducts)?
        .into_iter()
        .map(product_from_row)
        .collect()
}
