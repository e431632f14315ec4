use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::result::DatabaseErrorKind;

use crate::db::DbPool;
use crate::domain::errors::StoreError;
use crate::domain::ports::{Executor, Session, Statement, Transaction};
use crate::domain::row::{Row, Value};
use crate::schema::{order_items, orders, products};

use super::models::{NewOrderItemRow, NewOrderRow, OrderItemRow, OrderRow, ProductRow};

type PgPooled = PooledConnection<ConnectionManager<PgConnection>>;

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for StoreError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation | DatabaseErrorKind::CheckViolation,
                info,
            ) => StoreError::Constraint(info.message().to_string()),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                StoreError::Unavailable(info.message().to_string())
            }
            diesel::result::Error::DeserializationError(e) => StoreError::Scan(e.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

// ── Statement dispatch ───────────────────────────────────────────────────────

fn read_one(conn: &mut PgConnection, statement: &Statement) -> Result<Option<Row>, StoreError> {
    match statement {
        Statement::FetchProduct { id } => Ok(products::table
            .find(*id)
            .select(ProductRow::as_select())
            .first(conn)
            .optional()?
            .map(Row::from)),
        Statement::FetchOrder { order_id } => Ok(orders::table
            .filter(orders::order_id.eq(order_id))
            .select(OrderRow::as_select())
            .first(conn)
            .optional()?
            .map(Row::from)),
        other => Err(StoreError::UnsupportedStatement(other.name())),
    }
}

fn read_many(conn: &mut PgConnection, statement: &Statement) -> Result<Vec<Row>, StoreError> {
    match statement {
        Statement::ListProducts => Ok(products::table
            .select(ProductRow::as_select())
            .order(products::id.asc())
            .load(conn)?
            .into_iter()
            .map(Row::from)
            .collect()),
        Statement::FetchOrderItems { order_id } => Ok(order_items::table
            .filter(order_items::order_id.eq(order_id))
            .select(OrderItemRow::as_select())
            .order(order_items::item_id.asc())
            .load(conn)?
            .into_iter()
            .map(Row::from)
            .collect()),
        other => Err(StoreError::UnsupportedStatement(other.name())),
    }
}

fn query_one_in_tx(conn: &mut PgConnection, statement: &Statement) -> Result<Option<Row>, StoreError> {
    let Statement::InsertOrderItem {
        order_id,
        product_id,
        quantity,
        unit_price,
        item_vat,
    } = statement
    else {
        return read_one(conn, statement);
    };
    let item_id: i32 = diesel::insert_into(order_items::table)
        .values(&NewOrderItemRow {
            order_id,
            product_id: *product_id,
            quantity: *quantity,
            unit_price,
            item_vat,
        })
        .returning(order_items::item_id)
        .get_result(conn)?;
    Ok(Some(Row::new(vec![Value::Int(item_id)])))
}

fn write(conn: &mut PgConnection, statement: &Statement) -> Result<u64, StoreError> {
    let affected = match statement {
        Statement::InsertOrder {
            order_id,
            total_price,
            vat_amount,
            created_at,
        } => diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                order_id,
                total_price,
                vat_amount,
                created_at: *created_at,
            })
            .execute(conn)?,
        Statement::UpdateOrderTotals {
            order_id,
            total_price,
            vat_amount,
        } => diesel::update(orders::table.filter(orders::order_id.eq(order_id)))
            .set((
                orders::total_price.eq(total_price),
                orders::vat_amount.eq(vat_amount),
            ))
            .execute(conn)?,
        other => return Err(StoreError::UnsupportedStatement(other.name())),
    };
    Ok(affected as u64)
}

// ── Executor ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct PgExecutor {
    pool: DbPool,
}

impl PgExecutor {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl Executor for PgExecutor {
    type Session = PgSession;
    type Transaction = PgTransaction;

    fn session(&self) -> Result<PgSession, StoreError> {
        Ok(PgSession {
            conn: self.pool.get()?,
        })
    }

    fn begin(&self) -> Result<PgTransaction, StoreError> {
        let mut conn = self.pool.get()?;
        AnsiTransactionManager::begin_transaction(&mut *conn)?;
        Ok(PgTransaction { conn, open: true })
    }
}

/// Autocommit reads on a pooled connection.
pub struct PgSession {
    conn: PgPooled,
}

impl Session for PgSession {
    fn query_one(&mut self, statement: &Statement) -> Result<Option<Row>, StoreError> {
        log::debug!("session query_one {}", statement.name());
        read_one(&mut self.conn, statement)
    }

    fn query_many(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        log::debug!("session query_many {}", statement.name());
        read_many(&mut self.conn, statement)
    }
}

/// A database transaction pinned to one pooled connection. Dropping it while
/// still open rolls it back before the connection returns to the pool.
pub struct PgTransaction {
    conn: PgPooled,
    open: bool,
}

impl PgTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.open {
            Ok(())
        } else {
            Err(StoreError::TransactionClosed)
        }
    }
}

impl Session for PgTransaction {
    fn query_one(&mut self, statement: &Statement) -> Result<Option<Row>, StoreError> {
        self.ensure_open()?;
        log::debug!("tx query_one {}", statement.name());
        query_one_in_tx(&mut self.conn, statement)
    }

    fn query_many(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.ensure_open()?;
        log::debug!("tx query_many {}", statement.name());
        read_many(&mut self.conn, statement)
    }
}

impl Transaction for PgTransaction {
    fn exec(&mut self, statement: &Statement) -> Result<u64, StoreError> {
        self.ensure_open()?;
        log::debug!("tx exec {}", statement.name());
        write(&mut self.conn, statement)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        // diesel rolls back by itself when COMMIT fails
        self.open = false;
        AnsiTransactionManager::commit_transaction(&mut *self.conn)?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        AnsiTransactionManager::rollback_transaction(&mut *self.conn)?;
        Ok(())
    }
}

impl Drop for PgTransaction {
    fn drop(&mut self) {
        if let Err(e) = self.rollback() {
            log::warn!("rollback of abandoned transaction failed: {}", e);
        }
    }
}
