//! In-memory backend.
//!
//! All tables live behind a single reader/writer lock in a [`MemoryStore`].
//! Transactions buffer their writes and apply them in one step under the
//! write lock on commit, so a failed order leaves nothing behind, exactly as
//! with the relational backend.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bigdecimal::BigDecimal;

use crate::domain::errors::StoreError;
use crate::domain::order::{OrderItemRecord, OrderRecord, Product};
use crate::domain::ports::{Executor, Session, Statement, Transaction};
use crate::domain::row::{Row, Value};

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<i32, Product>,
    orders: HashMap<String, OrderRecord>,
    order_items: HashMap<String, Vec<OrderItemRecord>>,
}

#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_item_id: AtomicI32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_products(Vec::new())
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let tables = Tables {
            products: products.into_iter().map(|p| (p.id, p)).collect(),
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
            next_item_id: AtomicI32::new(1),
        }
    }

    /// The same five products the database migration seeds.
    pub fn with_sample_catalog() -> Self {
        Self::with_products(sample_catalog())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    /// Ids are never reused, so running past `i32::MAX` is an error.
    fn allocate_item_id(&self) -> Result<i32, StoreError> {
        self.next_item_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| id.checked_add(1))
            .map_err(|_| StoreError::Unavailable("order item ids exhausted".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn decimal(digits: i64, scale: i64) -> BigDecimal {
    BigDecimal::new(digits.into(), scale)
}

fn sample_catalog() -> Vec<Product> {
    [
        (1, "Laptop Pro", 149_999, 22),
        (2, "Wireless Mouse", 7_999, 22),
        (3, "Mechanical Keyboard", 12_999, 22),
        (4, "4K Monitor", 64_950, 22),
        (5, "HD Monitor", 15_050, 15),
    ]
    .into_iter()
    .map(|(id, name, cents, vat_percent)| Product {
        id,
        name: name.to_string(),
        price: decimal(cents, 2),
        vat_rate: decimal(vat_percent, 2),
    })
    .collect()
}

fn product_row(p: &Product) -> Row {
    Row::new(vec![
        Value::Int(p.id),
        Value::Text(p.name.clone()),
        Value::Decimal(p.price.clone()),
        Value::Decimal(p.vat_rate.clone()),
    ])
}

fn order_row(o: &OrderRecord) -> Row {
    Row::new(vec![
        Value::Text(o.order_id.clone()),
        Value::Decimal(o.total_price.clone()),
        Value::Decimal(o.vat_amount.clone()),
        Value::Timestamp(o.created_at),
    ])
}

fn item_row(i: &OrderItemRecord) -> Row {
    Row::new(vec![
        Value::Int(i.item_id),
        Value::Text(i.order_id.clone()),
        Value::Int(i.product_id),
        Value::Int(i.quantity),
        Value::Decimal(i.unit_price.clone()),
        Value::Decimal(i.item_vat.clone()),
    ])
}

fn read_one(tables: &Tables, statement: &Statement) -> Result<Option<Row>, StoreError> {
    match statement {
        Statement::FetchProduct { id } => Ok(tables.products.get(id).map(product_row)),
        Statement::FetchOrder { order_id } => Ok(tables.orders.get(order_id).map(order_row)),
        other => Err(StoreError::UnsupportedStatement(other.name())),
    }
}

fn read_many(tables: &Tables, statement: &Statement) -> Result<Vec<Row>, StoreError> {
    match statement {
        Statement::ListProducts => Ok(tables.products.values().map(product_row).collect()),
        Statement::FetchOrderItems { order_id } => Ok(tables
            .order_items
            .get(order_id)
            .map(|items| items.iter().map(item_row).collect())
            .unwrap_or_default()),
        other => Err(StoreError::UnsupportedStatement(other.name())),
    }
}

// ── Executor ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MemoryExecutor {
    store: Arc<MemoryStore>,
}

impl MemoryExecutor {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl Executor for MemoryExecutor {
    type Session = MemorySession;
    type Transaction = MemoryTransaction;

    fn session(&self) -> Result<MemorySession, StoreError> {
        Ok(MemorySession {
            store: Arc::clone(&self.store),
        })
    }

    fn begin(&self) -> Result<MemoryTransaction, StoreError> {
        Ok(MemoryTransaction {
            store: Arc::clone(&self.store),
            staged: Vec::new(),
            state: TxState::Open,
        })
    }
}

/// Autocommit reads; every call takes the shared lock for its own duration.
#[derive(Debug)]
pub struct MemorySession {
    store: Arc<MemoryStore>,
}

impl Session for MemorySession {
    fn query_one(&mut self, statement: &Statement) -> Result<Option<Row>, StoreError> {
        read_one(&*self.store.read()?, statement)
    }

    fn query_many(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        read_many(&*self.store.read()?, statement)
    }
}

// ── Transaction ───────────────────────────────────────────────────────────────

#[derive(Debug)]
enum StagedWrite {
    InsertOrder(OrderRecord),
    UpdateTotals {
        order_id: String,
        total_price: BigDecimal,
        vat_amount: BigDecimal,
    },
    InsertItem(OrderItemRecord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Open,
    Committed,
    RolledBack,
}

#[derive(Debug)]
pub struct MemoryTransaction {
    store: Arc<MemoryStore>,
    staged: Vec<StagedWrite>,
    state: TxState,
}

impl MemoryTransaction {
    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.state {
            TxState::Open => Ok(()),
            TxState::Committed | TxState::RolledBack => Err(StoreError::TransactionClosed),
        }
    }

    /// The order header as this transaction sees it: committed state with the
    /// staged writes laid on top.
    fn order_view(&self, tables: &Tables, order_id: &str) -> Option<OrderRecord> {
        let mut view = tables.orders.get(order_id).cloned();
        for write in &self.staged {
            match write {
                StagedWrite::InsertOrder(order) if order.order_id == order_id => {
                    view = Some(order.clone());
                }
                StagedWrite::UpdateTotals {
                    order_id: target,
                    total_price,
                    vat_amount,
                } if target == order_id => {
                    if let Some(order) = view.as_mut() {
                        order.total_price = total_price.clone();
                        order.vat_amount = vat_amount.clone();
                    }
                }
                _ => {}
            }
        }
        view
    }

    fn order_exists(&self, order_id: &str) -> Result<bool, StoreError> {
        let tables = self.store.read()?;
        Ok(self.order_view(&tables, order_id).is_some())
    }
}

impl Session for MemoryTransaction {
    fn query_one(&mut self, statement: &Statement) -> Result<Option<Row>, StoreError> {
        self.ensure_open()?;
        match statement {
            Statement::FetchOrder { order_id } => {
                let tables = self.store.read()?;
                Ok(self.order_view(&tables, order_id).as_ref().map(order_row))
            }
            Statement::InsertOrderItem {
                order_id,
                product_id,
                quantity,
                unit_price,
                item_vat,
            } => {
                if !self.order_exists(order_id)? {
                    return Err(StoreError::Constraint(format!(
                        "order_items.order_id references missing order {order_id}"
                    )));
                }
                item_constraints(&*self.store.read()?, *product_id, *quantity)?;
                let item_id = self.store.allocate_item_id()?;
                self.staged.push(StagedWrite::InsertItem(OrderItemRecord {
                    item_id,
                    order_id: order_id.clone(),
                    product_id: *product_id,
                    quantity: *quantity,
                    unit_price: unit_price.clone(),
                    item_vat: item_vat.clone(),
                }));
                Ok(Some(Row::new(vec![Value::Int(item_id)])))
            }
            other => read_one(&*self.store.read()?, other),
        }
    }

    fn query_many(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.ensure_open()?;
        let mut rows = read_many(&*self.store.read()?, statement)?;
        if let Statement::FetchOrderItems { order_id } = statement {
            rows.extend(self.staged.iter().filter_map(|write| match write {
                StagedWrite::InsertItem(item) if &item.order_id == order_id => Some(item_row(item)),
                _ => None,
            }));
        }
        Ok(rows)
    }
}

impl Transaction for MemoryTransaction {
    fn exec(&mut self, statement: &Statement) -> Result<u64, StoreError> {
        self.ensure_open()?;
        match statement {
            Statement::InsertOrder {
                order_id,
                total_price,
                vat_amount,
                created_at,
            } => {
                if self.order_exists(order_id)? {
                    return Err(StoreError::Conflict(format!("order {order_id} already exists")));
                }
                self.staged.push(StagedWrite::InsertOrder(OrderRecord {
                    order_id: order_id.clone(),
                    total_price: total_price.clone(),
                    vat_amount: vat_amount.clone(),
                    created_at: *created_at,
                }));
                Ok(1)
            }
            Statement::UpdateOrderTotals {
                order_id,
                total_price,
                vat_amount,
            } => {
                if !self.order_exists(order_id)? {
                    return Ok(0);
                }
                self.staged.push(StagedWrite::UpdateTotals {
                    order_id: order_id.clone(),
                    total_price: total_price.clone(),
                    vat_amount: vat_amount.clone(),
                });
                Ok(1)
            }
            other => Err(StoreError::UnsupportedStatement(other.name())),
        }
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let staged = std::mem::take(&mut self.staged);
        // Closed from here on, whether or not the buffer applies.
        self.state = TxState::RolledBack;

        let mut tables = self.store.write()?;
        validate(&tables, &staged)?;
        log::debug!("applying {} staged writes", staged.len());
        apply(&mut tables, staged);
        self.state = TxState::Committed;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.state == TxState::Open {
            self.staged.clear();
            self.state = TxState::RolledBack;
        }
        Ok(())
    }
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if self.state == TxState::Open && !self.staged.is_empty() {
            log::debug!(
                "discarding {} staged writes of an unfinished transaction",
                self.staged.len()
            );
        }
    }
}

/// Another writer may have committed since the writes were staged, so the
/// whole buffer is checked against current state before anything is applied.
fn validate(tables: &Tables, staged: &[StagedWrite]) -> Result<(), StoreError> {
    let mut inserted: HashSet<&str> = HashSet::new();

    for write in staged {
        match write {
            StagedWrite::InsertOrder(order) => {
                if order_known(tables, &inserted, &order.order_id) {
                    return Err(StoreError::Conflict(format!(
                        "order {} already exists",
                        order.order_id
                    )));
                }
                inserted.insert(order.order_id.as_str());
            }
            StagedWrite::UpdateTotals { order_id, .. } => {
                if !order_known(tables, &inserted, order_id) {
                    return Err(StoreError::NotFound(format!("order {order_id}")));
                }
            }
            StagedWrite::InsertItem(item) => {
                if !order_known(tables, &inserted, &item.order_id) {
                    return Err(StoreError::Constraint(format!(
                        "order_items.order_id references missing order {}",
                        item.order_id
                    )));
                }
                item_constraints(tables, item.product_id, item.quantity)?;
            }
        }
    }
    Ok(())
}

/// Same rules as the `order_items` foreign key to `products` and its
/// `quantity > 0` check.
fn item_constraints(tables: &Tables, product_id: i32, quantity: i32) -> Result<(), StoreError> {
    if !tables.products.contains_key(&product_id) {
        return Err(StoreError::Constraint(format!(
            "order_items.product_id references missing product {product_id}"
        )));
    }
    if quantity <= 0 {
        return Err(StoreError::Constraint(format!(
            "order_items.quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

fn order_known(tables: &Tables, inserted: &HashSet<&str>, order_id: &str) -> bool {
    tables.orders.contains_key(order_id) || inserted.contains(order_id)
}

fn apply(tables: &mut Tables, staged: Vec<StagedWrite>) {
    for write in staged {
        match write {
            StagedWrite::InsertOrder(order) => {
                tables.orders.insert(order.order_id.clone(), order);
            }
            StagedWrite::UpdateTotals {
                order_id,
                total_price,
                vat_amount,
            } => {
                if let Some(order) = tables.orders.get_mut(&order_id) {
                    order.total_price = total_price;
                    order.vat_amount = vat_amount;
                }
            }
            StagedWrite::InsertItem(item) => {
                tables
                    .order_items
                    .entry(item.order_id.clone())
                    .or_default()
                    .push(item);
            }
        }
    }
}
