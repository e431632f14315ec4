use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    IncomingOrderItem, OrderRecord, OrderTotals, PricedLine, Product, Receipt, ReceiptItem,
};
use crate::domain::ports::{Executor, Transaction};
use crate::money::round_currency;
use crate::store::{catalog, orders};

pub struct OrderService<E> {
    executor: E,
}

impl<E: Executor> OrderService<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        let mut session = self
            .executor
            .session()
            .map_err(|e| DomainError::store("opening session", e))?;
        catalog::list_products(&mut session).map_err(|e| DomainError::store("listing products", e))
    }

    /// Price and persist an order in a single transaction.
    ///
    /// Either the header, every item and the final totals are committed, or
    /// nothing is. Items keep their request order in the receipt.
    pub fn create_order(&self, items: &[IncomingOrderItem]) -> Result<Receipt, DomainError> {
        if items.is_empty() {
            log::warn!("rejected order without items");
            return Err(DomainError::EmptyOrder);
        }

        let mut tx = self
            .executor
            .begin()
            .map_err(|e| DomainError::store("beginning transaction", e))?;
        let outcome = place_order(&mut tx, items);
        // no-op once the commit went through
        if let Err(e) = tx.rollback() {
            log::warn!("rollback failed: {}", e);
        }

        match &outcome {
            Ok(receipt) => log::info!(
                "created order {} with {} items, total {} (VAT {})",
                receipt.order_id,
                receipt.items.len(),
                receipt.order_price,
                receipt.order_vat
            ),
            Err(e @ DomainError::Store { .. }) => log::error!("order creation failed: {}", e),
            Err(e) => log::warn!("order rejected: {}", e),
        }
        outcome
    }

    /// Header and items are read independently, outside any transaction.
    pub fn get_order(&self, order_id: &str) -> Result<Receipt, DomainError> {
        let mut session = self
            .executor
            .session()
            .map_err(|e| DomainError::store("opening session", e))?;

        let header = orders::get_order_header(&mut session, order_id)
            .map_err(|e| DomainError::store(format!("fetching order {order_id}"), e))?
            .ok_or(DomainError::OrderNotFound)?;
        let items = orders::get_order_items(&mut session, order_id)
            .map_err(|e| DomainError::store(format!("fetching items of order {order_id}"), e))?;

        Ok(Receipt {
            order_id: header.order_id,
            order_price: round_currency(&header.total_price),
            order_vat: round_currency(&header.vat_amount),
            items: items.into_iter().map(ReceiptItem::from).collect(),
        })
    }
}

fn place_order<T: Transaction>(
    tx: &mut T,
    items: &[IncomingOrderItem],
) -> Result<Receipt, DomainError> {
    let header = OrderRecord {
        order_id: Uuid::new_v4().to_string(),
        total_price: Default::default(),
        vat_amount: Default::default(),
        created_at: Utc::now(),
    };
    let order_id = header.order_id.as_str();
    orders::insert_order_header(tx, &header)
        .map_err(|e| DomainError::store(format!("inserting order {order_id}"), e))?;

    let mut totals = OrderTotals::default();
    let mut receipt_items = Vec::with_capacity(items.len());
    for item in items {
        let product = catalog::get_product(tx, item.product_id)
            .map_err(|e| DomainError::store(format!("fetching product {}", item.product_id), e))?
            .ok_or(DomainError::ProductNotFound(item.product_id))?;

        if item.quantity <= 0 {
            return Err(DomainError::InvalidQuantity {
                product_id: item.product_id,
            });
        }

        let line = PricedLine::new(&product, item.quantity);
        totals.add(&line);
        orders::insert_order_item(tx, order_id, &line).map_err(|e| {
            DomainError::store(
                format!("inserting item for product {} into order {order_id}", item.product_id),
                e,
            )
        })?;
        receipt_items.push(ReceiptItem::from(&line));
    }

    let order_price = totals.total_price();
    let order_vat = totals.vat_amount();
    orders::update_order_totals(tx, order_id, &order_price, &order_vat)
        .map_err(|e| DomainError::store(format!("updating totals of order {order_id}"), e))?;
    tx.commit()
        .map_err(|e| DomainError::store(format!("committing order {order_id}"), e))?;

    Ok(Receipt {
        order_id: header.order_id.clone(),
        order_price,
        order_vat,
        items: receipt_items,
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::domain::errors::StoreError;
    use crate::domain::ports::{Session, Statement};
    use crate::domain::row::Row;
    use crate::infrastructure::memory::{MemoryExecutor, MemorySession, MemoryStore, MemoryTransaction};

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn product(id: i32, price: &str, vat_rate: &str) -> Product {
        Product {
            id,
            name: format!("product {id}"),
            price: dec(price),
            vat_rate: dec(vat_rate),
        }
    }

    fn item(product_id: i32, quantity: i32) -> IncomingOrderItem {
        IncomingOrderItem {
            product_id,
            quantity,
        }
    }

    fn executor() -> MemoryExecutor {
        MemoryExecutor::new(MemoryStore::with_products(vec![
            product(1, "1200.00", "0.22"),
            product(2, "150.00", "0.22"),
            product(3, "9.99", "0.10"),
        ]))
    }

    fn stored(executor: &MemoryExecutor, order_id: &str) -> (bool, usize) {
        let mut session = executor.session().expect("session");
        let header = orders::get_order_header(&mut session, order_id).expect("header");
        let items = orders::get_order_items(&mut session, order_id).expect("items");
        (header.is_some(), items.len())
    }

    #[test]
    fn largest_quantity_is_priced_exactly() {
        let service = OrderService::new(executor());

        let receipt = service
            .create_order(&[item(1, i32::MAX)])
            .expect("create failed");

        assert_eq!(receipt.order_price, dec("2576980376400.00"));
        assert_eq!(receipt.order_vat, dec("566935682808.00"));
        assert_eq!(service.get_order(&receipt.order_id).expect("get failed"), receipt);
    }

    #[test]
    fn prices_an_order() {
        let service = OrderService::new(executor());

        let receipt = service
            .create_order(&[item(1, 1), item(2, 2)])
            .expect("create failed");

        assert_eq!(receipt.order_price, dec("1500.00"));
        assert_eq!(receipt.order_vat, dec("330.00"));
        assert_eq!(
            receipt.items,
            vec![
                ReceiptItem {
                    product_id: 1,
                    quantity: 1,
                    price: dec("1200.00"),
                    vat: dec("264.00"),
                },
                ReceiptItem {
                    product_id: 2,
                    quantity: 2,
                    price: dec("150.00"),
                    vat: dec("33.00"),
                },
            ]
        );
    }

    #[test]
    fn created_order_can_be_read_back_identically() {
        let service = OrderService::new(executor());
        let created = service
            .create_order(&[item(3, 3), item(1, 1)])
            .expect("create failed");

        let first = service.get_order(&created.order_id).expect("get failed");
        let second = service.get_order(&created.order_id).expect("get failed");

        assert_eq!(first, created);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_order_is_rejected() {
        let service = OrderService::new(executor());
        assert!(matches!(service.create_order(&[]), Err(DomainError::EmptyOrder)));
    }

    #[test]
    fn unknown_product_aborts_the_whole_order() {
        let probe = Probe::new(false);
        let service = OrderService::new(probe.clone());

        let err = service
            .create_order(&[item(1, 1), item(999, 1), item(2, 1)])
            .unwrap_err();

        assert!(matches!(err, DomainError::ProductNotFound(999)));
        assert_eq!(err.to_string(), "Product with ID 999 not found");
        assert!(probe.rolled_back.load(Ordering::SeqCst));
        let order_id = probe.last_order();
        assert_eq!(stored(&probe.inner, &order_id), (false, 0));
        assert!(matches!(
            service.get_order(&order_id),
            Err(DomainError::OrderNotFound)
        ));
    }

    #[test]
    fn non_positive_quantity_is_rejected_without_writes() {
        for quantity in [0, -3] {
            let probe = Probe::new(false);
            let service = OrderService::new(probe.clone());

            let err = service
                .create_order(&[item(1, 1), item(2, quantity)])
                .unwrap_err();

            assert!(matches!(err, DomainError::InvalidQuantity { product_id: 2 }));
            assert_eq!(stored(&probe.inner, &probe.last_order()), (false, 0));
        }
    }

    #[test]
    fn missing_order_is_not_found() {
        let service = OrderService::new(executor());
        assert!(matches!(
            service.get_order("nonexistent-order"),
            Err(DomainError::OrderNotFound)
        ));
    }

    #[test]
    fn empty_catalog_lists_no_products() {
        let service = OrderService::new(MemoryExecutor::new(MemoryStore::new()));
        assert!(service.list_products().expect("list").is_empty());
    }

    // ── Failure injection ────────────────────────────────────────────────────

    /// Wraps the in-memory backend, remembers the last order id it saw
    /// inserted and whether a transaction was begun or rolled back. With
    /// `fail_totals` set, the totals update (the last write before commit)
    /// fails.
    #[derive(Clone)]
    struct Probe {
        inner: MemoryExecutor,
        fail_totals: bool,
        last_order: Arc<Mutex<Option<String>>>,
        begun: Arc<AtomicBool>,
        rolled_back: Arc<AtomicBool>,
    }

    impl Probe {
        fn new(fail_totals: bool) -> Self {
            Self {
                inner: executor(),
                fail_totals,
                last_order: Default::default(),
                begun: Default::default(),
                rolled_back: Default::default(),
            }
        }

        fn last_order(&self) -> String {
            self.last_order
                .lock()
                .expect("lock")
                .clone()
                .expect("a header insert was attempted")
        }
    }

    struct ProbeTx {
        inner: MemoryTransaction,
        probe: Probe,
    }

    impl Executor for Probe {
        type Session = MemorySession;
        type Transaction = ProbeTx;

        fn session(&self) -> Result<MemorySession, StoreError> {
            self.inner.session()
        }

        fn begin(&self) -> Result<ProbeTx, StoreError> {
            self.begun.store(true, Ordering::SeqCst);
            Ok(ProbeTx {
                inner: self.inner.begin()?,
                probe: self.clone(),
            })
        }
    }

    impl Session for ProbeTx {
        fn query_one(&mut self, statement: &Statement) -> Result<Option<Row>, StoreError> {
            self.inner.query_one(statement)
        }

        fn query_many(&mut self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
            self.inner.query_many(statement)
        }
    }

    impl Transaction for ProbeTx {
        fn exec(&mut self, statement: &Statement) -> Result<u64, StoreError> {
            match statement {
                Statement::InsertOrder { order_id, .. } => {
                    *self.probe.last_order.lock().expect("lock") = Some(order_id.clone());
                }
                Statement::UpdateOrderTotals { .. } if self.probe.fail_totals => {
                    return Err(StoreError::Unavailable("connection reset".to_string()));
                }
                _ => {}
            }
            self.inner.exec(statement)
        }

        fn commit(&mut self) -> Result<(), StoreError> {
            self.inner.commit()
        }

        fn rollback(&mut self) -> Result<(), StoreError> {
            self.probe.rolled_back.store(true, Ordering::SeqCst);
            self.inner.rollback()
        }
    }

    #[test]
    fn empty_order_never_opens_a_transaction() {
        let probe = Probe::new(false);
        let service = OrderService::new(probe.clone());

        assert!(matches!(service.create_order(&[]), Err(DomainError::EmptyOrder)));
        assert!(!probe.begun.load(Ordering::SeqCst));

        service.create_order(&[item(1, 1)]).expect("create failed");
        assert!(probe.begun.load(Ordering::SeqCst));
    }

    #[test]
    fn store_failure_rolls_back_header_and_items() {
        let probe = Probe::new(true);
        let service = OrderService::new(probe.clone());

        let err = service
            .create_order(&[item(1, 1), item(2, 2)])
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::Store {
                source: StoreError::Unavailable(_),
                ..
            }
        ));
        assert!(probe.rolled_back.load(Ordering::SeqCst));
        let order_id = probe.last_order();
        assert_eq!(stored(&probe.inner, &order_id), (false, 0));
        assert!(matches!(
            service.get_order(&order_id),
            Err(DomainError::OrderNotFound)
        ));
    }

    #[test]
    fn concurrent_orders_all_commit() {
        let service = Arc::new(OrderService::new(executor()));

        let receipts: Vec<Receipt> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let service = Arc::clone(&service);
                    scope.spawn(move || service.create_order(&[item(3, 2), item(2, 1)]))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("join").expect("create failed"))
                .collect()
        });

        for receipt in receipts {
            let stored = service.get_order(&receipt.order_id).expect("get failed");
            assert_eq!(stored, receipt);
            assert_eq!(stored.order_price, dec("169.98"));
        }
    }
}
