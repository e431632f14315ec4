use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

use crate::money::round_currency;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub vat_rate: BigDecimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncomingOrderItem {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: String,
    pub total_price: BigDecimal,
    pub vat_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub item_id: i32,
    pub order_id: String,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub item_vat: BigDecimal,
}

/// One priced line of an order.
///
/// `unit_vat` is the per-unit VAT rounded to cents and is what gets stored and
/// reported for the item. The order-level VAT uses the unrounded per-unit
/// figure scaled by quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub unit_vat: BigDecimal,
    line_total: BigDecimal,
    line_vat: BigDecimal,
}

impl PricedLine {
    pub fn new(product: &Product, quantity: i32) -> Self {
        let quantity_dec = BigDecimal::from(quantity);
        let exact_unit_vat = &product.price * &product.vat_rate;
        Self {
            product_id: product.id,
            quantity,
            unit_price: product.price.clone(),
            unit_vat: round_currency(&exact_unit_vat),
            line_total: &product.price * &quantity_dec,
            line_vat: exact_unit_vat * quantity_dec,
        }
    }
}

/// Running totals, rounded only once at the end.
#[derive(Debug, Clone, Default)]
pub struct OrderTotals {
    price: BigDecimal,
    vat: BigDecimal,
}

impl OrderTotals {
    pub fn add(&mut self, line: &PricedLine) {
        self.price += &line.line_total;
        self.vat += &line.line_vat;
    }

    pub fn total_price(&self) -> BigDecimal {
        round_currency(&self.price)
    }

    pub fn vat_amount(&self) -> BigDecimal {
        round_currency(&self.vat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptItem {
    pub product_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
    pub vat: BigDecimal,
}

impl From<&PricedLine> for ReceiptItem {
    fn from(line: &PricedLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            price: round_currency(&line.unit_price),
            vat: line.unit_vat.clone(),
        }
    }
}

impl From<OrderItemRecord> for ReceiptItem {
    fn from(item: OrderItemRecord) -> Self {
        Self {
            product_id: item.product_id,
            quantity: item.quantity,
            price: round_currency(&item.unit_price),
            vat: round_currency(&item.item_vat),
        }
    }
}

/// What a client gets back for an order, on creation and on retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub order_id: String,
    pub order_price: BigDecimal,
    pub order_vat: BigDecimal,
    pub items: Vec<ReceiptItem>,
}
