//! Catalog and order stores, written once against the executor contract so
//! they run unchanged on every backend.

pub mod catalog;
pub mod orders;
