//! Normalize, deduplicate, detect orphans and derive order totals

pub mod customers;
pub mod normalize;
pub mod products;
pub mod sales;

pub use customers::{clean_customers, Customer};
pub use products::{clean_products, Product};
pub use sales::{clean_sales, Order, OrderItem};

use crate::report::FileStats;

/// Output of one cleaning stage: surviving records plus the stage's counters
#[derive(Debug)]
pub struct Cleaned<T> {
    pub records: Vec<T>,
    pub stats: FileStats,
}

/// Everything the load step writes
#[derive(Debug, Default)]
pub struct CleanDataset {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub orders: Vec<Order>,
}

impl CleanDataset {
    pub fn order_item_count(&self) -> usize {
        self.orders.iter().map(Order::item_count).sum()
    }
}
