use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::customers::Customer;
use super::normalize::{natural_key, non_blank, parse_count, parse_date, parse_money};
use super::products::Product;
use super::Cleaned;
use crate::error::RowError;
use crate::parser::{RawSale, SourceRow};
use crate::report::FileStats;

/// Status written when the sales file has none
pub const DEFAULT_ORDER_STATUS: &str = "Completed";

/// One validated sales line
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub transaction_id: String,
    pub customer_key: String,
    pub product_key: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub order_date: NaiveDate,
    pub status: String,
}

/// A line of an order; `subtotal` is always `quantity * unit_price`
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub product_key: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Synthetic parent order: every line sharing a transaction id and customer
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub transaction_id: String,
    pub customer_key: String,
    pub order_date: NaiveDate,
    pub status: String,
    pub items: Vec<OrderItem>,
    /// Sum of item subtotals, stored denormalized on the order row
    pub total_amount: Decimal,
}

impl Order {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Validate sales lines, drop orphans and group the survivors into orders.
///
/// `customers` and `products` must already be cleaned and deduplicated.
pub fn clean_sales(
    rows: Vec<SourceRow<RawSale>>,
    customers: &[Customer],
    products: &[Product],
) -> Cleaned<Order> {
    let customer_keys: HashSet<String> = customers.iter().filter_map(Customer::key).collect();
    let product_keys: HashSet<String> = products.iter().map(Product::key).collect();

    let mut stats = FileStats::default();
    let mut seen: HashSet<RawSale> = HashSet::new();
    let mut lines = Vec::with_capacity(rows.len());

    for row in rows {
        if !seen.insert(row.record.clone()) {
            debug!(line = row.line, "duplicate sales row");
            stats.duplicates_removed += 1;
            continue;
        }

        let result = validate_sale(row.record)
            .and_then(|sale| check_references(sale, &customer_keys, &product_keys));

        match result {
            Ok(sale) => lines.push(sale),
            Err(err) => {
                warn!(file = "sales", line = row.line, error = %err, "dropping row");
                stats.record_drop(&err);
            }
        }
    }

    let mut records = Vec::new();
    for (n, result) in group_orders(lines).into_iter().enumerate() {
        match result {
            Ok(order) => records.push(order),
            Err((err, lines_lost)) => {
                warn!(order = n, error = %err, "dropping order");
                stats.add_drops(err.reason(), lines_lost);
            }
        }
    }

    Cleaned { records, stats }
}

fn validate_sale(raw: RawSale) -> Result<SaleLine, RowError> {
    let transaction_id =
        non_blank(raw.transaction_id).ok_or(RowError::MissingField("transaction_id"))?;
    let customer_id = non_blank(raw.customer_id).ok_or(RowError::MissingField("customer_id"))?;
    let product_id = non_blank(raw.product_id).ok_or(RowError::MissingField("product_id"))?;
    let quantity_raw = non_blank(raw.quantity).ok_or(RowError::MissingField("quantity"))?;
    let price_raw = non_blank(raw.unit_price).ok_or(RowError::MissingField("unit_price"))?;
    let date_raw =
        non_blank(raw.transaction_date).ok_or(RowError::MissingField("transaction_date"))?;

    let quantity = parse_count(&quantity_raw)
        .filter(|q| *q > 0)
        .ok_or(RowError::InvalidValue {
            field: "quantity",
            value: quantity_raw,
        })?;
    let unit_price = parse_money(&price_raw)
        .filter(|p| !p.is_sign_negative())
        .ok_or(RowError::InvalidValue {
            field: "unit_price",
            value: price_raw,
        })?;
    let order_date = parse_date(&date_raw).ok_or(RowError::InvalidDate(date_raw))?;

    Ok(SaleLine {
        transaction_id,
        customer_key: natural_key(&customer_id),
        product_key: natural_key(&product_id),
        quantity,
        unit_price,
        order_date,
        status: non_blank(raw.status).unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string()),
    })
}

fn check_references(
    sale: SaleLine,
    customers: &HashSet<String>,
    products: &HashSet<String>,
) -> Result<SaleLine, RowError> {
    if !customers.contains(&sale.customer_key) {
        return Err(RowError::Orphan {
            kind: "customer",
            id: sale.customer_key,
        });
    }
    if !products.contains(&sale.product_key) {
        return Err(RowError::Orphan {
            kind: "product",
            id: sale.product_key,
        });
    }
    Ok(sale)
}

/// Group lines by (transaction id, customer) in first-appearance order.
///
/// The first line of a group supplies the order date and status. A group
/// whose totals overflow is returned as an error with its line count.
fn group_orders(lines: Vec<SaleLine>) -> Vec<Result<Order, (RowError, u64)>> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut groups: Vec<Vec<SaleLine>> = Vec::new();

    for line in lines {
        let key = (line.transaction_id.clone(), line.customer_key.clone());
        match index.get(&key) {
            Some(&i) => groups[i].push(line),
            None => {
                index.insert(key, groups.len());
                groups.push(vec![line]);
            }
        }
    }

    groups.into_iter().map(build_order).collect()
}

fn build_order(lines: Vec<SaleLine>) -> Result<Order, (RowError, u64)> {
    let line_count = lines.len() as u64;
    let first = &lines[0];
    let mut order = Order {
        transaction_id: first.transaction_id.clone(),
        customer_key: first.customer_key.clone(),
        order_date: first.order_date,
        status: first.status.clone(),
        items: Vec::with_capacity(lines.len()),
        total_amount: Decimal::ZERO,
    };

    for line in lines {
        let overflow = || {
            (
                RowError::InvalidValue {
                    field: "subtotal",
                    value: format!("{} x {}", line.quantity, line.unit_price),
                },
                line_count,
            )
        };
        let subtotal = Decimal::from(line.quantity)
            .checked_mul(line.unit_price)
            .ok_or_else(overflow)?;
        order.total_amount = order
            .total_amount
            .checked_add(subtotal)
            .ok_or_else(overflow)?;
        order.items.push(OrderItem {
            product_key: line.product_key,
            quantity: line.quantity,
            unit_price: line.unit_price,
            subtotal,
        });
    }

    Ok(order)
}
