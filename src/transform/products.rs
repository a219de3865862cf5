use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::normalize::{natural_key, non_blank, parse_count, parse_money, title_case};
use super::Cleaned;
use crate::error::RowError;
use crate::parser::{RawProduct, SourceRow};
use crate::report::FileStats;

/// A validated product, ready for the `products` table
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub natural_id: String,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    pub stock_quantity: i64,
}

impl Product {
    pub fn key(&self) -> String {
        natural_key(&self.natural_id)
    }
}

/// Validate, normalize and deduplicate products on their natural id
pub fn clean_products(rows: Vec<SourceRow<RawProduct>>) -> Cleaned<Product> {
    let mut stats = FileStats::default();
    let mut ids: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let (product, filled) = match validate_product(row.record) {
            Ok(v) => v,
            Err(err) => {
                warn!(file = "products", line = row.line, error = %err, "dropping row");
                stats.record_drop(&err);
                continue;
            }
        };

        if !ids.insert(product.key()) {
            debug!(line = row.line, id = %product.natural_id, "duplicate product");
            stats.duplicates_removed += 1;
            continue;
        }

        stats.values_filled += filled;
        records.push(product);
    }

    Cleaned { records, stats }
}

fn validate_product(raw: RawProduct) -> Result<(Product, u64), RowError> {
    let natural_id = non_blank(raw.product_id).ok_or(RowError::MissingField("product_id"))?;
    let name = non_blank(raw.product_name).ok_or(RowError::MissingField("product_name"))?;
    let category = non_blank(raw.category).ok_or(RowError::MissingField("category"))?;
    let price_raw = non_blank(raw.price).ok_or(RowError::MissingField("price"))?;

    let price = parse_money(&price_raw)
        .filter(|p| !p.is_sign_negative())
        .ok_or(RowError::InvalidValue {
            field: "price",
            value: price_raw,
        })?;

    // Absent, unreadable and negative stock all fall back to 0
    let stock = non_blank(raw.stock_quantity)
        .and_then(|s| parse_count(&s))
        .filter(|n| *n >= 0);
    let filled = u64::from(stock.is_none());

    Ok((
        Product {
            natural_id,
            name,
            category: title_case(&category),
            price,
            stock_quantity: stock.unwrap_or(0),
        },
        filled,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DropReason;

    fn raw(id: &str, price: Option<&str>, stock: Option<&str>) -> SourceRow<RawProduct> {
        SourceRow {
            line: 0,
            record: RawProduct {
                product_id: Some(id.to_string()),
                product_name: Some("Laptop".into()),
                category: Some("electronics".into()),
                price: price.map(str::to_string),
                stock_quantity: stock.map(str::to_string),
            },
        }
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let out = clean_products(vec![
            raw("P001", Some("100"), Some("5")),
            raw("p001", Some("200"), Some("9")),
        ]);
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].price, Decimal::new(100, 0));
        assert_eq!(out.stats.duplicates_removed, 1);
    }

    #[test]
    fn test_missing_price_is_dropped() {
        let out = clean_products(vec![raw("P001", None, Some("5"))]);
        assert!(out.records.is_empty());
        assert_eq!(out.stats.dropped_for(DropReason::MissingRequiredField), 1);
    }

    #[test]
    fn test_bad_price_is_invalid() {
        let out = clean_products(vec![
            raw("P001", Some("cheap"), None),
            raw("P002", Some("-5"), None),
        ]);
        assert!(out.records.is_empty());
        assert_eq!(out.stats.dropped_for(DropReason::InvalidValue), 2);
    }

    #[test]
    fn test_missing_stock_defaults_to_zero() {
        let out = clean_products(vec![raw("P001", Some("10.5"), None)]);
        assert_eq!(out.records[0].stock_quantity, 0);
        assert_eq!(out.stats.values_filled, 1);
    }

    #[test]
    fn test_category_is_title_cased() {
        let out = clean_products(vec![raw("P001", Some("10"), Some("3"))]);
        assert_eq!(out.records[0].category, "Electronics");
        assert_eq!(out.records[0].stock_quantity, 3);
        assert_eq!(out.stats.values_filled, 0);
    }
}
