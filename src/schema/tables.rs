//! Table definitions for the FlexiMart store

use super::types::*;

pub static CUSTOMERS: TableSchema = TableSchema {
    name: "customers",
    columns: &[
        Column::serial("customer_id"),
        Column::required("first_name", ColumnType::Text),
        Column::required("last_name", ColumnType::Text),
        Column::required("email", ColumnType::Text).unique(),
        Column::new("phone", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("registration_date", ColumnType::Date),
    ],
    foreign_keys: &[],
};

pub static PRODUCTS: TableSchema = TableSchema {
    name: "products",
    columns: &[
        Column::serial("product_id"),
        Column::required("product_name", ColumnType::Text),
        Column::required("category", ColumnType::Text),
        Column::required("price", ColumnType::Decimal),
        Column::new("stock_quantity", ColumnType::Integer).default_to("0"),
    ],
    foreign_keys: &[],
};

pub static ORDERS: TableSchema = TableSchema {
    name: "orders",
    columns: &[
        Column::serial("order_id"),
        Column::required("customer_id", ColumnType::Integer),
        Column::required("order_date", ColumnType::Date),
        Column::required("total_amount", ColumnType::Decimal),
        Column::new("status", ColumnType::Text).default_to("'Pending'"),
    ],
    foreign_keys: &[ForeignKey::new("customer_id", "customers")],
};

pub static ORDER_ITEMS: TableSchema = TableSchema {
    name: "order_items",
    columns: &[
        Column::serial("order_item_id"),
        Column::required("order_id", ColumnType::Integer),
        Column::required("product_id", ColumnType::Integer),
        Column::required("quantity", ColumnType::Integer),
        Column::required("unit_price", ColumnType::Decimal),
        Column::required("subtotal", ColumnType::Decimal),
    ],
    foreign_keys: &[
        ForeignKey::new("order_id", "orders"),
        ForeignKey::new("product_id", "products"),
    ],
};

/// All table schemas. Use [`super::load_order`] for a dependency-safe order.
pub static ALL_TABLES: &[&TableSchema] = &[&CUSTOMERS, &PRODUCTS, &ORDERS, &ORDER_ITEMS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_are_listed_once() {
        let names: Vec<&str> = ALL_TABLES.iter().map(|t| t.name).collect();
        assert_eq!(names, ["customers", "products", "orders", "order_items"]);
    }

    #[test]
    fn test_foreign_keys_point_at_listed_tables() {
        for table in ALL_TABLES {
            for fk in table.foreign_keys {
                assert!(
                    ALL_TABLES.iter().any(|t| t.name == fk.references_table),
                    "{} references unknown table {}",
                    table.name,
                    fk.references_table
                );
            }
        }
    }
}
