use rusqlite::{params, Connection, OpenFlags, Transaction};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::schema_gen::{generate_create_table, generate_indexes, generate_insert};
use crate::error::StoreError;
use crate::report::TableCount;
use crate::schema::{
    DependencyResolver, TableSchema, ALL_TABLES, CUSTOMERS, ORDERS, ORDER_ITEMS, PRODUCTS,
};
use crate::transform::{CleanDataset, Customer, Order, Product};
use crate::ui::Ui;

/// Rows between progress updates
const PROGRESS_EVERY: usize = 500;

/// Rows written per table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub customers: u64,
    pub products: u64,
    pub orders: u64,
    pub order_items: u64,
}

/// Surrogate keys handed out during a load, keyed by natural id
#[derive(Default)]
struct KeyMap {
    customers: HashMap<String, i64>,
    products: HashMap<String, i64>,
    orders: Vec<i64>,
}

/// The relational store. Owns its connection for the whole run; dropping the
/// store closes it.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and check that it is usable
    pub fn connect(path: &Path) -> Result<Self, StoreError> {
        let connection_error = |source| StoreError::Connection {
            path: path.display().to_string(),
            source,
        };

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )
        .map_err(connection_error)?;

        // Opening is lazy; the first read is what fails for non-database files
        conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(connection_error)?;

        Self::configure(conn)
    }

    /// Private in-memory store
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::configure(conn)
    }

    fn configure(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Verify existing tables, then create the missing ones.
    ///
    /// With `recreate` the four tables are dropped first. A table with the
    /// wrong columns fails the call before anything is created.
    pub fn prepare_schema(&self, recreate: bool) -> Result<(), StoreError> {
        if recreate {
            for schema in delete_order()? {
                info!(table = schema.name, "dropping table");
                self.conn
                    .execute(&format!("DROP TABLE IF EXISTS {}", schema.name), [])?;
            }
        }

        let mut missing = Vec::new();
        for schema in ALL_TABLES {
            let actual = self.column_names(schema.name)?;
            if actual.is_empty() {
                missing.push(*schema);
            } else {
                check_columns(schema, &actual)?;
            }
        }

        for schema in missing {
            debug!(table = schema.name, "creating table");
            self.conn.execute(&generate_create_table(schema), [])?;
        }
        for schema in ALL_TABLES {
            for index_sql in generate_indexes(schema) {
                self.conn.execute(&index_sql, [])?;
            }
        }

        self.verify_schema()
    }

    /// Check that every table exists with exactly the expected columns
    pub fn verify_schema(&self) -> Result<(), StoreError> {
        for schema in ALL_TABLES {
            let actual = self.column_names(schema.name)?;
            if actual.is_empty() {
                return Err(StoreError::SchemaMismatch(format!(
                    "table {} does not exist",
                    schema.name
                )));
            }
            check_columns(schema, &actual)?;
        }
        Ok(())
    }

    fn column_names(&self, table: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{}')", table))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Empty every table and restart surrogate keys at 1
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for schema in delete_order()? {
            tx.execute(&format!("DELETE FROM {}", schema.name), [])?;
            tx.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [schema.name])?;
        }
        tx.commit()?;
        debug!("store reset");
        Ok(())
    }

    /// Write the cleaned dataset, parents before children
    pub fn load(
        &mut self,
        data: &CleanDataset,
        ui: &mut impl Ui,
    ) -> Result<LoadSummary, StoreError> {
        let order = DependencyResolver::default()
            .insert_order()
            .map_err(StoreError::SchemaMismatch)?;

        let mut keys = KeyMap::default();
        let mut summary = LoadSummary::default();

        for schema in order {
            let tx = self.conn.transaction()?;
            let written = match schema.name {
                "customers" => insert_customers(&tx, &data.customers, &mut keys, ui)?,
                "products" => insert_products(&tx, &data.products, &mut keys, ui)?,
                "orders" => insert_orders(&tx, &data.orders, &mut keys, ui)?,
                "order_items" => insert_order_items(&tx, &data.orders, &keys, ui)?,
                other => {
                    return Err(StoreError::SchemaMismatch(format!(
                        "no loader for table {}",
                        other
                    )))
                }
            };
            tx.commit()?;

            match schema.name {
                "customers" => summary.customers = written,
                "products" => summary.products = written,
                "orders" => summary.orders = written,
                _ => summary.order_items = written,
            }
            ui.table_loaded(schema.name, written);
            info!(table = schema.name, rows = written, "table loaded");
        }

        Ok(summary)
    }

    /// Row count of every table, in load order
    pub fn table_counts(&self) -> Result<Vec<TableCount>, StoreError> {
        let order = DependencyResolver::default()
            .insert_order()
            .map_err(StoreError::SchemaMismatch)?;

        order
            .into_iter()
            .map(|schema| -> Result<TableCount, StoreError> {
                let rows: i64 = self.conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", schema.name),
                    [],
                    |row| row.get(0),
                )?;
                Ok(TableCount {
                    table: schema.name.to_string(),
                    rows: rows as u64,
                })
            })
            .collect()
    }

    /// Borrow the connection for read-only inspection
    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run the optimizer and close the connection
    pub fn finish(self) -> Result<(), StoreError> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

fn check_columns(schema: &TableSchema, actual: &[String]) -> Result<(), StoreError> {
    let expected = schema.column_names();
    if actual != expected.as_slice() {
        return Err(StoreError::SchemaMismatch(format!(
            "table {} has columns [{}], expected [{}]",
            schema.name,
            actual.join(", "),
            expected.join(", ")
        )));
    }
    Ok(())
}

fn delete_order() -> Result<Vec<&'static TableSchema>, StoreError> {
    DependencyResolver::default()
        .delete_order()
        .map_err(StoreError::SchemaMismatch)
}

/// DECIMAL(10,2) text form, e.g. `59.97`
fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

fn report_progress(ui: &mut impl Ui, done: usize, total: usize, table: &str) {
    if done % PROGRESS_EVERY == 0 || done == total {
        ui.rows_written(table, done as u64, total as u64);
    }
}

fn insert_customers(
    tx: &Transaction,
    customers: &[Customer],
    keys: &mut KeyMap,
    ui: &mut impl Ui,
) -> Result<u64, StoreError> {
    let mut stmt = tx.prepare_cached(&generate_insert(&CUSTOMERS))?;

    for (i, c) in customers.iter().enumerate() {
        let id = stmt.insert(params![
            c.first_name,
            c.last_name,
            c.email,
            c.phone,
            c.city,
            c.registration_date,
        ])?;
        if let Some(key) = c.key() {
            keys.customers.insert(key, id);
        }
        report_progress(ui, i + 1, customers.len(), CUSTOMERS.name);
    }

    Ok(customers.len() as u64)
}

fn insert_products(
    tx: &Transaction,
    products: &[Product],
    keys: &mut KeyMap,
    ui: &mut impl Ui,
) -> Result<u64, StoreError> {
    let mut stmt = tx.prepare_cached(&generate_insert(&PRODUCTS))?;

    for (i, p) in products.iter().enumerate() {
        let id = stmt.insert(params![p.name, p.category, money(p.price), p.stock_quantity])?;
        keys.products.insert(p.key(), id);
        report_progress(ui, i + 1, products.len(), PRODUCTS.name);
    }

    Ok(products.len() as u64)
}

fn insert_orders(
    tx: &Transaction,
    orders: &[Order],
    keys: &mut KeyMap,
    ui: &mut impl Ui,
) -> Result<u64, StoreError> {
    let mut stmt = tx.prepare_cached(&generate_insert(&ORDERS))?;

    for (i, order) in orders.iter().enumerate() {
        let customer_id = keys.customers.get(&order.customer_key).ok_or_else(|| {
            StoreError::UnresolvedReference(format!("customer {}", order.customer_key))
        })?;
        let id = stmt.insert(params![
            customer_id,
            order.order_date,
            money(order.total_amount),
            order.status,
        ])?;
        keys.orders.push(id);
        report_progress(ui, i + 1, orders.len(), ORDERS.name);
    }

    Ok(orders.len() as u64)
}

fn insert_order_items(
    tx: &Transaction,
    orders: &[Order],
    keys: &KeyMap,
    ui: &mut impl Ui,
) -> Result<u64, StoreError> {
    let mut stmt = tx.prepare_cached(&generate_insert(&ORDER_ITEMS))?;
    let total: usize = orders.iter().map(Order::item_count).sum();
    let mut written = 0usize;

    for (order, order_id) in orders.iter().zip(&keys.orders) {
        for item in &order.items {
            let product_id = keys.products.get(&item.product_key).ok_or_else(|| {
                StoreError::UnresolvedReference(format!("product {}", item.product_key))
            })?;
            stmt.execute(params![
                order_id,
                product_id,
                item.quantity,
                money(item.unit_price),
                money(item.subtotal),
            ])?;
            written += 1;
            report_progress(ui, written, total, ORDER_ITEMS.name);
        }
    }

    Ok(written as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::OrderItem;
    use crate::ui::SilentUi;
    use chrono::NaiveDate;

    fn dataset() -> CleanDataset {
        CleanDataset {
            customers: vec![Customer {
                natural_id: Some("C001".into()),
                first_name: "Asha".into(),
                last_name: "Rao".into(),
                email: "asha@x.com".into(),
                phone: Some("+91-9876543210".into()),
                city: None,
                registration_date: NaiveDate::from_ymd_opt(2024, 1, 15),
            }],
            products: vec![Product {
                natural_id: "P001".into(),
                name: "Laptop".into(),
                category: "Electronics".into(),
                price: Decimal::new(4599900, 2),
                stock_quantity: 3,
            }],
            orders: vec![Order {
                transaction_id: "T1".into(),
                customer_key: "C001".into(),
                order_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                status: "Completed".into(),
                items: vec![OrderItem {
                    product_key: "P001".into(),
                    quantity: 2,
                    unit_price: Decimal::new(4599900, 2),
                    subtotal: Decimal::new(9199800, 2),
                }],
                total_amount: Decimal::new(9199800, 2),
            }],
        }
    }

    fn store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.prepare_schema(false).unwrap();
        store
    }

    #[test]
    fn test_load_writes_all_tables() {
        let mut store = store();
        let summary = store.load(&dataset(), &mut SilentUi::new()).unwrap();
        assert_eq!(
            summary,
            LoadSummary {
                customers: 1,
                products: 1,
                orders: 1,
                order_items: 1
            }
        );

        let (date, total): (String, f64) = store
            .connection()
            .query_row("SELECT order_date, total_amount FROM orders", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(date, "2024-02-01");
        assert!((total - 91998.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restarts_keys() {
        let mut store = store();
        store.load(&dataset(), &mut SilentUi::new()).unwrap();
        store.reset().unwrap();
        assert!(store.table_counts().unwrap().iter().all(|t| t.rows == 0));

        store.load(&dataset(), &mut SilentUi::new()).unwrap();
        let id: i64 = store
            .connection()
            .query_row("SELECT customer_id FROM customers", [], |r| r.get(0))
            .unwrap();
        assert_eq!(id, 1);
    }

    #[test]
    fn test_unresolved_reference_is_an_error() {
        let mut data = dataset();
        data.orders[0].customer_key = "C999".into();
        let mut store = store();
        let err = store.load(&data, &mut SilentUi::new()).unwrap_err();
        assert!(matches!(err, StoreError::UnresolvedReference(_)));
    }

    #[test]
    fn test_schema_mismatch_is_detected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .connection()
            .execute("CREATE TABLE customers (customer_id INTEGER PRIMARY KEY, name TEXT)", [])
            .unwrap();
        let err = store.prepare_schema(false).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch(_)));

        // Nothing else was created next to the foreign table
        let tables: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name <> 'sqlite_sequence'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);

        // Recreating replaces the foreign table
        store.prepare_schema(true).unwrap();
    }

    #[test]
    fn test_connect_rejects_non_database_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let text = "customer_id,first_name,last_name,email\n".repeat(200);
        std::io::Write::write_all(&mut file, text.as_bytes()).unwrap();
        let err = SqliteStore::connect(file.path()).err().unwrap();
        assert!(matches!(err, StoreError::Connection { .. }));
    }

    #[test]
    fn test_connect_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("store.db");
        assert!(matches!(
            SqliteStore::connect(&path),
            Err(StoreError::Connection { .. })
        ));
    }
}
