use crate::schema::{load_order, ColumnType, TableSchema};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let mut line = format!("    {} {}", col.name, col.col_type.sql_type());

        if col.col_type == ColumnType::Serial {
            line.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else {
            if !col.nullable {
                line.push_str(" NOT NULL");
            }
            if col.unique {
                line.push_str(" UNIQUE");
            }
            if let Some(default) = col.default {
                line.push_str(" DEFAULT ");
                line.push_str(default);
            }
        }

        columns.push(line);
    }

    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}({})",
            fk.column, fk.references_table, fk.references_column
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect()
}

/// Parameterized INSERT for every non-serial column
pub fn generate_insert(schema: &TableSchema) -> String {
    let columns = schema.insert_columns();
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// Full DDL script for the store, tables in dependency order
pub fn generate_schema_script() -> Result<String, String> {
    let mut script = String::from("-- Database: fleximart\n\n");
    for schema in load_order()? {
        script.push_str(&generate_create_table(schema));
        script.push_str(";\n\n");
        for index in generate_indexes(schema) {
            script.push_str(&index);
            script.push_str(";\n");
        }
        if !schema.foreign_keys.is_empty() {
            script.push('\n');
        }
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{CUSTOMERS, ORDERS, ORDER_ITEMS, PRODUCTS};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&CUSTOMERS);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS customers"));
        assert!(sql.contains("customer_id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("email TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("registration_date DATE,") || sql.contains("registration_date DATE\n"));

        let sql = generate_create_table(&PRODUCTS);
        assert!(sql.contains("price DECIMAL(10,2) NOT NULL"));
        assert!(sql.contains("stock_quantity INTEGER DEFAULT 0"));
    }

    #[test]
    fn test_foreign_keys() {
        let sql = generate_create_table(&ORDER_ITEMS);
        assert!(sql.contains("FOREIGN KEY (order_id) REFERENCES orders(order_id)"));
        assert!(sql.contains("FOREIGN KEY (product_id) REFERENCES products(product_id)"));
        assert!(generate_create_table(&ORDERS).contains("status TEXT DEFAULT 'Pending'"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&ORDER_ITEMS);
        assert!(indexes.iter().any(|i| i.contains("idx_order_items_order_id")));
        assert!(generate_indexes(&CUSTOMERS).is_empty());
    }

    #[test]
    fn test_generate_insert_skips_serial() {
        assert_eq!(
            generate_insert(&ORDERS),
            "INSERT INTO orders (customer_id, order_date, total_amount, status) VALUES (?, ?, ?, ?)"
        );
    }

    #[test]
    fn test_schema_script_order() {
        let script = generate_schema_script().unwrap();
        let customers = script.find("TABLE IF NOT EXISTS customers").unwrap();
        let orders = script.find("TABLE IF NOT EXISTS orders").unwrap();
        let items = script.find("TABLE IF NOT EXISTS order_items").unwrap();
        assert!(customers < orders && orders < items);
    }
}
