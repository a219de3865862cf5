use serde::Deserialize;

/// A row as it appeared in the source file, tagged with its line number
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow<T> {
    pub line: u64,
    pub record: T,
}

// Raw records keep every column as optional text. Presence and type checks
// happen in `transform`, where each failure maps to a drop reason.

/// One line of customers_raw.csv
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct RawCustomer {
    pub customer_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub registration_date: Option<String>,
}

/// One line of products_raw.csv
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct RawProduct {
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub stock_quantity: Option<String>,
}

/// One line of sales_raw.csv (a single order line item)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct RawSale {
    pub transaction_id: Option<String>,
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    pub transaction_date: Option<String>,
    pub status: Option<String>,
}
