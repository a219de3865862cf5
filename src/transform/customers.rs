use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::normalize::{natural_key, non_blank, normalize_phone, parse_date};
use super::Cleaned;
use crate::error::RowError;
use crate::parser::{RawCustomer, SourceRow};
use crate::report::FileStats;

/// A validated customer, ready for the `customers` table
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Id from the source file (e.g. `C001`), used to resolve sales
    pub natural_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Lower-cased; unique across the cleaned set
    pub email: String,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub registration_date: Option<NaiveDate>,
}

impl Customer {
    pub fn key(&self) -> Option<String> {
        self.natural_id.as_deref().map(natural_key)
    }
}

/// Validate, normalize and deduplicate customers.
///
/// The first row seen for an email wins; later rows with the same email
/// (compared case-insensitively) are counted as duplicates.
pub fn clean_customers(rows: Vec<SourceRow<RawCustomer>>) -> Cleaned<Customer> {
    let mut stats = FileStats::default();
    let mut emails: HashSet<String> = HashSet::new();
    let mut ids: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let (customer, filled) = match validate_customer(row.record) {
            Ok(v) => v,
            Err(err) => {
                warn!(file = "customers", line = row.line, error = %err, "dropping row");
                stats.record_drop(&err);
                continue;
            }
        };

        if emails.contains(&customer.email) {
            debug!(line = row.line, email = %customer.email, "duplicate customer");
            stats.duplicates_removed += 1;
            continue;
        }

        let key = customer.key();
        if let Some(key) = key.as_ref().filter(|k| ids.contains(*k)) {
            let err = RowError::DuplicateNaturalId(key.clone());
            warn!(file = "customers", line = row.line, error = %err, "dropping row");
            stats.record_drop(&err);
            continue;
        }

        // Only accepted rows claim their email and id
        emails.insert(customer.email.clone());
        ids.extend(key);
        stats.values_filled += filled;
        records.push(customer);
    }

    Cleaned { records, stats }
}

/// Returns the customer and how many optional fields fell back to NULL
fn validate_customer(raw: RawCustomer) -> Result<(Customer, u64), RowError> {
    let first_name = non_blank(raw.first_name).ok_or(RowError::MissingField("first_name"))?;
    let last_name = non_blank(raw.last_name).ok_or(RowError::MissingField("last_name"))?;
    let email = non_blank(raw.email)
        .ok_or(RowError::MissingField("email"))?
        .to_lowercase();
    if !email.contains('@') {
        return Err(RowError::InvalidValue {
            field: "email",
            value: email,
        });
    }

    let phone = non_blank(raw.phone).and_then(|p| normalize_phone(&p));
    let city = non_blank(raw.city);
    let registration_date = non_blank(raw.registration_date).and_then(|d| parse_date(&d));

    let filled = [phone.is_none(), city.is_none(), registration_date.is_none()]
        .iter()
        .filter(|missing| **missing)
        .count() as u64;

    Ok((
        Customer {
            natural_id: non_blank(raw.customer_id),
            first_name,
            last_name,
            email,
            phone,
            city,
            registration_date,
        },
        filled,
    ))
}
