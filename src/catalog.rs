//! Product catalog helpers.
//!
//! A small typed layer over generic records: the sample product set used by
//! [`Database::seed_catalog`](crate::Database::seed_catalog), the constraint
//! preset that keeps stock non-negative, and a [`Product`] view.

use occstore_concurrency::{Constraints, ValidationError};
use occstore_core::{Fields, Record, RecordId, Timestamp, Version};
use serde::Serialize;

/// Field holding the product name
pub const NAME: &str = "name";
/// Field holding the unit price
pub const PRICE: &str = "price";
/// Field holding units in stock
pub const STOCK: &str = "stock";
/// Field holding the category label
pub const CATEGORY: &str = "category";

/// Fields for one product.
pub fn product_fields(name: &str, price: f64, stock: i64, category: &str) -> Fields {
    Fields::new()
        .with(NAME, name)
        .with(PRICE, price)
        .with(STOCK, stock)
        .with(CATEGORY, category)
}

/// The five sample products.
pub fn seed_products() -> Vec<Fields> {
    vec![
        product_fields("Wireless Mouse", 29.99, 150, "Electronics"),
        product_fields("Mechanical Keyboard", 89.99, 75, "Electronics"),
        product_fields("USB-C Hub", 49.99, 200, "Electronics"),
        product_fields("Monitor Stand", 39.99, 50, "Accessories"),
        product_fields("Desk Lamp", 24.99, 100, "Accessories"),
    ]
}

/// Inclusive minimums of the catalog preset.
pub(crate) const MINIMUMS: &[(&str, i64)] = &[(STOCK, 0)];

/// Fields every product must carry.
pub(crate) const REQUIRED: &[&str] = &[NAME, CATEGORY];

/// Catalog invariants: stock never negative, name and category present.
pub fn constraints() -> Constraints {
    let with_minimums = MINIMUMS
        .iter()
        .fold(Constraints::new(), |c, &(field, min)| c.min(field, min));
    REQUIRED.iter().fold(with_minimums, |c, &field| c.require(field))
}

/// Typed view of a product record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    /// Record id
    pub id: RecordId,
    /// Product name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub stock: i64,
    /// Category label
    pub category: String,
    /// Version the view was read at
    pub version: Version,
    /// Creation time
    pub created_at: Timestamp,
    /// Time of the last update, if any
    pub last_modified: Option<Timestamp>,
}

impl TryFrom<&Record> for Product {
    type Error = ValidationError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        let fields = &record.fields;
        Ok(Self {
            id: record.id,
            name: text(fields, NAME)?,
            price: number(fields, PRICE)?,
            stock: integer(fields, STOCK)?,
            category: text(fields, CATEGORY)?,
            version: record.version,
            created_at: record.created_at,
            last_modified: record.last_modified,
        })
    }
}

impl Product {
    /// Fields describing this product, for a replacement.
    pub fn to_fields(&self) -> Fields {
        product_fields(&self.name, self.price, self.stock, &self.category)
    }
}

fn missing(field: &str) -> ValidationError {
    ValidationError::MissingField {
        field: field.to_string(),
    }
}

fn wrong_type(field: &str, expected: &'static str, actual: &'static str) -> ValidationError {
    ValidationError::WrongType {
        field: field.to_string(),
        expected,
        actual,
    }
}

fn text(fields: &Fields, field: &str) -> Result<String, ValidationError> {
    let value = fields.get(field).ok_or_else(|| missing(field))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| wrong_type(field, "String", value.type_name()))
}

fn integer(fields: &Fields, field: &str) -> Result<i64, ValidationError> {
    let value = fields.get(field).ok_or_else(|| missing(field))?;
    value
        .as_int()
        .ok_or_else(|| wrong_type(field, "Int", value.type_name()))
}

/// Prices may be stored as Float or Int.
fn number(fields: &Fields, field: &str) -> Result<f64, ValidationError> {
    let value = fields.get(field).ok_or_else(|| missing(field))?;
    value
        .as_float()
        .or_else(|| value.as_int().map(|n| n as f64))
        .ok_or_else(|| wrong_type(field, "Float", value.type_name()))
}
