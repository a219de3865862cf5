use std::collections::HashSet;

/// Column data type
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnType {
    /// Auto-incrementing surrogate key
    Serial,
    Integer,
    Text,
    /// Fixed-point money, DECIMAL(10,2)
    Decimal,
    /// Calendar date stored as YYYY-MM-DD
    Date,
}

impl ColumnType {
    /// Declared SQL type
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Serial | ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
            ColumnType::Decimal => "DECIMAL(10,2)",
            ColumnType::Date => "DATE",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    pub unique: bool,
    pub default: Option<&'static str>,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            unique: false,
            default: None,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            unique: false,
            default: None,
        }
    }

    /// Create the surrogate primary key column
    pub const fn serial(name: &'static str) -> Self {
        Self::required(name, ColumnType::Serial)
    }

    pub const fn unique(self) -> Self {
        Self {
            unique: true,
            ..self
        }
    }

    /// Set a SQL literal used as the column default
    pub const fn default_to(self, literal: &'static str) -> Self {
        Self {
            default: Some(literal),
            ..self
        }
    }
}

/// Foreign key reference
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    /// Reference a column with the same name in the parent table
    pub const fn new(column: &'static str, references_table: &'static str) -> Self {
        Self {
            column,
            references_table,
            references_column: column,
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
}

impl TableSchema {
    /// Get all tables this table depends on (FK parents)
    pub fn dependencies(&self) -> HashSet<&'static str> {
        self.foreign_keys
            .iter()
            .map(|fk| fk.references_table)
            .collect()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Columns written by an INSERT (everything except the serial key)
    pub fn insert_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.col_type != ColumnType::Serial)
            .map(|c| c.name)
            .collect()
    }
}
