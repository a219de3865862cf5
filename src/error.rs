use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a source row did not make it into the cleaned output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    ParseError,
    MissingRequiredField,
    InvalidValue,
    InvalidTransactionDate,
    DuplicateNaturalId,
    OrphanReference,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::ParseError => "parse error",
            DropReason::MissingRequiredField => "missing required field",
            DropReason::InvalidValue => "invalid value",
            DropReason::InvalidTransactionDate => "invalid transaction date",
            DropReason::DuplicateNaturalId => "duplicate natural id",
            DropReason::OrphanReference => "orphan reference",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row-level failures. These never abort a run: the row is dropped and tallied.
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("malformed row: {0}")]
    Parse(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("unparseable transaction date: {0:?}")]
    InvalidDate(String),

    #[error("natural id {0} already belongs to another record")]
    DuplicateNaturalId(String),

    #[error("orphan reference: {kind} {id} not found")]
    Orphan { kind: &'static str, id: String },
}

impl RowError {
    pub fn reason(&self) -> DropReason {
        match self {
            RowError::Parse(_) => DropReason::ParseError,
            RowError::MissingField(_) => DropReason::MissingRequiredField,
            RowError::InvalidValue { .. } => DropReason::InvalidValue,
            RowError::InvalidDate(_) => DropReason::InvalidTransactionDate,
            RowError::DuplicateNaturalId(_) => DropReason::DuplicateNaturalId,
            RowError::Orphan { .. } => DropReason::OrphanReference,
        }
    }
}

/// Store-level failures. Always fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot connect to store at {path}: {source}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("unresolved reference while loading: {0}")]
    UnresolvedReference(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_error_reasons() {
        assert_eq!(
            RowError::MissingField("email").reason(),
            DropReason::MissingRequiredField
        );
        assert_eq!(
            RowError::Orphan { kind: "product", id: "P999".into() }.reason(),
            DropReason::OrphanReference
        );
        assert_eq!(
            RowError::InvalidDate("yesterday".into()).reason(),
            DropReason::InvalidTransactionDate
        );
    }

    #[test]
    fn test_drop_reason_display() {
        assert_eq!(DropReason::OrphanReference.to_string(), "orphan reference");
        assert_eq!(
            serde_json::to_string(&DropReason::MissingRequiredField).unwrap(),
            "\"missing_required_field\""
        );
    }
}
