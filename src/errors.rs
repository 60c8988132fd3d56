//! Unified error type for the inventory ledger.
//!
//! Every fallible operation returns [`Result`]. Callers that need to react to the
//! broad class of failure (bad input, missing record, conflicting write, missing
//! privilege) use [`Error::kind`] instead of matching every variant.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Broad failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or out-of-range input, including stock and PO balance checks
    Validation,
    /// A referenced product, purchase order, invoice or bin entry is missing
    NotFound,
    /// Duplicate invoice number or a write that lost a race
    Conflict,
    /// The caller lacks the privilege for the operation
    Authorization,
    /// Storage, serialization or configuration failure
    Internal,
}

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Generic input validation failure
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// A line quantity could not be parsed
    #[error("Invalid quantity '{raw}' for product {product}")]
    InvalidQuantity {
        /// Product name (or id when the name is unknown)
        product: String,
        /// The text that was supplied
        raw: String,
    },

    /// A numeric amount was not finite or out of range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Stock at a location would go below zero
    #[error(
        "Insufficient stock for {product} at {location}: available {available}, requested {requested}"
    )]
    InsufficientStock {
        /// Product name
        product: String,
        /// Location name
        location: String,
        /// Quantity on hand before the operation
        available: f64,
        /// Quantity the operation needs
        requested: f64,
    },

    /// An invoice line asks for more than a PO line has left
    #[error(
        "Quantity {requested} for {product} exceeds remaining balance {remaining} on PO {po_number} by {excess}"
    )]
    ExceedsPurchaseOrder {
        /// Product name
        product: String,
        /// Purchase order number
        po_number: String,
        /// Quantity the invoice line asks for
        requested: f64,
        /// Remaining balance on the PO line
        remaining: f64,
        /// `requested - remaining`
        excess: f64,
    },

    /// A referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record ("Product", "Invoice", ...)
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Uniqueness violation or store contention
    #[error("Conflict: {message}")]
    Conflict {
        /// Human-readable reason
        message: String,
    },

    /// The caller may not perform the action
    #[error("User {user_id} is not allowed to {action}")]
    Unauthorized {
        /// Caller identity
        user_id: String,
        /// Action that was refused
        action: String,
    },

    /// Configuration loading or parsing failure
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Snapshot or summary (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::NotFound`] error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`Error::Conflict`] error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. }
            | Self::InvalidQuantity { .. }
            | Self::InvalidAmount { .. }
            | Self::InsufficientStock { .. }
            | Self::ExceedsPurchaseOrder { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::Config { .. } | Self::Database(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::Conflict { message },
            _ => Self::Database(err),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(
            Error::InsufficientStock {
                product: "Cement".to_string(),
                location: "WH1".to_string(),
                available: 1.0,
                requested: 2.0,
            }
            .kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::not_found("Invoice", 7).kind(), ErrorKind::NotFound);
        assert_eq!(Error::conflict("dup").kind(), ErrorKind::Conflict);
        assert_eq!(
            Error::Unauthorized {
                user_id: "u1".to_string(),
                action: "restore invoices".to_string(),
            }
            .kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            Error::Database(DbErr::Custom("boom".to_string())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_not_found_message_names_entity() {
        let err = Error::not_found("Product", 42);
        assert_eq!(err.to_string(), "Product not found: 42");
    }
}
