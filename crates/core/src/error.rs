//! Error types shared by the store, the purchase log and the domain operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Rejected user input. Every variant renders a message suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Purchase attempted without a username.
    #[error("Please enter a username.")]
    MissingUser,
    /// Category or item not selected, or the selection no longer exists.
    #[error("Select a category and item.")]
    MissingSelection,
    /// Quantity is not a positive integer.
    #[error("Enter a valid positive integer quantity.")]
    InvalidQuantity,
    /// Requested quantity exceeds the stock on hand.
    #[error("Only {available} in stock.")]
    InsufficientStock {
        /// Count currently stored for the item.
        available: u64,
    },
    /// Admin form submitted without an item name.
    #[error("Enter an item name.")]
    MissingName,
    /// Price or count failed to parse as a non-negative number.
    #[error("Enter a valid non-negative price and integer count.")]
    InvalidNumeric,
    /// Item already present in the category.
    #[error("Item '{name}' already exists in {category}. Use update instead.")]
    DuplicateItem {
        /// Category that already holds the item.
        category: String,
        /// Offending item name.
        name: String,
    },
    /// Item missing from the category.
    #[error("'{name}' not found in {category}.")]
    ItemNotFound {
        /// Category that was searched.
        category: String,
        /// Item name that was requested.
        name: String,
    },
}

/// Failure returned by inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Input was rejected before anything changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Admin-only operation attempted without logging in.
    #[error("Admin access required.")]
    AccessDenied,
    /// Reading or writing a file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File that could not be accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The document could not be serialised.
    #[error("failed to encode inventory: {0}")]
    Encode(#[from] serde_json::Error),
}

impl InventoryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Validation failure carried by this error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type InventoryResult<T> = Result<T, InventoryError>;
