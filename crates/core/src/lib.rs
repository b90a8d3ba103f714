#![warn(clippy::all, missing_docs)]

//! Core inventory logic for Stockroom.
//!
//! This crate hosts the inventory document model, configuration handling,
//! file persistence, the purchase log and the validated operations used by
//! the terminal UI and any future frontends.

pub mod config;
pub mod error;
pub mod inventory;
pub mod models;
pub mod purchase_log;
pub mod session;
pub mod store;

pub use config::AppConfig;
pub use error::{InventoryError, InventoryResult, ValidationError};
pub use models::{Category, InventoryDocument, ItemRecord, StockItem};
pub use purchase_log::{PurchaseLog, PurchaseLogEntry};
pub use session::{AccessState, AdminSession, LoginOutcome};
pub use store::{InventoryStore, LoadOutcome, LoadStatus, Storage};
