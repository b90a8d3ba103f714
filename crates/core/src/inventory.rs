//! Validated inventory mutations.
//!
//! Every operation receives the single in-memory document by mutable
//! reference together with the [`Storage`] it writes through to. Text inputs
//! are taken exactly as typed; a blank field counts as unset.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::{
    error::{InventoryError, InventoryResult, ValidationError},
    models::{Category, InventoryDocument, ItemRecord},
    purchase_log::PurchaseLogEntry,
    store::{LoadOutcome, Storage},
};

/// Raw purchase form input.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseRequest<'a> {
    /// Customer name.
    pub user: &'a str,
    /// Selected category.
    pub category: &'a str,
    /// Selected item.
    pub item: &'a str,
    /// Quantity as typed.
    pub quantity: &'a str,
}

/// Raw admin form input shared by add, update and remove.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemForm<'a> {
    /// Target category.
    pub category: &'a str,
    /// Item name.
    pub name: &'a str,
    /// Price as typed; blank keeps the stored value on update.
    pub price: &'a str,
    /// Count as typed; blank keeps the stored value on update.
    pub count: &'a str,
}

/// Result of a successful purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// The line appended to the purchase log.
    pub entry: PurchaseLogEntry,
    /// Stock left after the purchase.
    pub remaining: u64,
}

impl PurchaseReceipt {
    /// Confirmation shown to the customer.
    pub fn message(&self) -> String {
        format!(
            "Purchased {} x {} from {}.",
            self.entry.quantity, self.entry.item, self.entry.category
        )
    }
}

/// Admin change that was applied and saved.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemChange {
    /// New item inserted.
    Added {
        /// Category the item went into.
        category: String,
        /// Item name.
        name: String,
        /// Stored record.
        record: ItemRecord,
    },
    /// Existing item overwritten.
    Updated {
        /// Category holding the item.
        category: String,
        /// Item name.
        name: String,
        /// Record before the update.
        before: ItemRecord,
        /// Record after the update.
        after: ItemRecord,
    },
}

impl ItemChange {
    /// Confirmation shown to the admin.
    pub fn message(&self) -> String {
        match self {
            ItemChange::Added { category, name, .. } => format!("Added {name} to {category}."),
            ItemChange::Updated { category, name, .. } => {
                format!("Updated {name} in {category}.")
            }
        }
    }
}

/// What happened to a removal once the caller answered the prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// Entry deleted and the document saved.
    Removed {
        /// Category the item was removed from.
        category: String,
        /// Item name.
        name: String,
        /// Record that was deleted.
        record: ItemRecord,
    },
    /// Confirmation declined; nothing changed.
    Cancelled,
}

impl RemoveOutcome {
    /// Status line for the caller.
    pub fn message(&self) -> String {
        match self {
            RemoveOutcome::Removed { category, name, .. } => {
                format!("Removed {name} from {category}.")
            }
            RemoveOutcome::Cancelled => "Removal cancelled.".to_string(),
        }
    }
}

/// A validated removal waiting for a yes/no decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    category: String,
    name: String,
}

impl PendingRemoval {
    /// Category of the item awaiting removal.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Name of the item awaiting removal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Question to put to the user.
    pub fn prompt(&self) -> String {
        format!("Remove '{}' from {}?", self.name, self.category)
    }

    /// Apply the decision. Declining leaves the document and file untouched.
    pub fn resolve(
        self,
        document: &mut InventoryDocument,
        storage: &Storage,
        confirmed: bool,
    ) -> InventoryResult<RemoveOutcome> {
        if !confirmed {
            debug!(category = %self.category, item = %self.name, "Removal declined");
            return Ok(RemoveOutcome::Cancelled);
        }

        let record = document
            .category_mut(&self.category)
            .and_then(|category| category.remove(&self.name))
            .ok_or_else(|| ValidationError::ItemNotFound {
                category: self.category.clone(),
                name: self.name.clone(),
            })?;
        storage.store.save(document)?;
        info!(category = %self.category, item = %self.name, "Item removed");
        Ok(RemoveOutcome::Removed {
            category: self.category,
            name: self.name,
            record,
        })
    }
}

/// Buy `quantity` units of an item, saving the document and logging the sale.
pub fn purchase(
    document: &mut InventoryDocument,
    storage: &Storage,
    request: PurchaseRequest<'_>,
) -> InventoryResult<PurchaseReceipt> {
    let user = request.user.trim();
    if user.is_empty() {
        return Err(reject(ValidationError::MissingUser));
    }
    let category = request.category;
    let item = request.item;
    if category.is_empty() || item.is_empty() {
        return Err(reject(ValidationError::MissingSelection));
    }
    let available = document
        .item(category, item)
        .map(|record| record.count)
        .ok_or_else(|| reject(ValidationError::MissingSelection))?;
    let quantity =
        parse_quantity(request.quantity).ok_or_else(|| reject(ValidationError::InvalidQuantity))?;
    if quantity > available {
        return Err(reject(ValidationError::InsufficientStock { available }));
    }

    let remaining = available - quantity;
    if let Some(record) = document
        .category_mut(category)
        .and_then(|contents| contents.get_mut(item))
    {
        record.count = remaining;
    }
    storage.store.save(document)?;

    let entry = PurchaseLogEntry::now(user, category, item, quantity);
    storage.log.append(&entry)?;
    info!(user, category, item, quantity, remaining, "Purchase recorded");
    Ok(PurchaseReceipt { entry, remaining })
}

/// Insert a new item into an existing category.
pub fn add_item(
    document: &mut InventoryDocument,
    storage: &Storage,
    form: ItemForm<'_>,
) -> InventoryResult<ItemChange> {
    let name = required_name(form.name)?;
    let price = parse_price(form.price).ok_or_else(|| reject(ValidationError::InvalidNumeric))?;
    let count = parse_count(form.count).ok_or_else(|| reject(ValidationError::InvalidNumeric))?;
    let contents = selected_category(document, form.category)?;
    let record = ItemRecord { price, count };
    if !contents.insert(name, record) {
        return Err(reject(ValidationError::DuplicateItem {
            category: form.category.to_string(),
            name: name.to_string(),
        }));
    }

    storage.store.save(document)?;
    info!(category = form.category, item = name, price, count, "Item added");
    Ok(ItemChange::Added {
        category: form.category.to_string(),
        name: name.to_string(),
        record,
    })
}

/// Overwrite price and/or count of an existing item. Blank fields keep the
/// stored value.
pub fn update_item(
    document: &mut InventoryDocument,
    storage: &Storage,
    form: ItemForm<'_>,
) -> InventoryResult<ItemChange> {
    let name = required_name(form.name)?;
    let contents = selected_category(document, form.category)?;
    let record = contents
        .get_mut(name)
        .ok_or_else(|| not_found(form.category, name))?;

    let before = *record;
    let price = optional_field(form.price, before.price, parse_price)?;
    let count = optional_field(form.count, before.count, parse_count)?;
    record.price = price;
    record.count = count;
    let after = *record;

    storage.store.save(document)?;
    info!(category = form.category, item = name, price, count, "Item updated");
    Ok(ItemChange::Updated {
        category: form.category.to_string(),
        name: name.to_string(),
        before,
        after,
    })
}

/// Validate a removal and return the pending confirmation.
pub fn plan_removal(
    document: &InventoryDocument,
    category: &str,
    name: &str,
) -> InventoryResult<PendingRemoval> {
    let name = required_name(name)?;
    let contents = Some(category)
        .filter(|category| !category.is_empty())
        .and_then(|category| document.category(category))
        .ok_or_else(|| reject(ValidationError::MissingSelection))?;
    if !contents.contains(name) {
        return Err(not_found(category, name));
    }
    Ok(PendingRemoval {
        category: category.to_string(),
        name: name.to_string(),
    })
}

/// Validate, ask `confirm`, then remove. For callers that can answer the
/// prompt synchronously.
pub fn remove_item<F>(
    document: &mut InventoryDocument,
    storage: &Storage,
    category: &str,
    name: &str,
    confirm: F,
) -> InventoryResult<RemoveOutcome>
where
    F: FnOnce(&PendingRemoval) -> bool,
{
    let pending = plan_removal(document, category, name)?;
    let confirmed = confirm(&pending);
    pending.resolve(document, storage, confirmed)
}

/// Discard the in-memory document and load it again from disk.
pub fn reload(storage: &Storage) -> InventoryResult<LoadOutcome> {
    let outcome = storage.store.load()?;
    info!(status = ?outcome.status, "Inventory reloaded");
    Ok(outcome)
}

/// Save the current document and return where it was written.
pub fn export(document: &InventoryDocument, storage: &Storage) -> InventoryResult<PathBuf> {
    storage.store.save(document)?;
    let path = storage.store.path().to_path_buf();
    info!(path = %path.display(), "Inventory exported");
    Ok(path)
}

fn reject(err: ValidationError) -> InventoryError {
    debug!(reason = %err, "Validation failed");
    err.into()
}

fn not_found(category: &str, name: &str) -> InventoryError {
    reject(ValidationError::ItemNotFound {
        category: category.to_string(),
        name: name.to_string(),
    })
}

fn required_name(raw: &str) -> InventoryResult<&str> {
    let name = raw.trim();
    if name.is_empty() {
        Err(reject(ValidationError::MissingName))
    } else {
        Ok(name)
    }
}

fn selected_category<'d>(
    document: &'d mut InventoryDocument,
    category: &str,
) -> InventoryResult<&'d mut Category> {
    if category.is_empty() {
        return Err(reject(ValidationError::MissingSelection));
    }
    document
        .category_mut(category)
        .ok_or_else(|| reject(ValidationError::MissingSelection))
}

fn optional_field<T>(raw: &str, current: T, parse: fn(&str) -> Option<T>) -> InventoryResult<T> {
    if raw.trim().is_empty() {
        return Ok(current);
    }
    parse(raw).ok_or_else(|| reject(ValidationError::InvalidNumeric))
}

fn parse_quantity(raw: &str) -> Option<u64> {
    let value: i64 = raw.trim().parse().ok()?;
    if value > 0 {
        u64::try_from(value).ok()
    } else {
        None
    }
}

fn parse_price(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    // `abs` folds "-0" into 0.0 so the file never carries a negative zero.
    (value.is_finite() && value >= 0.0).then_some(value.abs())
}

fn parse_count(raw: &str) -> Option<u64> {
    let value: i64 = raw.trim().parse().ok()?;
    u64::try_from(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::DEFAULT_CATEGORIES,
        purchase_log::PurchaseLog,
        store::{InventoryStore, LoadStatus},
    };
    use anyhow::Result;
    use std::{fs, path::Path};
    use tempfile::tempdir;

    fn storage_in(dir: &Path) -> Storage {
        Storage::new(
            InventoryStore::new(
                dir.join("items.json"),
                DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            ),
            PurchaseLog::new(dir.join("log.txt")),
        )
    }

    fn form<'a>(category: &'a str, name: &'a str, price: &'a str, count: &'a str) -> ItemForm<'a> {
        ItemForm {
            category,
            name,
            price,
            count,
        }
    }

    fn buy<'a>(user: &'a str, item: &'a str, quantity: &'a str) -> PurchaseRequest<'a> {
        PurchaseRequest {
            user,
            category: "Electronics",
            item,
            quantity,
        }
    }

    fn stocked(storage: &Storage) -> Result<InventoryDocument> {
        let mut document = storage.store.load()?.document;
        add_item(&mut document, storage, form("Electronics", "Mouse", "9.99", "10"))?;
        Ok(document)
    }

    fn validation(result: InventoryResult<impl std::fmt::Debug>) -> ValidationError {
        match result {
            Err(InventoryError::Validation(err)) => err,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_store_add_then_purchase() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());

        let outcome = storage.store.load()?;
        assert_eq!(outcome.status, LoadStatus::Created);
        assert_eq!(outcome.document.categories().len(), 4);
        let mut document = outcome.document;

        let added = add_item(&mut document, &storage, form("Electronics", "Mouse", "9.99", "10"))?;
        assert_eq!(added.message(), "Added Mouse to Electronics.");

        let receipt = purchase(&mut document, &storage, buy("alice", "Mouse", "3"))?;
        assert_eq!(receipt.remaining, 7);
        assert_eq!(receipt.message(), "Purchased 3 x Mouse from Electronics.");
        assert_eq!(document.item("Electronics", "Mouse").map(|r| r.count), Some(7));

        let log = storage.log.read_all()?;
        assert_eq!(log.lines().count(), 1);
        assert!(log
            .trim_end()
            .ends_with("User: alice purchased 3 x Mouse from Electronics"));

        let reloaded = reload(&storage)?.document;
        assert_eq!(reloaded.item("Electronics", "Mouse").map(|r| r.count), Some(7));
        Ok(())
    }

    #[test]
    fn purchase_up_to_available_stock() -> Result<()> {
        for quantity in 1..=10u64 {
            let dir = tempdir()?;
            let storage = storage_in(dir.path());
            let mut document = stocked(&storage)?;

            let receipt = purchase(
                &mut document,
                &storage,
                buy("dana", "Mouse", &quantity.to_string()),
            )?;
            assert_eq!(receipt.remaining, 10 - quantity);
            assert_eq!(storage.log.entries()?.len(), 1);
        }
        Ok(())
    }

    #[test]
    fn purchase_beyond_stock_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        let err = validation(purchase(&mut document, &storage, buy("alice", "Mouse", "11")));
        assert_eq!(err, ValidationError::InsufficientStock { available: 10 });
        assert_eq!(document.item("Electronics", "Mouse").map(|r| r.count), Some(10));
        assert_eq!(storage.log.read_all()?, "");
        Ok(())
    }

    #[test]
    fn purchase_without_user_changes_nothing() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;
        let before = fs::read(storage.store.path())?;
        let snapshot = document.clone();

        for user in ["", "   "] {
            let err = validation(purchase(&mut document, &storage, buy(user, "Mouse", "1")));
            assert_eq!(err, ValidationError::MissingUser);
        }
        assert_eq!(document, snapshot);
        assert_eq!(fs::read(storage.store.path())?, before);
        assert!(!storage.log.path().exists());
        Ok(())
    }

    #[test]
    fn purchase_validates_selection_and_quantity() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        let err = validation(purchase(&mut document, &storage, buy("alice", "", "1")));
        assert_eq!(err, ValidationError::MissingSelection);
        let err = validation(purchase(&mut document, &storage, buy("alice", "Keyboard", "1")));
        assert_eq!(err, ValidationError::MissingSelection);
        let unknown_category = PurchaseRequest {
            category: "Garden",
            ..buy("alice", "Mouse", "1")
        };
        let err = validation(purchase(&mut document, &storage, unknown_category));
        assert_eq!(err, ValidationError::MissingSelection);

        for quantity in ["", "0", "-2", "1.5", "three"] {
            let err = validation(purchase(&mut document, &storage, buy("alice", "Mouse", quantity)));
            assert_eq!(err, ValidationError::InvalidQuantity, "quantity {quantity:?}");
        }
        assert_eq!(document.item("Electronics", "Mouse").map(|r| r.count), Some(10));
        Ok(())
    }

    #[test]
    fn add_item_round_trips_through_reload() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = storage.store.load()?.document;

        add_item(&mut document, &storage, form("Food", "Coffee Beans", "12.5", "40"))?;
        let reloaded = reload(&storage)?;
        assert_eq!(reloaded.status, LoadStatus::Loaded);
        assert_eq!(
            reloaded.document.item("Food", "Coffee Beans"),
            Some(&ItemRecord {
                price: 12.5,
                count: 40
            })
        );
        Ok(())
    }

    #[test]
    fn add_item_validation() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        let err = validation(add_item(&mut document, &storage, form("Food", " ", "1", "1")));
        assert_eq!(err, ValidationError::MissingName);

        for (price, count) in [("abc", "1"), ("-1", "1"), ("1", "-1"), ("1", "2.5"), ("", "1"), ("NaN", "1")] {
            let err = validation(add_item(&mut document, &storage, form("Food", "Tea", price, count)));
            assert_eq!(err, ValidationError::InvalidNumeric, "price {price:?} count {count:?}");
        }

        let err = validation(add_item(&mut document, &storage, form("Garden", "Hose", "5", "1")));
        assert_eq!(err, ValidationError::MissingSelection);

        let err = validation(add_item(
            &mut document,
            &storage,
            form("Electronics", "Mouse", "5", "1"),
        ));
        assert_eq!(
            err,
            ValidationError::DuplicateItem {
                category: "Electronics".to_string(),
                name: "Mouse".to_string(),
            }
        );
        assert_eq!(
            document.item("Electronics", "Mouse"),
            Some(&ItemRecord {
                price: 9.99,
                count: 10
            })
        );
        Ok(())
    }

    #[test]
    fn negative_zero_price_is_stored_as_zero() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = storage.store.load()?.document;

        add_item(&mut document, &storage, form("Food", "Sample", "-0", "3"))?;
        let price = document.item("Food", "Sample").map(|record| record.price);
        assert_eq!(price.map(f64::is_sign_negative), Some(false));

        let text = fs::read_to_string(storage.store.path())?;
        assert!(!text.contains("-0"), "{text}");
        Ok(())
    }

    #[test]
    fn failed_save_keeps_change_in_memory_and_skips_log() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory")?;
        let storage = Storage::new(
            InventoryStore::new(blocker.join("items.json"), Vec::new()),
            PurchaseLog::new(dir.path().join("log.txt")),
        );
        let mut document = InventoryDocument::default_categories();
        if let Some(category) = document.category_mut("Electronics") {
            category.insert(
                "Mouse",
                ItemRecord {
                    price: 9.99,
                    count: 10,
                },
            );
        }

        let result = purchase(&mut document, &storage, buy("alice", "Mouse", "3"));
        assert!(matches!(result, Err(InventoryError::Io { .. })), "{result:?}");
        assert_eq!(document.item("Electronics", "Mouse").map(|r| r.count), Some(7));
        assert_eq!(storage.log.read_all()?, "");
        Ok(())
    }

    #[test]
    fn update_with_only_count_keeps_price() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        let change = update_item(&mut document, &storage, form("Electronics", "Mouse", "", "25"))?;
        assert_eq!(change.message(), "Updated Mouse in Electronics.");
        let stored = reload(&storage)?.document;
        assert_eq!(
            stored.item("Electronics", "Mouse"),
            Some(&ItemRecord {
                price: 9.99,
                count: 25
            })
        );
        Ok(())
    }

    #[test]
    fn update_with_only_price_keeps_count() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        update_item(&mut document, &storage, form("Electronics", "Mouse", "14.25", " "))?;
        assert_eq!(
            document.item("Electronics", "Mouse"),
            Some(&ItemRecord {
                price: 14.25,
                count: 10
            })
        );
        Ok(())
    }

    #[test]
    fn update_item_validation() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        let err = validation(update_item(&mut document, &storage, form("Electronics", "", "1", "1")));
        assert_eq!(err, ValidationError::MissingName);
        let err = validation(update_item(&mut document, &storage, form("Electronics", "Cable", "1", "1")));
        assert!(matches!(err, ValidationError::ItemNotFound { .. }));
        let err = validation(update_item(&mut document, &storage, form("Electronics", "Mouse", "-3", "")));
        assert_eq!(err, ValidationError::InvalidNumeric);
        let err = validation(update_item(&mut document, &storage, form("Electronics", "Mouse", "", "x")));
        assert_eq!(err, ValidationError::InvalidNumeric);
        assert_eq!(
            document.item("Electronics", "Mouse"),
            Some(&ItemRecord {
                price: 9.99,
                count: 10
            })
        );
        Ok(())
    }

    #[test]
    fn declined_removal_leaves_file_identical() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;
        let before = fs::read(storage.store.path())?;

        let mut prompt = String::new();
        let outcome = remove_item(&mut document, &storage, "Electronics", "Mouse", |pending| {
            prompt = pending.prompt();
            false
        })?;
        assert_eq!(outcome, RemoveOutcome::Cancelled);
        assert_eq!(prompt, "Remove 'Mouse' from Electronics?");
        assert_eq!(fs::read(storage.store.path())?, before);
        assert!(document.item("Electronics", "Mouse").is_some());
        Ok(())
    }

    #[test]
    fn confirmed_removal_deletes_and_saves() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;

        let pending = plan_removal(&document, "Electronics", "Mouse")?;
        assert_eq!(pending.name(), "Mouse");
        let outcome = pending.resolve(&mut document, &storage, true)?;
        assert_eq!(outcome.message(), "Removed Mouse from Electronics.");
        assert!(document.item("Electronics", "Mouse").is_none());
        assert!(reload(&storage)?.document.item("Electronics", "Mouse").is_none());
        Ok(())
    }

    #[test]
    fn removal_validation() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let document = stocked(&storage)?;

        let err = validation(plan_removal(&document, "Electronics", ""));
        assert_eq!(err, ValidationError::MissingName);
        let err = validation(plan_removal(&document, "Food", "Mouse"));
        assert_eq!(
            err,
            ValidationError::ItemNotFound {
                category: "Food".to_string(),
                name: "Mouse".to_string(),
            }
        );
        Ok(())
    }

    #[test]
    fn reload_discards_unsaved_changes() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let mut document = stocked(&storage)?;
        if let Some(category) = document.category_mut("Food") {
            category.insert(
                "Unsaved",
                ItemRecord {
                    price: 1.0,
                    count: 1,
                },
            );
        }

        document = reload(&storage)?.document;
        assert!(document.item("Food", "Unsaved").is_none());
        assert!(document.item("Electronics", "Mouse").is_some());
        Ok(())
    }

    #[test]
    fn export_writes_current_document() -> Result<()> {
        let dir = tempdir()?;
        let storage = storage_in(dir.path());
        let document = stocked(&storage)?;
        fs::remove_file(storage.store.path())?;

        let path = export(&document, &storage)?;
        assert_eq!(path, storage.store.path());
        assert_eq!(reload(&storage)?.document, document);
        Ok(())
    }
}
