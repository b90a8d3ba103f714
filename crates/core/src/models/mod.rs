//! Inventory document models.
//!
//! The document keeps categories and items in insertion order so the JSON
//! written back to disk stays stable and easy to diff.

use serde::{
    de::{self, Deserializer},
    ser::{SerializeMap, Serializer},
    Deserialize, Serialize,
};
use serde_json::{Map, Value};

/// Categories created when no inventory file exists yet.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Cosmetics", "Electronics", "Food", "Clothing"];

/// Price and stock count stored for a single item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ItemRecord {
    /// Unit price. Always finite and non-negative.
    pub price: f64,
    /// Units in stock.
    pub count: u64,
}

impl<'de> Deserialize<'de> for ItemRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            price: f64,
            count: u64,
        }

        let raw = Raw::deserialize(deserializer)?;
        if !raw.price.is_finite() || raw.price < 0.0 {
            return Err(de::Error::custom(format!(
                "price must be a non-negative number, got {}",
                raw.price
            )));
        }
        Ok(Self {
            price: raw.price.abs(),
            count: raw.count,
        })
    }
}

/// Named item inside a category.
#[derive(Debug, Clone, PartialEq)]
pub struct StockItem {
    /// Item name, unique within its category.
    pub name: String,
    /// Stored price and count.
    pub record: ItemRecord,
}

/// A named group of items.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    name: String,
    items: Vec<StockItem>,
}

impl Category {
    /// Create an empty category.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }

    /// Category name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[StockItem] {
        &self.items
    }

    /// Whether the category holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item names in insertion order.
    pub fn item_names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name.as_str()).collect()
    }

    /// Whether an item with this exact name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    /// Look up an item record by name.
    pub fn get(&self, name: &str) -> Option<&ItemRecord> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map(|item| &item.record)
    }

    /// Mutable access to an item record.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ItemRecord> {
        self.items
            .iter_mut()
            .find(|item| item.name == name)
            .map(|item| &mut item.record)
    }

    /// Append a new item. Returns `false` and leaves the category untouched
    /// when the name is already taken.
    pub fn insert(&mut self, name: impl Into<String>, record: ItemRecord) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.items.push(StockItem { name, record });
        true
    }

    /// Remove an item, returning its record.
    pub fn remove(&mut self, name: &str) -> Option<ItemRecord> {
        let index = self.items.iter().position(|item| item.name == name)?;
        Some(self.items.remove(index).record)
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.items.len()))?;
        for item in &self.items {
            map.serialize_entry(&item.name, &item.record)?;
        }
        map.end()
    }
}

/// The whole inventory: categories mapping item names to records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InventoryDocument {
    categories: Vec<Category>,
}

impl InventoryDocument {
    /// Build a document with the given empty categories.
    pub fn with_categories<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut document = Self::default();
        for name in names {
            let name = name.into();
            if document.category(&name).is_none() {
                document.categories.push(Category::new(name));
            }
        }
        document
    }

    /// Document holding the four built-in categories, all empty.
    pub fn default_categories() -> Self {
        Self::with_categories(DEFAULT_CATEGORIES)
    }

    /// Categories in insertion order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category names in insertion order.
    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(Category::name).collect()
    }

    /// Look up a category by name.
    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    /// Mutable access to a category.
    pub fn category_mut(&mut self, name: &str) -> Option<&mut Category> {
        self.categories
            .iter_mut()
            .find(|category| category.name == name)
    }

    /// Look up an item record under a category.
    pub fn item(&self, category: &str, item: &str) -> Option<&ItemRecord> {
        self.category(category).and_then(|category| category.get(item))
    }

    /// Item names for a category; empty when the category is unknown.
    pub fn item_names(&self, category: &str) -> Vec<&str> {
        self.category(category)
            .map(Category::item_names)
            .unwrap_or_default()
    }

    /// Total number of item records across all categories.
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|category| category.items.len()).sum()
    }

    /// Human-readable stock listing, one line per entry.
    pub fn stock_report(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for category in &self.categories {
            lines.push(format!("--- {} ---", category.name));
            if category.is_empty() {
                lines.push("No items available.".to_string());
            }
            for item in &category.items {
                lines.push(format!(
                    "{} - Price: {:.2}, Stock: {}",
                    item.name, item.record.price, item.record.count
                ));
            }
            lines.push(String::new());
        }
        lines
    }
}

impl Serialize for InventoryDocument {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, category)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for InventoryDocument {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // `preserve_order` keeps the file's key order through `Map`.
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        let mut categories = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let entries = Map::<String, Value>::deserialize(value).map_err(|err| {
                de::Error::custom(format!("category '{name}' is not an object: {err}"))
            })?;
            let mut items = Vec::with_capacity(entries.len());
            for (item, value) in entries {
                let record = ItemRecord::deserialize(value).map_err(|err| {
                    de::Error::custom(format!("invalid record for '{item}' in '{name}': {err}"))
                })?;
                items.push(StockItem { name: item, record });
            }
            categories.push(Category { name, items });
        }
        Ok(Self { categories })
    }
}
