//! Append-only purchase log.

use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime, Timelike};
use tracing::warn;

use crate::error::{InventoryError, InventoryResult};

/// Timestamp layout used at the start of every log line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One recorded purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseLogEntry {
    /// Local wall-clock time of the purchase, second precision.
    pub timestamp: NaiveDateTime,
    /// Customer name as entered.
    pub user: String,
    /// Category (department) the item was bought from.
    pub category: String,
    /// Item name.
    pub item: String,
    /// Units purchased.
    pub quantity: u64,
}

impl PurchaseLogEntry {
    /// Entry stamped with the current local time.
    pub fn now(
        user: impl Into<String>,
        category: impl Into<String>,
        item: impl Into<String>,
        quantity: u64,
    ) -> Self {
        let timestamp = Local::now().naive_local();
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self {
            timestamp,
            user: user.into(),
            category: category.into(),
            item: item.into(),
            quantity,
        }
    }

    /// Parse a line previously written by [`PurchaseLog::append`].
    ///
    /// The format has no escaping. A user name containing ` purchased ` is
    /// split at its first occurrence, so such lines come back with the wrong
    /// user or are skipped.
    pub fn parse(line: &str) -> Option<Self> {
        let (stamp, rest) = line.split_once(" | User: ")?;
        let timestamp = NaiveDateTime::parse_from_str(stamp.trim(), TIMESTAMP_FORMAT).ok()?;
        let (user, rest) = rest.split_once(" purchased ")?;
        let (quantity, rest) = rest.split_once(" x ")?;
        let (item, category) = rest.rsplit_once(" from ")?;
        Some(Self {
            timestamp,
            user: user.to_string(),
            category: category.trim_end().to_string(),
            item: item.to_string(),
            quantity: quantity.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for PurchaseLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | User: {} purchased {} x {} from {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.user,
            self.quantity,
            self.item,
            self.category
        )
    }
}

/// Plain-text log with one line per purchase.
#[derive(Debug, Clone)]
pub struct PurchaseLog {
    path: PathBuf,
}

impl PurchaseLog {
    /// Log stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line for `entry`. Earlier lines are never touched.
    pub fn append(&self, entry: &PurchaseLogEntry) -> InventoryResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| InventoryError::io(parent, err))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| InventoryError::io(&self.path, err))?;
        writeln!(file, "{entry}").map_err(|err| InventoryError::io(&self.path, err))
    }

    /// Full log contents, or an empty string when nothing was logged yet.
    pub fn read_all(&self) -> InventoryResult<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(InventoryError::io(&self.path, err)),
        }
    }

    /// Parsed entries in write order. Lines that do not parse are skipped.
    pub fn entries(&self) -> InventoryResult<Vec<PurchaseLogEntry>> {
        let contents = self.read_all()?;
        let mut entries = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match PurchaseLogEntry::parse(line) {
                Some(entry) => entries.push(entry),
                None => warn!(line = index + 1, "Skipping malformed purchase log line"),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn entry_at(user: &str, item: &str, quantity: u64) -> PurchaseLogEntry {
        let timestamp = NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|date| date.and_hms_opt(14, 5, 0))
            .expect("valid timestamp");
        PurchaseLogEntry {
            timestamp,
            user: user.to_string(),
            category: "Electronics".to_string(),
            item: item.to_string(),
            quantity,
        }
    }

    #[test]
    fn line_format_is_fixed() {
        let entry = entry_at("alice", "Mouse", 3);
        assert_eq!(
            entry.to_string(),
            "2024-03-09 14:05:00 | User: alice purchased 3 x Mouse from Electronics"
        );
    }

    #[test]
    fn missing_log_reads_as_empty() -> Result<()> {
        let dir = tempdir()?;
        let log = PurchaseLog::new(dir.path().join("log.txt"));
        assert_eq!(log.read_all()?, "");
        assert!(log.entries()?.is_empty());
        Ok(())
    }

    #[test]
    fn append_preserves_earlier_lines() -> Result<()> {
        let dir = tempdir()?;
        let log = PurchaseLog::new(dir.path().join("log.txt"));
        let first = entry_at("alice", "Mouse", 3);
        let second = entry_at("bob", "USB Hub", 1);

        log.append(&first)?;
        let after_first = log.read_all()?;
        log.append(&second)?;
        let after_second = log.read_all()?;

        assert!(after_second.starts_with(&after_first));
        assert_eq!(after_second.lines().count(), 2);
        assert_eq!(log.entries()?, vec![first, second]);
        Ok(())
    }

    #[test]
    fn malformed_lines_are_skipped() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("log.txt");
        fs::write(
            &path,
            "not a purchase\n2024-03-09 14:05:00 | User: carol purchased 2 x Lip Balm from Cosmetics\n",
        )?;
        let entries = PurchaseLog::new(&path).entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user, "carol");
        assert_eq!(entries[0].item, "Lip Balm");
        assert_eq!(entries[0].category, "Cosmetics");
        assert_eq!(entries[0].quantity, 2);
        Ok(())
    }
}
