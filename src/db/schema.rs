//! Database schema and record types

use serde::{Deserialize, Serialize};

/// Table layout of the resource database. The service only reads it; the
/// schema is applied to in-memory databases used by tests and tooling.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    link TEXT,
    location TEXT,
    description TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_name ON records(name);
";

/// Columns selected for every location query, NULLs flattened to empty text
pub(super) const RECORD_COLUMNS: &str =
    "name, COALESCE(location, ''), COALESCE(description, ''), link";

/// A food resource: food bank, pantry, soup kitchen or store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,
    /// Free-text address
    pub location: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl LocationRecord {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        link: Option<&str>,
    ) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            description: description.into(),
            link: link.filter(|l| !l.trim().is_empty()).map(String::from),
        }
    }
}

/// Number of records sharing one location string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCount {
    pub location: String,
    pub count: i64,
}

/// Summary of the resource database
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub total_records: i64,
    pub records_with_links: i64,
    pub top_locations: Vec<LocationCount>,
}
