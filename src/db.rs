//! Database module
//!
//! Read-only access to the table of food resources. Every lookup is a
//! case-insensitive substring match (`LIKE '%term%'`) ordered by name.

mod schema;

pub use schema::*;

use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection, OpenFlags, ToSql};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Description markers that identify SNAP/EBT-accepting retailers
const SNAP_MARKERS: &[&str] = &["SNAP", "EBT", "food stamps"];

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Database connection lock poisoned")]
    LockPoisoned,
    #[error("Database task failed: {0}")]
    Task(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open an existing database file read-only
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database with the schema applied (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Insert a record; only writable (in-memory) databases accept this
    #[allow(dead_code)] // Used in tests
    pub fn insert_record(&self, record: &LocationRecord) -> DbResult<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO records (name, link, location, description) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![record.name, record.link, record.location, record.description],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn query_records(&self, where_clause: &str, params: &[String]) -> DbResult<Vec<LocationRecord>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE {where_clause} ORDER BY name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter().map(|p| p as &dyn ToSql)), |row| {
            let link: Option<String> = row.get(3)?;
            Ok(LocationRecord::new(
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                link.as_deref(),
            ))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    // ==================== Lookups ====================

    /// Records whose name or description mentions `term`
    pub fn search_by_type(&self, term: &str, location: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        let mut clause = "(name LIKE ?1 OR description LIKE ?1)".to_string();
        let mut params = vec![like(term)];
        push_location_filter(&mut clause, &mut params, location);
        self.query_records(&clause, &params)
    }

    /// Stores that accept SNAP/EBT
    pub fn search_snap_accepting(&self, location: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        let markers: Vec<String> = SNAP_MARKERS
            .iter()
            .enumerate()
            .map(|(i, _)| format!("description LIKE ?{}", i + 1))
            .collect();
        let mut clause = format!("({})", markers.join(" OR "));
        let mut params: Vec<String> = SNAP_MARKERS.iter().map(|m| like(m)).collect();
        push_location_filter(&mut clause, &mut params, location);
        self.query_records(&clause, &params)
    }

    /// Records matching a dietary requirement such as halal or kosher
    pub fn search_by_dietary(
        &self,
        requirement: &str,
        location: Option<&str>,
    ) -> DbResult<Vec<LocationRecord>> {
        self.search_by_type(requirement, location)
    }

    /// Every record at a location
    pub fn all_by_location(&self, location: &str) -> DbResult<Vec<LocationRecord>> {
        self.query_records("location LIKE ?1", &[like(location)])
    }

    /// Records in either the city or the state
    pub fn search_by_location(&self, city: &str, state: &str) -> DbResult<Vec<LocationRecord>> {
        self.query_records("location LIKE ?1 OR location LIKE ?2", &[like(city), like(state)])
    }

    /// Free keyword search across name, description and location
    pub fn search_by_keyword(&self, keyword: &str) -> DbResult<Vec<LocationRecord>> {
        self.query_records(
            "name LIKE ?1 OR description LIKE ?1 OR location LIKE ?1",
            &[like(keyword)],
        )
    }

    /// Totals for the resource panel
    pub fn stats(&self) -> DbResult<ResourceStats> {
        let conn = self.lock()?;
        let total_records: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |r| r.get(0))?;
        let records_with_links: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE link IS NOT NULL AND link != ''",
            [],
            |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(
            "SELECT COALESCE(location, ''), COUNT(*) AS count FROM records
             GROUP BY location ORDER BY count DESC, location LIMIT 5",
        )?;
        let top_locations = stmt
            .query_map([], |row| {
                Ok(LocationCount {
                    location: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResourceStats {
            total_records,
            records_with_links,
            top_locations,
        })
    }
}

/// Async view of the resource store used by the chat pipeline
#[async_trait]
pub trait LocationLookup: Send + Sync {
    async fn search_by_type(&self, term: &str, location: Option<&str>) -> DbResult<Vec<LocationRecord>>;
    async fn search_snap_accepting(&self, location: Option<&str>) -> DbResult<Vec<LocationRecord>>;
    async fn search_by_dietary(&self, requirement: &str, location: Option<&str>) -> DbResult<Vec<LocationRecord>>;
    async fn all_by_location(&self, location: &str) -> DbResult<Vec<LocationRecord>>;
    async fn search_by_location(&self, city: &str, state: &str) -> DbResult<Vec<LocationRecord>>;
    async fn search_by_keyword(&self, keyword: &str) -> DbResult<Vec<LocationRecord>>;
    async fn stats(&self) -> DbResult<ResourceStats>;
}

impl Database {
    /// Run a blocking query on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> DbResult<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| DbError::Task(e.to_string()))?
    }
}

#[async_trait]
impl LocationLookup for Database {
    async fn search_by_type(&self, term: &str, location: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        let term = term.to_string();
        let location = location.map(String::from);
        self.blocking(move |db| db.search_by_type(&term, location.as_deref())).await
    }

    async fn search_snap_accepting(&self, location: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        let location = location.map(String::from);
        self.blocking(move |db| db.search_snap_accepting(location.as_deref())).await
    }

    async fn search_by_dietary(&self, requirement: &str, location: Option<&str>) -> DbResult<Vec<LocationRecord>> {
        let requirement = requirement.to_string();
        let location = location.map(String::from);
        self.blocking(move |db| db.search_by_dietary(&requirement, location.as_deref()))
            .await
    }

    async fn all_by_location(&self, location: &str) -> DbResult<Vec<LocationRecord>> {
        let location = location.to_string();
        self.blocking(move |db| db.all_by_location(&location)).await
    }

    async fn search_by_location(&self, city: &str, state: &str) -> DbResult<Vec<LocationRecord>> {
        let (city, state) = (city.to_string(), state.to_string());
        self.blocking(move |db| db.search_by_location(&city, &state)).await
    }

    async fn search_by_keyword(&self, keyword: &str) -> DbResult<Vec<LocationRecord>> {
        let keyword = keyword.to_string();
        self.blocking(move |db| db.search_by_keyword(&keyword)).await
    }

    async fn stats(&self) -> DbResult<ResourceStats> {
        self.blocking(Database::stats).await
    }
}

fn like(term: &str) -> String {
    format!("%{term}%")
}

fn push_location_filter(clause: &mut String, params: &mut Vec<String>, location: Option<&str>) {
    if let Some(location) = location {
        params.push(like(location));
        clause.push_str(&format!(" AND location LIKE ?{}", params.len()));
    }
}
