//! Local SQLite mirror of the dashboard tables
//!
//! Reads go through the same [`Query`] descriptions as the HTTP backend and
//! run on tokio's blocking pool. Timestamps are stored as fixed-width
//! RFC 3339 text so that `>=` filters compare chronologically.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection};

use super::query::{format_timestamp, Query, QueryResult};
use super::RowStore;
use crate::error::{Error, Result};
use crate::types::Profile;

/// Row store backed by a local SQLite file
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run migrations on this store
    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        super::schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }

    // ============================================
    // Seeding
    // ============================================

    /// Insert an achievement, returning its generated id
    pub fn insert_achievement(
        &self,
        user_id: &str,
        category: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO achievements (id, user_id, category, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, category, format_timestamp(&created_at)],
        )?;
        Ok(id)
    }

    /// Insert a daily win, returning its generated id
    pub fn insert_daily_win(&self, user_id: &str, created_at: DateTime<Utc>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO daily_wins (id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![id, user_id, format_timestamp(&created_at)],
        )?;
        Ok(id)
    }

    /// Insert or update a profile
    pub fn upsert_profile(&self, user_id: &str, profile: &Profile) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO profiles (id, first_name, last_name, avatar_url, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                avatar_url = excluded.avatar_url,
                updated_at = excluded.updated_at
            "#,
            params![
                user_id,
                profile.first_name,
                profile.last_name,
                profile.avatar_url,
                format_timestamp(&Utc::now()),
            ],
        )?;
        Ok(())
    }
}

// ============================================
// Reads
// ============================================

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| Error::Store("sqlite connection lock poisoned".to_string()))
}

fn fetch_blocking(conn: &Mutex<Connection>, query: &Query) -> Result<QueryResult> {
    query.validate()?;
    let (where_sql, bound) = where_clause(query);
    let table = query.table.as_str();
    let conn = lock(conn)?;

    let count = if query.count {
        let sql = format!("SELECT COUNT(*) FROM {}{}", table, where_sql);
        let n: i64 = conn.query_row(&sql, params_from_iter(bound.iter()), |r| r.get(0))?;
        Some(n.max(0) as u64)
    } else {
        None
    };

    let mut rows = Vec::new();
    if !query.head {
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY rowid",
            query.projection(),
            table,
            where_sql
        );
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut result = stmt.query(params_from_iter(bound.iter()))?;
        while let Some(row) = result.next()? {
            let mut object = serde_json::Map::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                object.insert(name.clone(), value_to_json(row.get_ref(i)?));
            }
            rows.push(serde_json::Value::Object(object));
        }
    }

    Ok(QueryResult { rows, count })
}

#[async_trait]
impl RowStore for SqliteStore {
    async fn fetch(&self, query: &Query) -> Result<QueryResult> {
        let conn = Arc::clone(&self.conn);
        let query = query.clone();
        tokio::task::spawn_blocking(move || fetch_blocking(&conn, &query))
            .await
            .map_err(|e| Error::Store(format!("sqlite read task failed: {}", e)))?
    }
}

/// `WHERE` clause with positional placeholders and the values to bind.
fn where_clause(query: &Query) -> (String, Vec<String>) {
    if query.filters.is_empty() {
        return (String::new(), Vec::new());
    }

    let conditions: Vec<String> = query
        .filters
        .iter()
        .enumerate()
        .map(|(i, f)| format!("{} {} ?{}", f.column, f.op.sql(), i + 1))
        .collect();
    let values = query.filters.iter().map(|f| f.value.to_text()).collect();

    (format!(" WHERE {}", conditions.join(" AND ")), values)
}

fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Value::from(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Table;
    use crate::types::{CategoryRow, TimestampRow};
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn seeded() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.migrate().unwrap();
        store.insert_achievement("u1", Some("Ops"), ts(2024, 4, 1)).unwrap();
        store.insert_achievement("u1", None, ts(2024, 5, 2)).unwrap();
        store.insert_achievement("u1", Some("Ops"), ts(2024, 5, 3)).unwrap();
        store.insert_achievement("u2", Some("Sales"), ts(2024, 5, 3)).unwrap();
        store.insert_daily_win("u1", ts(2024, 5, 3)).unwrap();
        store
    }

    #[test]
    fn test_where_clause() {
        let query = Query::table(Table::Achievements)
            .eq("user_id", "u1")
            .gte("created_at", ts(2024, 5, 1));
        let (sql, values) = where_clause(&query);
        assert_eq!(sql, " WHERE user_id = ?1 AND created_at >= ?2");
        assert_eq!(values, vec!["u1", "2024-05-01T12:00:00.000000Z"]);
    }

    #[tokio::test]
    async fn test_filtered_rows_and_count() {
        let store = seeded();
        let query = Query::table(Table::Achievements)
            .select("category")
            .eq("user_id", "u1")
            .gte("created_at", ts(2024, 5, 1))
            .count_exact();

        let result = store.fetch(&query).await.unwrap();
        assert_eq!(result.count, Some(2));
        let rows: Vec<CategoryRow> = result.decode().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].category.is_none());
        assert_eq!(rows[1].category.as_deref(), Some("Ops"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_reads_on_blocking_pool() {
        let store = Arc::new(seeded());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    let query = Query::table(Table::Achievements).eq("user_id", "u1").head();
                    store.fetch(&query).await
                })
            })
            .collect();

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(result.count, Some(3));
        }
    }

    #[tokio::test]
    async fn test_head_returns_count_only() {
        let store = seeded();
        let query = Query::table(Table::Achievements).eq("user_id", "u1").head();

        let result = store.fetch(&query).await.unwrap();
        assert_eq!(result.count, Some(3));
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_round_trip() {
        let store = seeded();
        let query = Query::table(Table::DailyWins)
            .select("created_at")
            .eq("user_id", "u1");

        let rows: Vec<TimestampRow> = store.fetch(&query).await.unwrap().decode().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_at, ts(2024, 5, 3));
    }

    #[tokio::test]
    async fn test_profile_single() {
        let store = seeded();
        let profile = Profile {
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            avatar_url: None,
        };
        store.upsert_profile("u1", &profile).unwrap();

        let query = Query::table(Table::Profiles)
            .select("first_name, last_name, avatar_url")
            .eq("id", "u1");
        let row = store.fetch_single(&query).await.unwrap();
        let loaded: Profile = serde_json::from_value(row).unwrap();
        assert_eq!(loaded, profile);

        let missing = Query::table(Table::Profiles).eq("id", "nobody");
        assert!(matches!(
            store.fetch_single(&missing).await,
            Err(Error::NotFound { table: "profiles" })
        ));
    }

    #[tokio::test]
    async fn test_invalid_column_is_rejected() {
        let store = seeded();
        let query = Query::table(Table::Achievements).select("category FROM achievements --");
        assert!(matches!(store.fetch(&query).await, Err(Error::Query(_))));
    }
}
