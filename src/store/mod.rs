//! SQLite persistence for generated users.
//!
//! A [`Store`] is a cheap handle around one shared connection. Every operation
//! takes the connection lock for its whole duration, so at most one
//! transaction or lookup runs against the database at a time.

mod index;
mod schema;
mod writer;

pub use index::{IndexMaintainer, IndexSpec, REBUILD_EVERY, USER_INDEXES};
pub use writer::{RowReport, build_insert_sql, escape_sql};

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::GenError;
use crate::types::{Candidate, TaxId, UserRecord};

/// Values already committed to the `Users` table.
#[derive(Debug, Default, Clone)]
pub struct PersistedValues {
    pub tax_ids: HashSet<TaxId>,
    pub pass_numbers: HashSet<String>,
    pub emails: HashSet<String>,
}

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

impl Store {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns an error if the parent directory cannot be created or SQLite fails to open the file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GenError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let existed = path.exists();
        let conn = Connection::open(path)?;
        if !existed {
            log::info!("Database created at {}", path.display());
        }
        Ok(Self { conn: Arc::new(Mutex::new(conn)), path: Some(path.to_path_buf()) })
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, GenError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)), path: None })
    }

    /// Create the `Users` table when missing. Returns whether it already existed.
    pub fn ensure_schema(&self) -> Result<bool, GenError> {
        log::debug!("store: ensure_schema");
        let conn = self.conn.lock();
        let existed = conn
            .query_row(schema::TABLE_EXISTS, params![schema::USERS_TABLE], |row| {
                row.get::<_, String>(0)
            })
            .optional()?
            .is_some();
        if !existed {
            conn.execute_batch(schema::CREATE_USERS_TABLE)?;
            log::info!("Created table {}", schema::USERS_TABLE);
        }
        Ok(existed)
    }

    /// Load every persisted tax ID, passport number and email into memory.
    pub fn persisted_values(&self) -> Result<PersistedValues, GenError> {
        log::debug!("store: persisted_values");
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(schema::SELECT_UNIVERSE)?;
        let mut rows = stmt.query([])?;
        let mut out = PersistedValues::default();
        while let Some(row) = rows.next()? {
            out.tax_ids.insert(row.get(0)?);
            if let Some(p) = row.get::<_, Option<String>>(1)? {
                out.pass_numbers.insert(p);
            }
            if let Some(e) = row.get::<_, Option<String>>(2)? {
                out.emails.insert(e);
            }
        }
        log::info!(
            "Loaded {} tax IDs, {} passport numbers, {} emails from the store",
            out.tax_ids.len(),
            out.pass_numbers.len(),
            out.emails.len()
        );
        Ok(out)
    }

    /// Number of rows whose column matches the candidate value.
    pub fn count_matching(&self, candidate: Candidate<'_>) -> Result<u64, GenError> {
        let sql = schema::count_where(candidate.kind().column());
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&sql)?;
        let n: i64 = match candidate {
            Candidate::TaxId(id) => stmt.query_row(params![id], |r| r.get(0))?,
            Candidate::PassNumber(s) | Candidate::Email(s) => {
                stmt.query_row(params![s], |r| r.get(0))?
            }
        };
        Ok(u64::try_from(n).unwrap_or(0))
    }

    pub fn row_count(&self) -> Result<u64, GenError> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM Users", [], |r| r.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Read back every stored user.
    pub fn load_users(&self) -> Result<Vec<UserRecord>, GenError> {
        log::debug!("store: load_users");
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(schema::SELECT_USERS)?;
        let users = stmt
            .query_map([], |row| {
                Ok(UserRecord {
                    tax_id: row.get(0)?,
                    first_name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    last_name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    email: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                    phone_number: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                    pass_number: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
                    comment: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(tax_id: TaxId, email: &str, pass: &str) -> UserRecord {
        UserRecord {
            tax_id,
            first_name: "Jan".into(),
            last_name: "Kowalski".into(),
            email: email.into(),
            phone_number: "+500600700".into(),
            pass_number: pass.into(),
            comment: String::new(),
        }
    }

    #[test]
    fn ensure_schema_reports_prior_existence() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.ensure_schema().unwrap());
        assert!(store.ensure_schema().unwrap());
    }

    #[test]
    fn persisted_values_and_counts() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store
            .insert_rows(&[user(10, "a@test.com", "ZZA100000"), user(11, "b@test.com", "ZZB100000")])
            .unwrap();

        let values = store.persisted_values().unwrap();
        assert!(values.tax_ids.contains(&10));
        assert!(values.pass_numbers.contains("ZZB100000"));
        assert!(values.emails.contains("a@test.com"));

        assert_eq!(store.count_matching(Candidate::TaxId(11)).unwrap(), 1);
        assert_eq!(store.count_matching(Candidate::TaxId(12)).unwrap(), 0);
        assert_eq!(store.count_matching(Candidate::Email("b@test.com")).unwrap(), 1);
        assert_eq!(store.count_matching(Candidate::PassNumber("ZZA100000")).unwrap(), 1);
        assert_eq!(store.count_matching(Candidate::PassNumber("ZZC100000")).unwrap(), 0);
        assert_eq!(store.row_count().unwrap(), 2);
    }

    #[test]
    fn load_users_round_trips_fields() {
        let store = Store::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        let u = user(-3, "o'hara@test.com", "ZZŁ123456");
        store.insert_rows(std::slice::from_ref(&u)).unwrap();
        let back = store.load_users().unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].tax_id, -3);
        assert_eq!(back[0], u);
    }
}
