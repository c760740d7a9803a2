use super::Store;
use super::schema::{self, USERS_TABLE};
use crate::errors::GenError;

/// Written-record interval between index rebuilds in per-record mode.
pub const REBUILD_EVERY: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub table: &'static str,
    pub column: &'static str,
}

/// Lookup indexes backing the uniqueness checks.
pub const USER_INDEXES: [IndexSpec; 3] = [
    IndexSpec { name: "IX_Users_TaxID", table: USERS_TABLE, column: "TaxID" },
    IndexSpec { name: "IX_Users_Email", table: USERS_TABLE, column: "Email" },
    IndexSpec { name: "IX_Users_PassNumber", table: USERS_TABLE, column: "PassNumber" },
];

impl Store {
    /// Drop and recreate each index in order.
    pub fn rebuild_indexes(&self, specs: &[IndexSpec]) -> Result<(), GenError> {
        let conn = self.conn.lock();
        for spec in specs {
            log::debug!("index: rebuild {} on {}({})", spec.name, spec.table, spec.column);
            conn.execute_batch(&schema::drop_index(spec.name))?;
            conn.execute_batch(&schema::create_index(spec.name, spec.table, spec.column))?;
        }
        Ok(())
    }

    /// Reclaim free pages and defragment the database file.
    pub fn vacuum(&self) -> Result<(), GenError> {
        self.conn.lock().execute_batch(schema::VACUUM)?;
        log::info!("Database vacuumed successfully.");
        Ok(())
    }

    /// Names of the indexes currently defined on `table`.
    pub fn index_names(&self, table: &str) -> Result<Vec<String>, GenError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL ORDER BY name",
        )?;
        let names = stmt
            .query_map([table], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

/// Rebuilds indexes on a written-record cadence and once at shutdown.
#[derive(Debug)]
pub struct IndexMaintainer {
    store: Store,
    specs: Vec<IndexSpec>,
    every: u64,
    rebuilt_at: u64,
    rebuilds: u64,
}

impl IndexMaintainer {
    pub fn new(store: Store, specs: &[IndexSpec], every: u64) -> Self {
        Self { store, specs: specs.to_vec(), every: every.max(1), rebuilt_at: 0, rebuilds: 0 }
    }

    pub fn for_users(store: Store) -> Self {
        Self::new(store, &USER_INDEXES, REBUILD_EVERY)
    }

    /// Rebuild if `total_written` crossed another multiple of the cadence.
    ///
    /// Returns whether a rebuild ran. Failures are logged, never raised.
    pub fn observe(&mut self, total_written: u64) -> bool {
        if total_written / self.every <= self.rebuilt_at / self.every {
            return false;
        }
        self.rebuilt_at = total_written;
        self.rebuild();
        true
    }

    /// Final rebuild followed by a vacuum.
    pub fn finish(&mut self) {
        self.rebuild();
        if let Err(e) = self.store.vacuum() {
            log::error!("Vacuum failed: {e}");
        }
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    fn rebuild(&mut self) {
        match self.store.rebuild_indexes(&self.specs) {
            Ok(()) => self.rebuilds += 1,
            Err(e) => log::error!("Index rebuild failed: {e}"),
        }
    }
}
