use rusqlite::params;

use super::Store;
use super::schema::{INSERT_USER, INSERT_USERS_PREFIX};
use crate::errors::GenError;
use crate::types::UserRecord;

/// Outcome of a per-row insert.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowReport {
    pub inserted: usize,
    pub failed: usize,
}

impl Store {
    /// Insert `chunk` as one multi-row `INSERT` inside a single transaction.
    ///
    /// All rows commit together or none do. On failure the transaction is
    /// rolled back; a failing rollback is logged on its own and the statement
    /// error is returned.
    ///
    /// # Errors
    /// Returns the SQLite error that aborted the statement or the commit.
    pub fn insert_statement(&self, chunk: &[UserRecord]) -> Result<usize, GenError> {
        if chunk.is_empty() {
            return Ok(0);
        }
        log::debug!("store: insert_statement rows={}", chunk.len());
        let sql = build_insert_sql(chunk);
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        match tx.execute(&sql, []) {
            Ok(n) => {
                tx.commit()?;
                Ok(n)
            }
            Err(e) => {
                log::error!("Bulk insert of {} rows failed: {e}", chunk.len());
                if let Err(rb) = tx.rollback() {
                    log::error!("Rollback failed: {rb}");
                }
                Err(e.into())
            }
        }
    }

    /// Insert `chunk` row by row with one prepared statement in one transaction.
    ///
    /// A failing row is logged with its representation and skipped; the
    /// transaction commits whatever succeeded.
    ///
    /// # Errors
    /// Returns an error only if the transaction cannot be opened, the statement
    /// cannot be prepared, or the commit fails.
    pub fn insert_rows(&self, chunk: &[UserRecord]) -> Result<RowReport, GenError> {
        log::debug!("store: insert_rows rows={}", chunk.len());
        let mut report = RowReport::default();
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(INSERT_USER)?;
            for user in chunk {
                let res = stmt.execute(params![
                    user.tax_id,
                    user.first_name,
                    user.last_name,
                    user.email,
                    user.phone_number,
                    user.pass_number,
                    user.comment,
                ]);
                match res {
                    Ok(_) => report.inserted += 1,
                    Err(e) => {
                        log::error!("Error inserting user: {e}");
                        log::error!("{user}");
                        report.failed += 1;
                    }
                }
            }
        }
        tx.commit()?;
        Ok(report)
    }
}

/// Build the literal multi-row insert for `chunk`.
pub fn build_insert_sql(chunk: &[UserRecord]) -> String {
    let mut sql = String::with_capacity(INSERT_USERS_PREFIX.len() + chunk.len() * 128);
    sql.push_str(INSERT_USERS_PREFIX);
    for (i, u) in chunk.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&format!(
            "({}, '{}', '{}', '{}', '{}', '{}', '{}')",
            u.tax_id,
            escape_sql(&u.first_name),
            escape_sql(&u.last_name),
            escape_sql(&u.email),
            escape_sql(&u.phone_number),
            escape_sql(&u.pass_number),
            escape_sql(&u.comment),
        ));
    }
    sql.push(';');
    sql
}

/// Double every single quote so the value is safe inside a SQL string literal.
pub fn escape_sql(value: &str) -> String {
    value.replace('\'', "''")
}
