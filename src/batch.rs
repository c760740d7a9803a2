//! Chunked dispatch of finished records to the CSV file and/or the store.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::OutputTarget;
use crate::errors::GenError;
use crate::export::{CsvOptions, append_users};
use crate::store::Store;
use crate::types::UserRecord;

/// Largest number of records flushed in one write.
pub const MAX_CHUNK: usize = 250_000;

/// How a chunk reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// One literal multi-row `INSERT`; all-or-nothing per chunk.
    Statement,
    /// One prepared statement executed per record; bad rows are skipped.
    PerRow,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub chunks: u64,
    pub file_rows: u64,
    pub file_failed: u64,
    pub store_rows: u64,
    pub store_failed: u64,
}

impl FlushReport {
    pub fn merge(&mut self, other: FlushReport) {
        self.chunks += other.chunks;
        self.file_rows += other.file_rows;
        self.file_failed += other.file_failed;
        self.store_rows += other.store_rows;
        self.store_failed += other.store_failed;
    }
}

/// Split `items` into consecutive chunks of `max` (the last may be shorter).
pub fn split_chunks<T>(items: Vec<T>, max: usize) -> Vec<Vec<T>> {
    let max = max.max(1);
    if items.len() <= max {
        return if items.is_empty() { Vec::new() } else { vec![items] };
    }
    let mut out = Vec::with_capacity(items.len().div_ceil(max));
    let mut rest = items.into_iter();
    loop {
        let chunk: Vec<T> = rest.by_ref().take(max).collect();
        if chunk.is_empty() {
            break;
        }
        out.push(chunk);
    }
    out
}

#[derive(Debug, Clone)]
pub struct BatchWriter {
    target: OutputTarget,
    csv_path: PathBuf,
    csv: CsvOptions,
    store: Option<Store>,
    mode: InsertMode,
    max_chunk: usize,
}

impl BatchWriter {
    /// # Errors
    /// [`GenError::Config`] when the target includes the store but none is given.
    pub fn new(
        target: OutputTarget,
        csv_path: impl Into<PathBuf>,
        store: Option<Store>,
        mode: InsertMode,
    ) -> Result<Self, GenError> {
        if target.writes_store() && store.is_none() {
            return Err(GenError::Config("store output selected without a store".into()));
        }
        Ok(Self {
            target,
            csv_path: csv_path.into(),
            csv: CsvOptions::default(),
            store,
            mode,
            max_chunk: MAX_CHUNK,
        })
    }

    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.max(1);
        self
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    /// Flush `records`, splitting anything larger than the chunk limit.
    ///
    /// Sink failures are logged and counted, never returned; chunks are
    /// flushed in order and each is dropped once its flush has finished.
    pub async fn write(&self, records: Vec<UserRecord>) -> FlushReport {
        let mut report = FlushReport::default();
        if records.is_empty() {
            return report;
        }
        log::debug!("batch: write records={}", records.len());
        for chunk in split_chunks(records, self.max_chunk) {
            report.merge(self.flush_chunk(chunk).await);
        }
        report
    }

    async fn flush_chunk(&self, chunk: Vec<UserRecord>) -> FlushReport {
        let len = chunk.len() as u64;
        let chunk = Arc::new(chunk);
        let mut report = FlushReport { chunks: 1, ..Default::default() };

        // file first; its failure must not keep the store from being tried
        if self.target.writes_csv() {
            let path = self.csv_path.clone();
            let opts = self.csv.clone();
            let rows = Arc::clone(&chunk);
            match tokio::task::spawn_blocking(move || append_users(&path, &rows, &opts)).await {
                Ok(Ok(r)) => report.file_rows += r.written,
                Ok(Err(e)) => {
                    log::error!("Writing {len} users to {} failed: {e}", self.csv_path.display());
                    report.file_failed += len;
                }
                Err(e) => {
                    log::error!("CSV writer task failed: {e}");
                    report.file_failed += len;
                }
            }
        }

        if let Some(store) = self.store.as_ref().filter(|_| self.target.writes_store()) {
            let store = store.clone();
            let mode = self.mode;
            let rows = Arc::clone(&chunk);
            let res = tokio::task::spawn_blocking(move || match mode {
                InsertMode::Statement => store.insert_statement(&rows).map(|n| (n, 0)),
                InsertMode::PerRow => store.insert_rows(&rows).map(|r| (r.inserted, r.failed)),
            })
            .await;
            match res {
                Ok(Ok((ok, failed))) => {
                    report.store_rows += ok as u64;
                    report.store_failed += failed as u64;
                }
                Ok(Err(e)) => {
                    log::error!("Inserting {len} users failed: {e}");
                    if let Some(first) = chunk.first() {
                        log::error!("{first}");
                    }
                    report.store_failed += len;
                }
                Err(e) => {
                    log::error!("Store writer task failed: {e}");
                    report.store_failed += len;
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_produces_ceil_chunks() {
        let items: Vec<u32> = (0..600_001).collect();
        let chunks = split_chunks(items, MAX_CHUNK);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), MAX_CHUNK);
        assert_eq!(chunks[1].len(), MAX_CHUNK);
        assert_eq!(chunks[2].len(), 100_001);
        assert_eq!(chunks[2][0], 500_000);
    }

    #[test]
    fn split_exact_multiple_and_small_inputs() {
        assert_eq!(split_chunks((0..10).collect::<Vec<u8>>(), 5).len(), 2);
        assert_eq!(split_chunks((0..4).collect::<Vec<u8>>(), 5).len(), 1);
        assert!(split_chunks(Vec::<u8>::new(), 5).is_empty());
    }

    #[test]
    fn store_target_requires_store() {
        let err = BatchWriter::new(OutputTarget::Both, "x.csv", None, InsertMode::PerRow).unwrap_err();
        assert!(matches!(err, GenError::Config(_)));
        assert!(BatchWriter::new(OutputTarget::Csv, "x.csv", None, InsertMode::PerRow).is_ok());
    }
}
