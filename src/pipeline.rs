//! One generation run: bootstrap the store, generate unique records on a
//! blocking worker, and flush them from an async writer loop.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::batch::{BatchWriter, FlushReport, InsertMode};
use crate::config::AppConfig;
use crate::errors::GenError;
use crate::generate::{Assembler, FieldGenerator};
use crate::oracle::Universe;
use crate::store::{IndexMaintainer, Store};
use crate::types::UserRecord;

/// Records buffered between the generator and the writer.
const CHANNEL_BOUND: usize = 1024;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub generated: u64,
    /// Rows that reached the store, or the CSV file when the store is not a sink.
    pub written: u64,
    pub failed: u64,
    pub chunks: u64,
    pub elapsed: Duration,
}

pub struct Pipeline {
    config: AppConfig,
    last_record: Arc<Mutex<Option<String>>>,
    max_chunk: Option<usize>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self { config, last_record: Arc::new(Mutex::new(None)), max_chunk: None }
    }

    /// Override the chunk limit used in bulk mode.
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = Some(max_chunk);
        self
    }

    /// Text form of the most recently assembled record.
    pub fn last_record(&self) -> Option<String> {
        self.last_record.lock().clone()
    }

    /// Run generation to completion.
    ///
    /// # Errors
    /// Store bootstrap failures, exhausted uniqueness retries, and failed
    /// background tasks. Row, chunk and file errors are logged and counted in
    /// the report instead.
    pub async fn run(&self) -> Result<RunReport, GenError> {
        let started = Instant::now();
        let settings = self.config.settings.clone();
        log::debug!("pipeline: run {settings:?}");

        let db_path = self.config.db_path();
        let (store, table_existed) = tokio::task::spawn_blocking(move || {
            let store = Store::open(&db_path)?;
            let existed = store.ensure_schema()?;
            Ok::<_, GenError>((store, existed))
        })
        .await??;

        let in_memory = settings.in_memory_processing;
        let oracle_store = store.clone();
        let universe = tokio::task::spawn_blocking(move || {
            Universe::for_store(&oracle_store, in_memory, table_existed)
        })
        .await??;

        let mut root = match self.config.seed {
            Some(seed) => FieldGenerator::seeded(seed),
            None => FieldGenerator::from_entropy(),
        };
        let assembler = Assembler::new(root.fork(), universe, settings.invalid_tax_id_ratio);

        let mode = if settings.data_bulk_insert { InsertMode::Statement } else { InsertMode::PerRow };
        let sink_store = settings.output_to.writes_store().then(|| store.clone());
        let mut writer = BatchWriter::new(settings.output_to, self.config.csv_path(), sink_store, mode)?;
        if let Some(n) = self.max_chunk {
            writer = writer.with_max_chunk(n);
        }
        let maintainer = settings.output_to.writes_store().then(|| IndexMaintainer::for_users(store.clone()));

        let (tx, rx) = mpsc::channel(CHANNEL_BOUND);
        let amount = settings.amount;
        let trace = Arc::clone(&self.last_record);
        let producer = tokio::task::spawn_blocking(move || produce(assembler, amount, &tx, &trace));

        let (flushed, maintainer) =
            consume(rx, &writer, settings.data_bulk_insert, amount, maintainer).await?;
        let generated = producer.await??;

        if let Some(mut m) = maintainer {
            tokio::task::spawn_blocking(move || m.finish()).await?;
        }

        let report = RunReport {
            generated,
            written: if settings.output_to.writes_store() { flushed.store_rows } else { flushed.file_rows },
            failed: flushed.store_failed + flushed.file_failed,
            chunks: flushed.chunks,
            elapsed: started.elapsed(),
        };
        log::info!("Amount of unique users generated: {}", report.generated);
        log::info!(
            "Written: {}, failed: {}, chunks: {}, elapsed: {:.2?}",
            report.written,
            report.failed,
            report.chunks,
            report.elapsed
        );
        Ok(report)
    }
}

/// Pre-generate tax IDs and passport numbers, then assemble and hand off records.
fn produce(
    mut assembler: Assembler,
    amount: usize,
    tx: &mpsc::Sender<UserRecord>,
    trace: &Mutex<Option<String>>,
) -> Result<u64, GenError> {
    let tax_ids = assembler.unique_tax_ids(amount)?;
    log::info!("Amount of unique Tax IDs generated: {}", tax_ids.len());
    let pass_numbers = assembler.unique_pass_numbers(amount)?;
    log::info!("Amount of unique passport numbers generated: {}", pass_numbers.len());

    let mut generated = 0u64;
    for (tax_id, pass) in tax_ids.into_iter().zip(pass_numbers) {
        let user = assembler.assemble(tax_id, pass)?;
        *trace.lock() = Some(user.to_string());
        tx.blocking_send(user).map_err(|_| GenError::Disconnected)?;
        generated += 1;
    }
    Ok(generated)
}

/// Drain the channel. Per-record mode flushes each record and keeps the
/// indexes on cadence; bulk mode flushes whenever a full chunk is buffered.
async fn consume(
    mut rx: mpsc::Receiver<UserRecord>,
    writer: &BatchWriter,
    bulk: bool,
    amount: usize,
    mut maintainer: Option<IndexMaintainer>,
) -> Result<(FlushReport, Option<IndexMaintainer>), GenError> {
    let mut report = FlushReport::default();
    let mut batch: Vec<UserRecord> = Vec::new();
    let mut received = 0usize;

    while let Some(user) = rx.recv().await {
        received += 1;
        if bulk {
            batch.push(user);
            if batch.len() >= writer.max_chunk() {
                report.merge(writer.write(std::mem::take(&mut batch)).await);
            }
        } else {
            let flushed = writer.write(vec![user]).await;
            report.merge(flushed);
            if flushed.store_rows > 0
                && let Some(m) = maintainer.take()
            {
                let total = report.store_rows;
                maintainer = Some(
                    tokio::task::spawn_blocking(move || {
                        let mut m = m;
                        m.observe(total);
                        m
                    })
                    .await?,
                );
            }
        }
        log_progress(amount, received);
    }

    if !batch.is_empty() {
        log::info!("Bulk insert is enabled. Inserting {} records at once...", batch.len());
        report.merge(writer.write(batch).await);
    }
    Ok((report, maintainer))
}

fn log_progress(amount: usize, done: usize) {
    let step = amount / 20;
    if step > 0 && done % step == 0 {
        log::info!("Task completed: {}%", done * 100 / amount);
    }
}
