use std::collections::HashSet;
use std::path::Path;
use tempfile::tempdir;
use usergen::config::{AppConfig, OutputTarget, Settings};
use usergen::pipeline::Pipeline;
use usergen::store::{Store, USER_INDEXES};

fn config(dir: &Path, amount: usize, output_to: OutputTarget, in_memory: bool, bulk: bool, seed: u64) -> AppConfig {
    AppConfig {
        settings: Settings {
            amount,
            output_to,
            in_memory_processing: in_memory,
            data_bulk_insert: bulk,
            ..Settings::default()
        },
        data_dir: dir.join("Data"),
        log_dir: dir.join("Logs"),
        seed: Some(seed),
        ..AppConfig::default()
    }
}

fn assert_all_distinct(store: &Store, expected: usize) {
    let users = store.load_users().unwrap();
    assert_eq!(users.len(), expected);
    let ids: HashSet<_> = users.iter().map(|u| u.tax_id).collect();
    let emails: HashSet<_> = users.iter().map(|u| u.email.as_str()).collect();
    let passes: HashSet<_> = users.iter().map(|u| u.pass_number.as_str()).collect();
    assert_eq!(ids.len(), expected);
    assert_eq!(emails.len(), expected);
    assert_eq!(passes.len(), expected);
}

#[tokio::test]
async fn eager_bulk_runs_accumulate_without_collisions() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 10, OutputTarget::Store, true, true, 42);
    let db = cfg.db_path();
    let rep = Pipeline::new(cfg).run().await.unwrap();
    assert_eq!(rep.generated, 10);
    assert_eq!(rep.written, 10);
    assert_eq!(rep.failed, 0);
    assert_eq!(rep.chunks, 1);
    assert_all_distinct(&Store::open(&db).unwrap(), 10);

    // same seed: the second run replays the first run's candidates and must skip them
    let cfg = config(dir.path(), 5, OutputTarget::Store, true, true, 42);
    let rep = Pipeline::new(cfg).run().await.unwrap();
    assert_eq!(rep.written, 5);
    assert_all_distinct(&Store::open(&db).unwrap(), 15);
}

#[tokio::test]
async fn lazy_per_row_runs_avoid_stored_values() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 30, OutputTarget::Store, false, false, 7);
    let db = cfg.db_path();
    let rep = Pipeline::new(cfg).run().await.unwrap();
    assert_eq!(rep.written, 30);
    assert_eq!(rep.chunks, 30);

    let cfg = config(dir.path(), 20, OutputTarget::Store, false, false, 7);
    Pipeline::new(cfg).run().await.unwrap();

    let store = Store::open(&db).unwrap();
    assert_all_distinct(&store, 50);
    let names = store.index_names("Users").unwrap();
    for spec in USER_INDEXES {
        assert!(names.iter().any(|n| n == spec.name), "missing {}", spec.name);
    }
}

#[tokio::test]
async fn both_targets_write_csv_and_store() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 12, OutputTarget::Both, true, false, 3);
    let csv = cfg.csv_path();
    let db = cfg.db_path();
    Pipeline::new(cfg).run().await.unwrap();
    let cfg = config(dir.path(), 3, OutputTarget::Both, true, true, 4);
    Pipeline::new(cfg).run().await.unwrap();

    let text = std::fs::read_to_string(csv).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + 15);
    assert_eq!(lines.iter().filter(|l| l.starts_with("TaxID,")).count(), 1);
    assert_all_distinct(&Store::open(&db).unwrap(), 15);
}

#[tokio::test]
async fn csv_only_leaves_store_empty() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 8, OutputTarget::Csv, false, true, 5);
    let csv = cfg.csv_path();
    let db = cfg.db_path();
    let rep = Pipeline::new(cfg).run().await.unwrap();
    assert_eq!(rep.written, 8);
    assert_eq!(Store::open(&db).unwrap().row_count().unwrap(), 0);
    assert_eq!(std::fs::read_to_string(csv).unwrap().lines().count(), 9);
}

#[tokio::test]
async fn bulk_mode_flushes_in_bounded_chunks() {
    let dir = tempdir().unwrap();
    let cfg = config(dir.path(), 25, OutputTarget::Store, true, true, 9);
    let db = cfg.db_path();
    let pipeline = Pipeline::new(cfg).with_max_chunk(10);
    let rep = pipeline.run().await.unwrap();
    assert_eq!(rep.chunks, 3);
    assert_eq!(rep.written, 25);
    assert!(pipeline.last_record().is_some());
    assert_all_distinct(&Store::open(&db).unwrap(), 25);
}

#[tokio::test]
async fn invalid_ratio_hundred_marks_every_record() {
    let dir = tempdir().unwrap();
    let mut cfg = config(dir.path(), 15, OutputTarget::Store, true, true, 11);
    cfg.settings.invalid_tax_id_ratio = 100;
    let db = cfg.db_path();
    Pipeline::new(cfg).run().await.unwrap();
    let users = Store::open(&db).unwrap().load_users().unwrap();
    assert_eq!(users.len(), 15);
    assert!(users.iter().all(|u| u.tax_id < 1 && !u.comment.is_empty()));
}
