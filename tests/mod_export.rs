use std::fs;
use tempfile::tempdir;
use usergen::export::{CsvOptions, append_users};
use usergen::types::UserRecord;

fn user(tax_id: i64, comment: &str) -> UserRecord {
    UserRecord {
        tax_id,
        first_name: "Jan".into(),
        last_name: "Kowalski".into(),
        email: format!("jan.kowalski{tax_id}@test.com"),
        phone_number: "+600700800".into(),
        pass_number: format!("ZZK{:06}", 100_000 + tax_id),
        comment: comment.into(),
    }
}

#[test]
fn first_write_creates_file_with_single_header() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("nested").join("users.csv");
    let rep = append_users(&out, &[user(1, ""), user(2, "")], &CsvOptions::default()).unwrap();
    assert_eq!(rep.written, 2);
    assert!(rep.wrote_header);
    let s = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = s.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "TaxID,FirstName,LastName,Email,PhoneNumber,PassNumber,Comment");
}

#[test]
fn append_never_repeats_header_or_rewrites() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("users.csv");
    append_users(&out, &[user(1, "")], &CsvOptions::default()).unwrap();
    let before = fs::read_to_string(&out).unwrap();
    let rep = append_users(&out, &[user(2, ""), user(3, "")], &CsvOptions::default()).unwrap();
    assert!(!rep.wrote_header);
    let after = fs::read_to_string(&out).unwrap();
    assert!(after.starts_with(&before));
    assert_eq!(after.lines().count(), 4);
    assert_eq!(after.lines().filter(|l| l.starts_with("TaxID")).count(), 1);
}

#[test]
fn empty_existing_file_gets_header() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("users.csv");
    fs::write(&out, "").unwrap();
    let rep = append_users(&out, &[user(1, "")], &CsvOptions::default()).unwrap();
    assert!(rep.wrote_header);
    assert_eq!(fs::read_to_string(&out).unwrap().lines().count(), 2);
}

#[test]
fn fields_with_delimiters_are_quoted() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("users.csv");
    append_users(&out, &[user(-4, "bad, very bad")], &CsvOptions::default()).unwrap();
    let s = fs::read_to_string(&out).unwrap();
    assert!(s.contains("\"bad, very bad\""));
    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let back: Vec<UserRecord> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
    assert_eq!(back.len(), 1);
    assert_eq!(back[0].tax_id, -4);
    assert_eq!(back[0].comment, "bad, very bad");
}
