use std::io::{self, BufWriter, Write};

use crate::types::UserRecord;

pub trait UserSink {
    fn write_user(&mut self, user: &UserRecord) -> io::Result<()>;
    fn finish(self: Box<Self>) -> io::Result<()>;
}

/// CSV rows in `TaxID, FirstName, LastName, Email, PhoneNumber, PassNumber, Comment` order.
pub struct CsvSink<W: Write> {
    w: csv::Writer<BufWriter<W>>,
}
impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, delimiter: u8, write_headers: bool) -> Self {
        let w = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(write_headers)
            .from_writer(BufWriter::new(inner));
        Self { w }
    }
}
impl<W: Write> UserSink for CsvSink<W> {
    fn write_user(&mut self, user: &UserRecord) -> io::Result<()> {
        self.w.serialize(user).map_err(|e| io::Error::other(e.to_string()))
    }
    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.w.flush()
    }
}
