#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Write the header row when the target file is missing or empty.
    pub write_headers: bool,
}
impl Default for CsvOptions {
    fn default() -> Self { Self { delimiter: b',', write_headers: true } }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    pub written: u64,
    pub wrote_header: bool,
}
