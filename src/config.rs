//! Run configuration.
//!
//! Sources, lowest to highest precedence: defaults, TOML file, environment,
//! command line. Core knobs use the `key:value` token syntax on the command
//! line (`amount:100 output_to:2 debug`); invalid values and unknown keys are
//! logged and ignored so the previous value stays in effect.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::GenError;

pub const DEFAULT_AMOUNT: usize = 5000;
pub const DEFAULT_INVALID_TAX_ID_RATIO: u32 = 10;
pub const DEFAULT_DATA_DIR: &str = "Data";
pub const DEFAULT_LOG_DIR: &str = "Logs";
pub const DEFAULT_DB_FILE: &str = "TestUserData.db";
pub const DEFAULT_CSV_FILE: &str = "TestUserData.csv";
pub const DEFAULT_CONFIG_FILE: &str = "usergen.toml";

/// Where finished records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputTarget {
    Csv,
    #[default]
    Store,
    Both,
}

impl OutputTarget {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(OutputTarget::Csv),
            1 => Some(OutputTarget::Store),
            2 => Some(OutputTarget::Both),
            _ => None,
        }
    }

    pub fn writes_csv(self) -> bool {
        matches!(self, OutputTarget::Csv | OutputTarget::Both)
    }

    pub fn writes_store(self) -> bool {
        matches!(self, OutputTarget::Store | OutputTarget::Both)
    }

    pub fn describe(self) -> &'static str {
        match self {
            OutputTarget::Csv => "CSV file",
            OutputTarget::Store => "DB",
            OutputTarget::Both => "CSV & DB",
        }
    }
}

/// The knobs consumed by the generation pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub amount: usize,
    pub invalid_tax_id_ratio: u32,
    pub output_to: OutputTarget,
    /// Eager duplicate checks against a preloaded snapshot of the store.
    pub in_memory_processing: bool,
    /// Accumulate records and flush them in chunks instead of one at a time.
    pub data_bulk_insert: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT,
            invalid_tax_id_ratio: DEFAULT_INVALID_TAX_ID_RATIO,
            output_to: OutputTarget::default(),
            in_memory_processing: false,
            data_bulk_insert: false,
            debug: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Set,
    Invalid,
    Unknown,
}

impl Settings {
    /// Build settings from `key:value` tokens on top of the defaults.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut s = Self::default();
        for t in tokens {
            s.apply_token(t.as_ref());
        }
        s
    }

    /// Apply one `key:value` token (or the bare `debug` switch).
    pub fn apply_token(&mut self, token: &str) -> Applied {
        let (key, value) = match token.split_once(':') {
            Some((k, v)) => (k.trim().to_ascii_lowercase(), v.trim()),
            None => (token.trim().to_ascii_lowercase(), ""),
        };
        self.apply(&key, value)
    }

    /// Validate and set `key` from its textual `value`.
    pub fn apply(&mut self, key: &str, value: &str) -> Applied {
        let parsed = value.parse::<i64>().ok();
        match key {
            "amount" => match parsed.filter(|v| *v > 0).and_then(|v| usize::try_from(v).ok()) {
                Some(v) => {
                    self.amount = v;
                    log::info!("Amount of users to be generated: {v}");
                    Applied::Set
                }
                None => self.reject(key, self.amount),
            },
            "invalid_tax_id_ratio" => {
                match parsed.filter(|v| *v >= 0).and_then(|v| u32::try_from(v).ok()) {
                    Some(v) => {
                        self.invalid_tax_id_ratio = v;
                        log::info!("Invalid tax payer number ratio is: {v}");
                        Applied::Set
                    }
                    None => self.reject(key, self.invalid_tax_id_ratio),
                }
            }
            "output_to" => match parsed.and_then(OutputTarget::from_code) {
                Some(t) => {
                    self.output_to = t;
                    log::info!("Output to: {}", t.describe());
                    Applied::Set
                }
                None => self.reject(key, self.output_to.describe()),
            },
            "in_memory_processing" => match parse_switch(parsed) {
                Some(b) => {
                    self.in_memory_processing = b;
                    log::info!("In-memory processing is: {}", on_off(b));
                    Applied::Set
                }
                None => self.reject(key, self.in_memory_processing),
            },
            "data_bulk_insert" => match parse_switch(parsed) {
                Some(b) => {
                    self.data_bulk_insert = b;
                    log::info!("DB bulk insert is: {}", on_off(b));
                    Applied::Set
                }
                None => self.reject(key, self.data_bulk_insert),
            },
            "debug" => {
                self.debug = value.is_empty() || parse_switch(parsed).unwrap_or(false);
                Applied::Set
            }
            other => {
                log::warn!("Unknown parameter: {other}");
                Applied::Unknown
            }
        }
    }

    fn reject(&self, key: &str, current: impl std::fmt::Display) -> Applied {
        log::warn!("Invalid value for '{key}' parameter. Using value: {current}");
        Applied::Invalid
    }
}

fn parse_switch(v: Option<i64>) -> Option<bool> {
    match v {
        Some(0) => Some(false),
        Some(1) => Some(true),
        _ => None,
    }
}

fn on_off(b: bool) -> &'static str {
    if b { "Enabled" } else { "Disabled" }
}

/// Optional `[settings]` table of the TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileSettings {
    amount: Option<i64>,
    invalid_tax_id_ratio: Option<i64>,
    output_to: Option<i64>,
    in_memory_processing: Option<i64>,
    data_bulk_insert: Option<i64>,
    debug: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    db_file: Option<String>,
    csv_file: Option<String>,
    log_level: Option<String>,
    seed: Option<u64>,
    #[serde(default)]
    settings: FileSettings,
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub seed: Option<u64>,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub settings: Settings,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_file: String,
    pub csv_file: String,
    pub log_level: Option<String>,
    pub seed: Option<u64>,
    /// `key:value` settings not yet validated: config file entries first,
    /// then command-line tokens. Drained by [`AppConfig::apply_settings`].
    pub pending_settings: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            db_file: DEFAULT_DB_FILE.to_string(),
            csv_file: DEFAULT_CSV_FILE.to_string(),
            log_level: None,
            seed: None,
            pending_settings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment and `overrides`.
    ///
    /// # Errors
    /// Returns [`GenError::Config`] if an explicitly named config file is missing
    /// or any config file fails to parse.
    pub fn load(overrides: &Overrides) -> Result<Self, GenError> {
        Self::load_with_env(overrides, |k| std::env::var(k).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable environment lookup.
    pub fn load_with_env(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GenError> {
        let mut cfg = Self::default();

        // config file: explicit path must exist, the implicit one is optional
        let explicit = overrides.config.clone().or_else(|| env("USERGEN_CONFIG").map(PathBuf::from));
        match explicit {
            Some(p) if !p.exists() => {
                return Err(GenError::Config(format!("config file not found: {}", p.display())));
            }
            Some(p) => cfg.merge_file(&p)?,
            None => {
                let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
                if implicit.exists() {
                    cfg.merge_file(&implicit)?;
                }
            }
        }

        if let Some(d) = env("USERGEN_DATA_DIR") {
            cfg.data_dir = PathBuf::from(d);
        }
        if let Some(d) = env("USERGEN_LOG_DIR") {
            cfg.log_dir = PathBuf::from(d);
        }
        if let Some(l) = env("USERGEN_LOG_LEVEL") {
            cfg.log_level = Some(l);
        }

        if let Some(d) = &overrides.data_dir {
            cfg.data_dir = d.clone();
        }
        if let Some(d) = &overrides.log_dir {
            cfg.log_dir = d.clone();
        }
        if overrides.seed.is_some() {
            cfg.seed = overrides.seed;
        }
        cfg.pending_settings.extend(overrides.tokens.iter().cloned());
        Ok(cfg)
    }

    /// Whether the pending settings turn on debug logging. Meant to be called
    /// before the logger is installed.
    pub fn debug_requested(&self) -> bool {
        let mut s = self.settings.clone();
        for t in &self.pending_settings {
            s.apply_token(t);
        }
        s.debug
    }

    /// Validate and apply every pending setting in order, logging each
    /// accepted or rejected value. Returns the outcome per token.
    pub fn apply_settings(&mut self) -> Vec<Applied> {
        std::mem::take(&mut self.pending_settings)
            .iter()
            .map(|t| self.settings.apply_token(t))
            .collect()
    }

    fn merge_file(&mut self, path: &Path) -> Result<(), GenError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GenError::Config(format!("{}: {e}", path.display())))?;
        let file: FileConfig = toml::from_str(&text)
            .map_err(|e| GenError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("config: loaded {}", path.display());
        if let Some(d) = file.data_dir {
            self.data_dir = d;
        }
        if let Some(d) = file.log_dir {
            self.log_dir = d;
        }
        if let Some(f) = file.db_file {
            self.db_file = f;
        }
        if let Some(f) = file.csv_file {
            self.csv_file = f;
        }
        if file.log_level.is_some() {
            self.log_level = file.log_level;
        }
        if file.seed.is_some() {
            self.seed = file.seed;
        }
        let s = file.settings;
        let numeric = [
            ("amount", s.amount),
            ("invalid_tax_id_ratio", s.invalid_tax_id_ratio),
            ("output_to", s.output_to),
            ("in_memory_processing", s.in_memory_processing),
            ("data_bulk_insert", s.data_bulk_insert),
        ];
        for (key, value) in numeric {
            if let Some(v) = value {
                self.pending_settings.push(format!("{key}:{v}"));
            }
        }
        if let Some(d) = s.debug {
            self.pending_settings.push(format!("debug:{}", u8::from(d)));
        }
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.data_dir.join(&self.csv_file)
    }
}
