use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use usergen::config::{AppConfig, Overrides};
use usergen::logger;
use usergen::pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(
    name = "usergen",
    version,
    about = "Generate unique synthetic users into SQLite and/or CSV",
    after_help = "SETTINGS (key:value):\n  \
        amount:N                 users to generate (>0, default 5000)\n  \
        invalid_tax_id_ratio:N   percent of out-of-range tax IDs (>=0, default 10)\n  \
        output_to:N              0 = CSV, 1 = DB, 2 = both (default 1)\n  \
        in_memory_processing:N   1 = preload stored values for duplicate checks (default 0)\n  \
        data_bulk_insert:N       1 = flush in chunks of up to 250000 (default 0)\n  \
        debug                    verbose logging"
)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, ./usergen.toml is used when present.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Directory for the database and CSV output")]
    data_dir: Option<PathBuf>,
    #[arg(long, help = "Directory for log files")]
    log_dir: Option<PathBuf>,
    #[arg(long, help = "Seed for reproducible output")]
    seed: Option<u64>,
    #[arg(value_name = "SETTING", help = "Settings in key:value form, e.g. amount:1000 output_to:2")]
    settings: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = Overrides {
        config: cli.config,
        data_dir: cli.data_dir,
        log_dir: cli.log_dir,
        seed: cli.seed,
        tokens: cli.settings,
    };
    let mut cfg = match AppConfig::load(&overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let level = match (&cfg.log_level, cfg.debug_requested()) {
        (_, true) => log::LevelFilter::Debug,
        (Some(l), false) => logger::parse_level(l),
        (None, false) => log::LevelFilter::Info,
    };
    if let Err(e) = logger::configure_logging(&cfg.log_dir, level) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    log::info!("*****************************************************");
    log::info!("Application was started at {}", chrono::Local::now().format("%d-%m-%Y %H:%M:%S"));

    // applied after the logger is up so rejected values are reported
    cfg.apply_settings();

    let pipeline = Pipeline::new(cfg);
    match pipeline.run().await {
        Ok(report) => {
            log::info!("Finished in {:.2?}", report.elapsed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("FATAL: App crashed!");
            log::error!("FATAL: Cause: {e}");
            if let Some(last) = pipeline.last_record() {
                log::error!("Last record: {last}");
            }
            ExitCode::FAILURE
        }
    }
}
