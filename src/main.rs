use band_sobel::{load_config, run_batch};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::env;
use std::path::Path;

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), band_sobel::Error> {
    let config_path = env::args()
        .nth(1)
        .ok_or_else(|| band_sobel::Error::Config(usage()))?;
    let config = load_config(Path::new(&config_path))?;
    let report = run_batch(&config)?;

    for outcome in report.failed() {
        log::warn!("image {} was not processed", outcome.index());
    }
    Ok(())
}

fn init_logging() {
    let level = env::var("BAND_SOBEL_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    // Stdout carries the metrics lines, so logs go to stderr.
    if TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto).is_err()
    {
        eprintln!("logger already initialized");
    }
}

fn usage() -> String {
    "Usage: band-sobel <config.json>".to_string()
}
