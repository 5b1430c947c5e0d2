mod report;

use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use svcbridge_core::bench::BenchmarkHarness;
use svcbridge_core::config::Config;

fn init_logging(verbose: bool) {
    use simplelog::{Config as LogConfig, LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("svcbridge")
        .join("svcbridge.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("svcbridge.log")))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("svcbridge: logging disabled: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, LogConfig::default(), log_file).is_err() {
        eprintln!("svcbridge: logger already initialized");
        return;
    }

    log::info!("svcbridge starting (log level: {:?})", log_level);
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let config = Config::load();
    let bench = config.benchmark();

    let harness = match BenchmarkHarness::from_config(&config) {
        Ok(harness) => harness,
        Err(e) => {
            log::error!("could not build network strategy: {}", e);
            eprintln!("svcbridge: could not build network strategy: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "Benchmarking {}::{} ({} iterations, {} byte payload)",
        bench.service,
        bench.function,
        bench.iterations,
        bench.payload().len()
    );

    match harness.run(bench.iterations, &bench.payload()) {
        Ok(report) => {
            print!("{}", report::render(&report));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("svcbridge: {}", e);
            ExitCode::FAILURE
        }
    }
}
