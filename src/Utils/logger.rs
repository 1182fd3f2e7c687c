use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;

/// Initialize terminal logging and, if `log_file` is given, logging into that file.
/// `LevelFilter::Off` leaves logging disabled. Returns false if a logger was already set
/// (repeated calls are harmless).
pub fn init_logger(level: LevelFilter, log_file: Option<&str>) -> bool {
    if level == LevelFilter::Off {
        return false;
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));
    if let Some(filename) = log_file {
        match File::create(filename) {
            Ok(file) => loggers.push(WriteLogger::new(level, Config::default(), file)),
            Err(e) => eprintln!("cannot create log file {}: {}", filename, e),
        }
    }
    CombinedLogger::init(loggers).is_ok()
}
