use crate::error::Result;
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

pub const LOG_FILE: &str = "chargen_log.txt";

#[derive(Debug)]
struct SimpleLogger {
    log_path: PathBuf,
    level: Level,
}

static LOGGER: OnceCell<SimpleLogger> = OnceCell::new();

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format!(
                "{} {} [{}] - {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            );
            let log_file = self.log_path.join(LOG_FILE);

            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_file) {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

/// Install the file logger. Debug level when `debug_mode` is on, Info otherwise.
///
/// Only the first call installs a logger; later calls are no-ops.
pub fn init(log_path: PathBuf, debug_mode: bool) -> Result<()> {
    create_dir_all(&log_path)?;

    let level = if debug_mode { Level::Debug } else { Level::Info };
    if LOGGER.set(SimpleLogger { log_path, level }).is_err() {
        return Ok(());
    }

    if let Some(logger) = LOGGER.get() {
        log::set_logger(logger)?;
        log::set_max_level(if debug_mode {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }
    Ok(())
}
