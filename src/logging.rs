use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::{self, OpenOptions};
use std::io::{Error, ErrorKind};
use std::path::Path;
use std::sync::Once;

static INIT: Once = Once::new();

/// Installs a file logger. The terminal belongs to the TUI, so nothing is
/// ever written to stdout or stderr. Only the first call has any effect.
pub fn init_logger(path: &Path, level: LevelFilter) -> Result<(), Error> {
    if level == LevelFilter::Off {
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let log_file = OpenOptions::new().create(true).append(true).open(path)?;

    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut result = Ok(());
    INIT.call_once(|| {
        if let Err(e) = WriteLogger::init(level, config, log_file) {
            result = Err(Error::new(ErrorKind::Other, e));
        }
    });
    result
}
