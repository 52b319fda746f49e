use log::{Level, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

struct FileLogger {
    file_path: PathBuf,
    level: Level,
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)
            {
                let _ = writeln!(
                    file,
                    "[{}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {}
}

/// Route `log` output to an append-only file at `path`.
///
/// The file is opened once up front so a bad path is reported here rather
/// than silently dropping every later record.
pub fn init_logger(path: impl AsRef<Path>, level: Level) -> Result<()> {
    let file_path = path.as_ref().to_path_buf();
    OpenOptions::new().create(true).append(true).open(&file_path)?;

    let logger = FileLogger { file_path, level };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}
