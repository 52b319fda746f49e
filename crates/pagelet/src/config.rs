//! Runtime configuration.

use std::path::PathBuf;

use log::Level;
use stylepack::{AllocatorLimits, StylesheetAllocator};

use crate::error::Result;
use crate::log_init::init_logger;

/// Default capacity of the state-change broadcast channel.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 256;

/// Settings shared by the registry and the stylesheet allocator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub limits: AllocatorLimits,
    pub notify_capacity: usize,
    pub log_path: Option<PathBuf>,
    pub log_level: Level,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            limits: AllocatorLimits::default(),
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
            log_path: None,
            log_level: Level::Info,
        }
    }
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet_capacity(mut self, capacity: usize) -> Self {
        self.limits.sheet_capacity = capacity;
        self
    }

    pub fn with_max_sheets(mut self, max_sheets: usize) -> Self {
        self.limits.max_sheets = max_sheets;
        self
    }

    pub fn with_sheet_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.limits.id_prefix = prefix.into();
        self
    }

    /// Clamped to at least one slot; tokio's broadcast channel rejects zero.
    pub fn with_notify_capacity(mut self, capacity: usize) -> Self {
        self.notify_capacity = capacity.max(1);
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>, level: Level) -> Self {
        self.log_path = Some(path.into());
        self.log_level = level;
        self
    }

    /// A fresh allocator sized by these limits.
    pub fn allocator(&self) -> StylesheetAllocator {
        StylesheetAllocator::with_limits(self.limits.clone())
    }

    /// Install the file logger if a log path is configured.
    pub fn init_logging(&self) -> Result<()> {
        match &self.log_path {
            Some(path) => init_logger(path, self.log_level),
            None => Ok(()),
        }
    }
}
