use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::error::DataError;
use crate::loader::{self, DatasetSources, Tables};

#[derive(Debug, Clone, PartialEq, Eq)]
struct FileIdentity {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
}

impl FileIdentity {
    fn of(path: &Path) -> Result<Self, DataError> {
        let io_error = |source| DataError::Io {
            path: path.to_path_buf(),
            source,
        };
        let canonical = path.canonicalize().map_err(io_error)?;
        let metadata = std::fs::metadata(&canonical).map_err(io_error)?;
        Ok(Self {
            path: canonical,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Parsed tables keyed by the identity of both source files. A change to
/// either file's path, length or modification time forces a reload.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(FileIdentity, FileIdentity, Arc<Tables>)>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, sources: &DatasetSources) -> Result<Arc<Tables>, DataError> {
        let (daily_path, hourly_path) = sources.resolve()?;
        let daily = FileIdentity::of(&daily_path)?;
        let hourly = FileIdentity::of(&hourly_path)?;

        if let Some((cached_daily, cached_hourly, tables)) = &self.entry {
            if *cached_daily == daily && *cached_hourly == hourly {
                debug!("dataset cache hit");
                return Ok(Arc::clone(tables));
            }
            debug!("dataset files changed, reloading");
        }

        let tables = Arc::new(loader::load_tables(&daily_path, &hourly_path)?);
        self.entry = Some((daily, hourly, Arc::clone(&tables)));
        Ok(tables)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
