//! Keep the last raw payload on disk so a restart has something to serve.
//!

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, trace};

use crate::{Snapshot, SnapshotError};

/// Default snapshot file
pub const DEF_SNAPSHOT: &str = "alerts.json";

/// Snapshot stored in a plain file.
///
#[derive(Clone, Debug)]
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileSnapshot {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSnapshot {
    fn default() -> Self {
        FileSnapshot::new(DEF_SNAPSHOT)
    }
}

#[async_trait]
impl Snapshot for FileSnapshot {
    /// Write into a temporary file first then rename it over the old one.
    ///
    #[tracing::instrument(skip(self, raw))]
    async fn save(&self, raw: &str) -> Result<(), SnapshotError> {
        trace!("snapshot::save({:?})", self.path);
        let err = |e: std::io::Error| SnapshotError::Write(self.path.display().to_string(), e.to_string());

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).await.map_err(err)?;
        fs::rename(&tmp, &self.path).await.map_err(err)?;
        debug!("{} bytes saved", raw.len());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn load(&self) -> Result<Option<String>, SnapshotError> {
        trace!("snapshot::load({:?})", self.path);
        match fs::read_to_string(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SnapshotError::Read(self.path.display().to_string(), e.to_string())),
        }
    }
}
