use crate::record::EventRecord;
use async_trait::async_trait;
use marquee_common::{MarqueeError, Result};
use std::path::{Path, PathBuf};

/// Destination for the records of a successful run.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Replace whatever the sink held with `records`.
    async fn persist(&self, records: &[EventRecord]) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

/// Writes records as a pretty-printed JSON array, truncating the file first.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventSink for JsonFileSink {
    async fn persist(&self, records: &[EventRecord]) -> Result<()> {
        let body = serde_json::to_string_pretty(records)
            .map_err(|e| MarqueeError::Persist(format!("failed to serialize records: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                MarqueeError::Persist(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        tokio::fs::write(&self.path, body).await.map_err(|e| {
            MarqueeError::Persist(format!("failed to write {}: {e}", self.path.display()))
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
