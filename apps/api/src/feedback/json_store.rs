use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::feedback::{FeedbackBucket, FeedbackStore, FeedbackStoreError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedbackDocument {
    #[serde(default)]
    buckets: BTreeMap<String, FeedbackBucket>,
}

/// Single JSON document holding every bucket. Each write rewrites the whole file.
pub struct JsonFeedbackStore {
    path: PathBuf,
    // Guards the document-level read-modify-write across different buckets.
    file_lock: Mutex<()>,
}

impl JsonFeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<FeedbackDocument, FeedbackStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(FeedbackDocument::default()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FeedbackDocument::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_document(&self, document: &FeedbackDocument) -> Result<(), FeedbackStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(document)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for JsonFeedbackStore {
    async fn load_bucket(&self, key: &str) -> Result<Option<FeedbackBucket>, FeedbackStoreError> {
        let _guard = self.file_lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(document.buckets.remove(key))
    }

    async fn save_bucket(
        &self,
        key: &str,
        bucket: &FeedbackBucket,
    ) -> Result<(), FeedbackStoreError> {
        let _guard = self.file_lock.lock().await;
        let mut document = self.read_document().await?;
        document.buckets.insert(key.to_string(), bucket.clone());
        self.write_document(&document).await?;
        debug!("Wrote {} feedback buckets to {}", document.buckets.len(), self.path.display());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "json"
    }
}
