//! Transient storage for uploaded files.
//!
//! Uploads are spooled before parsing and must be gone by the end of
//! request handling, success or failure. The lifecycle sits behind the
//! [`FileSpool`] capability so the orchestrator's cleanup behavior can be
//! exercised against an in-memory fake.

use async_trait::async_trait;
use std::io::{Read, Seek};
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::IngestError;

/// Opaque identifier for a spooled file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpoolHandle(String);

impl SpoolHandle {
    pub fn new(id: impl Into<String>) -> Self {
        SpoolHandle(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Seekable reader over a spooled file. The workbook parser needs `Seek`;
/// the CSV parser consumes it incrementally.
pub trait SpoolReader: Read + Seek + Send {}

impl<T: Read + Seek + Send> SpoolReader for T {}

/// Write/open/exists/delete capability over transient upload storage.
#[async_trait]
pub trait FileSpool: Send + Sync {
    async fn write(&self, original_name: &str, bytes: &[u8]) -> Result<SpoolHandle, IngestError>;

    async fn open(&self, handle: &SpoolHandle) -> Result<Box<dyn SpoolReader>, IngestError>;

    async fn exists(&self, handle: &SpoolHandle) -> bool;

    async fn delete(&self, handle: &SpoolHandle) -> Result<(), IngestError>;
}

/// Disk-backed spool under a configured directory.
///
/// Spool names are collision-resistant: a fresh UUID prefixes a sanitized
/// copy of the original file name, so concurrent ingestions never clash.
pub struct DiskSpool {
    dir: PathBuf,
}

impl DiskSpool {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskSpool { dir: dir.into() }
    }

    fn path_for(&self, handle: &SpoolHandle) -> PathBuf {
        self.dir.join(handle.as_str())
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl FileSpool for DiskSpool {
    async fn write(&self, original_name: &str, bytes: &[u8]) -> Result<SpoolHandle, IngestError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let handle = SpoolHandle(format!("{}-{}", Uuid::new_v4(), sanitize_name(original_name)));
        tokio::fs::write(self.path_for(&handle), bytes).await?;
        Ok(handle)
    }

    async fn open(&self, handle: &SpoolHandle) -> Result<Box<dyn SpoolReader>, IngestError> {
        let file = tokio::fs::File::open(self.path_for(handle)).await?;
        Ok(Box::new(std::io::BufReader::new(file.into_std().await)))
    }

    async fn exists(&self, handle: &SpoolHandle) -> bool {
        tokio::fs::try_exists(self.path_for(handle))
            .await
            .unwrap_or(false)
    }

    async fn delete(&self, handle: &SpoolHandle) -> Result<(), IngestError> {
        tokio::fs::remove_file(self.path_for(handle)).await?;
        Ok(())
    }
}
