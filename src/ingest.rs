//! Ingestion orchestration.
//!
//! Drives one upload through validate → parse → distribute → persist, and
//! guarantees the spooled file is deleted on every path once it exists —
//! success or failure. All state is request-local; concurrent ingestions
//! share nothing but the read-only agent snapshot each fetches for itself.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::distribute::distribute;
use crate::error::IngestError;
use crate::models::IngestionResult;
use crate::parse::{self, FileFormat};
use crate::spool::{FileSpool, SpoolHandle};
use crate::store::{AgentDirectory, ListStore};

/// A spooled upload awaiting ingestion.
#[derive(Debug, Clone)]
pub struct Upload {
    pub handle: SpoolHandle,
    pub original_name: String,
    pub size: u64,
}

pub struct Ingestor {
    agents: Arc<dyn AgentDirectory>,
    lists: Arc<dyn ListStore>,
    spool: Arc<dyn FileSpool>,
    max_bytes: u64,
}

impl Ingestor {
    pub fn new(
        agents: Arc<dyn AgentDirectory>,
        lists: Arc<dyn ListStore>,
        spool: Arc<dyn FileSpool>,
        max_bytes: u64,
    ) -> Self {
        Ingestor {
            agents,
            lists,
            spool,
            max_bytes,
        }
    }

    /// Runs one ingestion end to end.
    ///
    /// `upload` is `None` when the request carried no file; everything else
    /// reaches cleanup. `uploader_id` is the authenticated caller identity
    /// supplied by the HTTP layer.
    pub async fn ingest(
        &self,
        upload: Option<Upload>,
        uploader_id: &str,
    ) -> Result<IngestionResult, IngestError> {
        let upload = upload.ok_or(IngestError::MissingFile)?;

        let outcome = self.run(&upload, uploader_id).await;

        // A prior step may already have removed the file, so re-check
        // before deleting. A failed delete is logged, never surfaced over
        // the primary outcome.
        if self.spool.exists(&upload.handle).await {
            if let Err(err) = self.spool.delete(&upload.handle).await {
                tracing::warn!(
                    handle = upload.handle.as_str(),
                    error = %err,
                    "failed to delete spooled upload"
                );
            }
        }

        outcome
    }

    async fn run(&self, upload: &Upload, uploader_id: &str) -> Result<IngestionResult, IngestError> {
        if upload.size > self.max_bytes {
            return Err(IngestError::PayloadTooLarge {
                size: upload.size,
                limit: self.max_bytes,
            });
        }

        let agents = self.agents.list_active().await?;
        if agents.is_empty() {
            return Err(IngestError::NoActiveAgents);
        }

        let format = FileFormat::from_name(&upload.original_name)
            .ok_or_else(|| IngestError::UnsupportedFormat(extension_of(&upload.original_name)))?;

        let reader = self.spool.open(&upload.handle).await?;
        let records = tokio::task::spawn_blocking(move || parse::parse(reader, format))
            .await
            .map_err(|err| IngestError::Parse(format!("parser task failed: {err}")))??;

        if records.is_empty() {
            return Err(IngestError::EmptyDataset);
        }

        let total_items = records.len();
        let agent_ids: Vec<String> = agents.iter().map(|agent| agent.id.clone()).collect();
        let distributions = distribute(records, &agent_ids)?;

        let result = IngestionResult {
            id: Uuid::new_v4().to_string(),
            file_name: upload.original_name.clone(),
            total_items,
            uploaded_by: uploader_id.to_string(),
            // Second precision, matching what the store round-trips.
            created_at: second_precision_now(),
            distributions,
        };
        self.lists.save(&result).await?;

        tracing::info!(
            file = %result.file_name,
            records = total_items,
            agents = agent_ids.len(),
            uploaded_by = uploader_id,
            "ingested contact list"
        );
        Ok(result)
    }
}

fn second_precision_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_else(|| name.to_string())
}
