//! Persistence: the agent directory and the ingestion-result store.
//!
//! The core consumes these through the [`AgentDirectory`] and [`ListStore`]
//! traits; [`SqliteStore`] implements both over one sqlx pool and adds the
//! agent CRUD operations used by the HTTP layer and CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::IngestError;
use crate::models::{Agent, AgentUpdate, ContactRecord, Distribution, IngestionResult, NewAgent};

/// Read-only view of agents eligible to receive work.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Active agents in a deterministic order (creation time, then id).
    /// The distribution engine's fairness depends on this ordering being
    /// stable across calls.
    async fn list_active(&self) -> Result<Vec<Agent>, IngestError>;
}

/// Durable storage for ingestion results.
#[async_trait]
pub trait ListStore: Send + Sync {
    async fn save(&self, list: &IngestionResult) -> Result<(), IngestError>;

    /// All results, newest first.
    async fn list_all(&self) -> Result<Vec<IngestionResult>, IngestError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<IngestionResult>, IngestError>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

fn ts_to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn agent_from_row(row: &sqlx::sqlite::SqliteRow) -> Agent {
    Agent {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        mobile: row.get("mobile"),
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: ts_to_datetime(row.get("created_at")),
    }
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    pub async fn create_agent(&self, new: &NewAgent) -> Result<Agent, IngestError> {
        let agent = Agent {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email: new.email.trim().to_string(),
            mobile: new.mobile.trim().to_string(),
            is_active: true,
            created_at: ts_to_datetime(Utc::now().timestamp()),
        };
        sqlx::query(
            "INSERT INTO agents (id, name, email, mobile, is_active, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&agent.id)
        .bind(&agent.name)
        .bind(&agent.email)
        .bind(&agent.mobile)
        .bind(i64::from(agent.is_active))
        .bind(agent.created_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(agent)
    }

    pub async fn get_agent(&self, id: &str) -> Result<Option<Agent>, IngestError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(agent_from_row))
    }

    pub async fn find_agent_by_email(&self, email: &str) -> Result<Option<Agent>, IngestError> {
        let row = sqlx::query("SELECT * FROM agents WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(agent_from_row))
    }

    pub async fn find_agent_by_mobile(&self, mobile: &str) -> Result<Option<Agent>, IngestError> {
        let row = sqlx::query("SELECT * FROM agents WHERE mobile = ?")
            .bind(mobile)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(agent_from_row))
    }

    /// Applies the present fields of `update` and returns the new state,
    /// or `None` when the agent does not exist.
    pub async fn update_agent(
        &self,
        id: &str,
        update: &AgentUpdate,
    ) -> Result<Option<Agent>, IngestError> {
        let Some(existing) = self.get_agent(id).await? else {
            return Ok(None);
        };
        let updated = Agent {
            name: update
                .name
                .as_deref()
                .map(|v| v.trim().to_string())
                .unwrap_or(existing.name),
            email: update
                .email
                .as_deref()
                .map(|v| v.trim().to_string())
                .unwrap_or(existing.email),
            mobile: update
                .mobile
                .as_deref()
                .map(|v| v.trim().to_string())
                .unwrap_or(existing.mobile),
            is_active: update.is_active.unwrap_or(existing.is_active),
            ..existing
        };
        sqlx::query("UPDATE agents SET name = ?, email = ?, mobile = ?, is_active = ? WHERE id = ?")
            .bind(&updated.name)
            .bind(&updated.email)
            .bind(&updated.mobile)
            .bind(i64::from(updated.is_active))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(Some(updated))
    }

    async fn load_distributions(&self, list_id: &str) -> Result<Vec<Distribution>, IngestError> {
        let dist_rows = sqlx::query(
            "SELECT id, agent_id, assigned_count FROM distributions WHERE list_id = ? ORDER BY position",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        let mut distributions = Vec::with_capacity(dist_rows.len());
        for dist_row in &dist_rows {
            let dist_id: String = dist_row.get("id");
            let item_rows = sqlx::query(
                "SELECT name, phone, notes FROM list_items WHERE distribution_id = ? ORDER BY item_index",
            )
            .bind(&dist_id)
            .fetch_all(&self.pool)
            .await?;
            let items: Vec<ContactRecord> = item_rows
                .iter()
                .map(|row| ContactRecord {
                    name: row.get("name"),
                    phone: row.get("phone"),
                    notes: row.get("notes"),
                })
                .collect();
            distributions.push(Distribution {
                agent_id: dist_row.get("agent_id"),
                assigned_count: dist_row.get::<i64, _>("assigned_count") as usize,
                items,
            });
        }
        Ok(distributions)
    }

    async fn hydrate_list(
        &self,
        row: &sqlx::sqlite::SqliteRow,
    ) -> Result<IngestionResult, IngestError> {
        let id: String = row.get("id");
        let distributions = self.load_distributions(&id).await?;
        Ok(IngestionResult {
            id,
            file_name: row.get("file_name"),
            total_items: row.get::<i64, _>("total_items") as usize,
            uploaded_by: row.get("uploaded_by"),
            created_at: ts_to_datetime(row.get("created_at")),
            distributions,
        })
    }
}

#[async_trait]
impl AgentDirectory for SqliteStore {
    async fn list_active(&self) -> Result<Vec<Agent>, IngestError> {
        let rows =
            sqlx::query("SELECT * FROM agents WHERE is_active = 1 ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(agent_from_row).collect())
    }
}

#[async_trait]
impl ListStore for SqliteStore {
    async fn save(&self, list: &IngestionResult) -> Result<(), IngestError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO lists (id, file_name, total_items, uploaded_by, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&list.id)
        .bind(&list.file_name)
        .bind(list.total_items as i64)
        .bind(&list.uploaded_by)
        .bind(list.created_at.timestamp())
        .execute(&mut *tx)
        .await?;

        for (position, dist) in list.distributions.iter().enumerate() {
            let dist_id = Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO distributions (id, list_id, agent_id, position, assigned_count) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&dist_id)
            .bind(&list.id)
            .bind(&dist.agent_id)
            .bind(position as i64)
            .bind(dist.assigned_count as i64)
            .execute(&mut *tx)
            .await?;

            for (index, item) in dist.items.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO list_items (id, distribution_id, item_index, name, phone, notes) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(Uuid::new_v4().to_string())
                .bind(&dist_id)
                .bind(index as i64)
                .bind(&item.name)
                .bind(&item.phone)
                .bind(&item.notes)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<IngestionResult>, IngestError> {
        let rows = sqlx::query("SELECT * FROM lists ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await?;
        let mut lists = Vec::with_capacity(rows.len());
        for row in &rows {
            lists.push(self.hydrate_list(row).await?);
        }
        Ok(lists)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<IngestionResult>, IngestError> {
        let row = sqlx::query("SELECT * FROM lists WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(self.hydrate_list(&row).await?)),
            None => Ok(None),
        }
    }
}
