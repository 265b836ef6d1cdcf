use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Creates the schema on an existing pool. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Create agents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS agents (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            mobile TEXT NOT NULL UNIQUE,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create lists table (one row per ingested file)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lists (
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            total_items INTEGER NOT NULL,
            uploaded_by TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create distributions table (one row per agent per list, position-ordered)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS distributions (
            id TEXT PRIMARY KEY,
            list_id TEXT NOT NULL,
            agent_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            assigned_count INTEGER NOT NULL,
            UNIQUE(list_id, position),
            FOREIGN KEY (list_id) REFERENCES lists(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create list_items table (contacts within a distribution, index-ordered)
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS list_items (
            id TEXT PRIMARY KEY,
            distribution_id TEXT NOT NULL,
            item_index INTEGER NOT NULL,
            name TEXT NOT NULL,
            phone TEXT NOT NULL,
            notes TEXT NOT NULL DEFAULT '',
            UNIQUE(distribution_id, item_index),
            FOREIGN KEY (distribution_id) REFERENCES distributions(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_agents_is_active ON agents(is_active)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lists_created_at ON lists(created_at DESC)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_distributions_list_id ON distributions(list_id)")
        .execute(pool)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_list_items_distribution_id ON list_items(distribution_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
