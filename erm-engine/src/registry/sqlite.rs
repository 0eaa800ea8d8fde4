//! SQLite-backed registry and decision history
//!
//! Table layout:
//! - `candidates(id, kind, display_name, normalized_name)`
//! - `aliases(normalized_alias, entity_id)`
//! - `decisions(normalized_input, entity_id, decision, decided_at)` where
//!   `decision` is one of `confirmed`, `rejected`, `selected`

use super::{CandidateRegistry, Decision, FeedbackHistory};
use crate::normalize::normalize;
use crate::types::{CandidateEntity, EntityId, EntityKind};
use async_trait::async_trait;
use erm_common::{Error, Result};
use sqlx::SqlitePool;

/// Create registry and decision tables if they don't exist
pub async fn init_registry_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS candidates (
            id INTEGER PRIMARY KEY,
            kind TEXT NOT NULL,
            display_name TEXT NOT NULL,
            normalized_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS aliases (
            normalized_alias TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            PRIMARY KEY (normalized_alias, entity_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS decisions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            normalized_input TEXT NOT NULL,
            entity_id INTEGER NOT NULL,
            decision TEXT NOT NULL CHECK (decision IN ('confirmed', 'rejected', 'selected')),
            decided_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_decisions_input ON decisions (normalized_input)")
        .execute(pool)
        .await?;

    tracing::debug!("Registry tables initialized (candidates, aliases, decisions)");

    Ok(())
}

fn to_count(count: i64) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn row_to_candidate(row: (i64, String, String, String)) -> Result<CandidateEntity> {
    let (id, kind, display_name, normalized_name) = row;
    let kind = EntityKind::parse(&kind)
        .ok_or_else(|| Error::InvalidInput(format!("Unknown entity kind '{}' for id {}", kind, id)))?;
    Ok(CandidateEntity {
        id,
        kind,
        display_name,
        normalized_name,
    })
}

/// Registry stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteRegistry {
    db: SqlitePool,
}

impl SqliteRegistry {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert or replace a candidate row
    pub async fn insert_candidate(&self, candidate: &CandidateEntity) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO candidates (id, kind, display_name, normalized_name) VALUES (?, ?, ?, ?)",
        )
        .bind(candidate.id)
        .bind(candidate.kind.as_str())
        .bind(&candidate.display_name)
        .bind(&candidate.normalized_name)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Record a confirmed alias (normalized on insert)
    pub async fn insert_alias(&self, alias: &str, entity_id: EntityId) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO aliases (normalized_alias, entity_id) VALUES (?, ?)")
            .bind(normalize(alias))
            .bind(entity_id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CandidateRegistry for SqliteRegistry {
    async fn all_candidates(&self) -> Result<Vec<CandidateEntity>> {
        let rows: Vec<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, kind, display_name, normalized_name FROM candidates ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(row_to_candidate).collect()
    }

    async fn get(&self, id: EntityId) -> Result<Option<CandidateEntity>> {
        let row: Option<(i64, String, String, String)> = sqlx::query_as(
            "SELECT id, kind, display_name, normalized_name FROM candidates WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        row.map(row_to_candidate).transpose()
    }

    async fn confirmed_aliases(&self, normalized_input: &str) -> Result<Vec<EntityId>> {
        let rows: Vec<(i64,)> = sqlx::query_as(
            "SELECT entity_id FROM aliases WHERE normalized_alias = ? ORDER BY entity_id",
        )
        .bind(normalized_input)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

/// Decision history stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteFeedbackHistory {
    db: SqlitePool,
}

impl SqliteFeedbackHistory {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Append one decision (input normalized on insert)
    pub async fn record_decision(&self, input: &str, entity_id: EntityId, decision: Decision) -> Result<()> {
        sqlx::query("INSERT INTO decisions (normalized_input, entity_id, decision) VALUES (?, ?, ?)")
            .bind(normalize(input))
            .bind(entity_id)
            .bind(decision.as_str())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn exact_counts(&self, normalized_input: &str, decision: Decision) -> Result<Vec<(EntityId, u32)>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT entity_id, COUNT(*) FROM decisions
            WHERE decision = ? AND normalized_input = ?
            GROUP BY entity_id
            ORDER BY entity_id
            "#,
        )
        .bind(decision.as_str())
        .bind(normalized_input)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(id, count)| (id, to_count(count))).collect())
    }
}

#[async_trait]
impl FeedbackHistory for SqliteFeedbackHistory {
    async fn confirmations(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>> {
        self.exact_counts(normalized_input, Decision::Confirmed).await
    }

    async fn rejections(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>> {
        self.exact_counts(normalized_input, Decision::Rejected).await
    }

    async fn historical_selections(&self, normalized_input: &str) -> Result<Vec<(EntityId, u32)>> {
        if normalized_input.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT entity_id, COUNT(*) FROM decisions
            WHERE decision = ?
              AND normalized_input != ''
              AND (instr(normalized_input, ?) > 0 OR instr(?, normalized_input) > 0)
            GROUP BY entity_id
            ORDER BY entity_id
            "#,
        )
        .bind(Decision::Selected.as_str())
        .bind(normalized_input)
        .bind(normalized_input)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(|(id, count)| (id, to_count(count))).collect())
    }
}
