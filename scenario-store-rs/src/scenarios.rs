// scenario-store-rs/src/scenarios.rs
//
// Read-only scenario lookup. Scenarios are keyed by a numeric id and by the
// query title they were generated for.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use scenario_validation::{Scenario, ScenarioValidator};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::StoreError;

/// Scenario store trait - dyn-compatible so handlers can hold `Arc<dyn ScenarioStore>`
#[async_trait]
pub trait ScenarioStore: Send + Sync {
    /// Initialize the storage backend
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Check if the storage backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Find the scenario stored under an exact title
    async fn lookup_by_title(&self, title: &str) -> Result<Scenario, StoreError>;

    /// Find a scenario by its numeric id
    async fn lookup_by_id(&self, id: i64) -> Result<Scenario, StoreError>;
}

#[derive(Default)]
struct ScenarioTable {
    next_id: i64,
    by_id: HashMap<i64, Scenario>,
    id_by_title: HashMap<String, i64>,
}

/// In-memory scenario store for testing and development
pub struct InMemoryScenarioStore {
    data: Arc<RwLock<ScenarioTable>>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(ScenarioTable {
                next_id: 1,
                ..ScenarioTable::default()
            })),
        }
    }

    /// Seed a scenario under `title`, returning its id. A title that is
    /// already present is overwritten and keeps its id.
    pub async fn insert(&self, title: &str, scenario: Scenario) -> i64 {
        let mut table = self.data.write().await;
        let id = match table.id_by_title.get(title) {
            Some(id) => *id,
            None => {
                let id = table.next_id;
                table.next_id += 1;
                table.id_by_title.insert(title.to_string(), id);
                id
            }
        };
        table.by_id.insert(id, scenario);
        debug!("Stored scenario {} under title {:?}", id, title);
        id
    }
}

impl Default for InMemoryScenarioStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScenarioStore for InMemoryScenarioStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        info!("In-memory scenario store initialized");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn lookup_by_title(&self, title: &str) -> Result<Scenario, StoreError> {
        let table = self.data.read().await;
        table
            .id_by_title
            .get(title)
            .and_then(|id| table.by_id.get(id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("title {:?}", title)))
    }

    async fn lookup_by_id(&self, id: i64) -> Result<Scenario, StoreError> {
        let table = self.data.read().await;
        table
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("id {}", id)))
    }
}

/// PostgreSQL scenario store. Rows hold raw JSONB, so every row read is
/// validated again before it is handed out.
pub struct PostgresScenarioStore {
    pool: sqlx::PgPool,
    validator: ScenarioValidator,
}

impl PostgresScenarioStore {
    pub fn new(pool: sqlx::PgPool, validator: ScenarioValidator) -> Self {
        Self { pool, validator }
    }
}

/// Turn a fetched `scenario` column into a validated scenario. `key` names
/// the lookup in errors and logs.
pub fn decode_scenario_row(
    validator: &ScenarioValidator,
    key: String,
    row: Option<(Value,)>,
) -> Result<Scenario, StoreError> {
    let (value,) = row.ok_or_else(|| StoreError::NotFound(key.clone()))?;
    validator.validate(&value).map_err(|source| {
        error!("Stored scenario {} failed validation: {}", key, source);
        StoreError::Corrupt { key, source }
    })
}

#[async_trait]
impl ScenarioStore for PostgresScenarioStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scenarios (
                id BIGSERIAL PRIMARY KEY,
                scenario_title TEXT NOT NULL UNIQUE,
                scenario JSONB NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("PostgreSQL scenario store initialized");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn lookup_by_title(&self, title: &str) -> Result<Scenario, StoreError> {
        debug!("Fetching scenario for title {:?}", title);
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT scenario FROM scenarios WHERE scenario_title = $1")
                .bind(title)
                .fetch_optional(&self.pool)
                .await?;

        decode_scenario_row(&self.validator, format!("title {:?}", title), row)
    }

    async fn lookup_by_id(&self, id: i64) -> Result<Scenario, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT scenario FROM scenarios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        decode_scenario_row(&self.validator, format!("id {}", id), row)
    }
}
