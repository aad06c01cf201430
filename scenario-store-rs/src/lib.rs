// scenario-store-rs/src/lib.rs
//
// Storage backends for the troubleshooting backend
// Provides:
// - Scenario lookup by title or id
// - Feedback persistence with rating validation
// - In-memory and PostgreSQL implementations behind dyn-compatible traits

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use config_rs::StorageSettings;
use scenario_validation::{SchemaOptions, ScenarioValidator, ValidationError};
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tracing::info;

mod feedback;
mod scenarios;

pub use feedback::{
    validate_rating, FeedbackRecord, FeedbackStore, FeedbackSubmission, InMemoryFeedbackStore,
    PostgresFeedbackStore, MAX_RATING, MIN_RATING, TOOL_NAME,
};
pub use scenarios::{
    decode_scenario_row, InMemoryScenarioStore, PostgresScenarioStore, ScenarioStore,
};

/// Errors surfaced by storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// No row matched the lookup key
    #[error("No scenario found for {0}")]
    NotFound(String),

    /// Feedback rating outside 1..=5; raised before any write
    #[error("Rating must be between 1 and 5")]
    InvalidRating(i64),

    /// A stored scenario no longer passes schema validation
    #[error("Stored scenario {key} is invalid: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: ValidationError,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend_type: String,
    pub connection_string: Option<String>,
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend_type: "memory".to_string(),
            connection_string: None,
            max_connections: 5,
        }
    }
}

impl From<&StorageSettings> for StorageConfig {
    fn from(settings: &StorageSettings) -> Self {
        Self {
            backend_type: settings.backend.clone(),
            connection_string: settings.database_url.clone(),
            ..Self::default()
        }
    }
}

/// Both store handles, created once at startup and shared for the process lifetime
#[derive(Clone)]
pub struct Stores {
    pub scenarios: Arc<dyn ScenarioStore>,
    pub feedback: Arc<dyn FeedbackStore>,
}

/// Create and initialize the storage backends based on configuration.
///
/// `schema` is used to re-validate scenario rows read back from PostgreSQL.
pub async fn create_stores(config: &StorageConfig, schema: SchemaOptions) -> Result<Stores> {
    let stores = match config.backend_type.as_str() {
        "memory" | "in-memory" => {
            info!("Using in-memory storage backend");
            Stores {
                scenarios: Arc::new(InMemoryScenarioStore::new()),
                feedback: Arc::new(InMemoryFeedbackStore::new()),
            }
        }
        "postgres" | "postgresql" => {
            let url = config
                .connection_string
                .as_ref()
                .ok_or_else(|| anyhow!("PostgreSQL connection string required"))?;
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!("Using PostgreSQL storage backend");
            Stores {
                scenarios: Arc::new(PostgresScenarioStore::new(
                    pool.clone(),
                    ScenarioValidator::new(schema),
                )),
                feedback: Arc::new(PostgresFeedbackStore::new(pool)),
            }
        }
        other => return Err(anyhow!("Unknown storage backend type: {}", other)),
    };

    stores
        .scenarios
        .initialize()
        .await
        .context("Failed to initialize scenario store")?;
    stores
        .feedback
        .initialize()
        .await
        .context("Failed to initialize feedback store")?;

    Ok(stores)
}
