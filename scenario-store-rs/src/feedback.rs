// scenario-store-rs/src/feedback.rs
//
// End-of-session feedback from learners. The rating is checked before any
// write is attempted; everything else is stored as given.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scenario_validation::integral_i64;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::StoreError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Tool name recorded with every feedback row
pub const TOOL_NAME: &str = "Troubleshooting game";

/// Feedback as submitted by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(deserialize_with = "deserialize_rating")]
    pub rating: i64,
    #[serde(default)]
    pub feedback_text: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub institution: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub moodle_id: Option<String>,
    /// The troubleshooting query the feedback refers to
    #[serde(default)]
    pub query: Option<String>,
}

/// A stored feedback row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub rating: i64,
    pub feedback_text: String,
    pub tool_name: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub institution: Option<String>,
    pub phone_number: Option<String>,
    pub moodle_id: Option<String>,
    pub query: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    fn from_submission(id: i64, created_at: DateTime<Utc>, submission: FeedbackSubmission) -> Self {
        Self {
            id,
            rating: submission.rating,
            feedback_text: submission.feedback_text,
            tool_name: TOOL_NAME.to_string(),
            email: submission.email,
            name: submission.name,
            institution: submission.institution,
            phone_number: submission.phone_number,
            moodle_id: submission.moodle_id,
            query: submission.query,
            created_at,
        }
    }
}

/// Ratings arrive as any JSON number; `4.0` is read as 4, `4.5` is rejected
fn deserialize_rating<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = serde_json::Number::deserialize(deserializer)?;
    integral_i64(&number).ok_or_else(|| {
        serde::de::Error::custom(format!("rating must be a whole number, got {}", number))
    })
}

/// Reject ratings outside `MIN_RATING..=MAX_RATING`
pub fn validate_rating(rating: i64) -> Result<(), StoreError> {
    if (MIN_RATING..=MAX_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(StoreError::InvalidRating(rating))
    }
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Initialize the storage backend
    async fn initialize(&self) -> Result<(), StoreError>;

    /// Check if the storage backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Validate and insert one submission, returning the stored row
    async fn save(&self, submission: FeedbackSubmission) -> Result<FeedbackRecord, StoreError>;
}

/// In-memory feedback store for testing and development
pub struct InMemoryFeedbackStore {
    rows: Arc<RwLock<Vec<FeedbackRecord>>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Every stored row, oldest first
    pub async fn records(&self) -> Vec<FeedbackRecord> {
        self.rows.read().await.clone()
    }
}

impl Default for InMemoryFeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        info!("In-memory feedback store initialized");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn save(&self, submission: FeedbackSubmission) -> Result<FeedbackRecord, StoreError> {
        validate_rating(submission.rating)?;

        let mut rows = self.rows.write().await;
        let record = FeedbackRecord::from_submission(rows.len() as i64 + 1, Utc::now(), submission);
        rows.push(record.clone());

        debug!("Stored feedback {} with rating {}", record.id, record.rating);
        Ok(record)
    }
}

/// PostgreSQL feedback store writing to `final_feedback`
pub struct PostgresFeedbackStore {
    pool: sqlx::PgPool,
}

impl PostgresFeedbackStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedbackStore for PostgresFeedbackStore {
    async fn initialize(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS final_feedback (
                id BIGSERIAL PRIMARY KEY,
                rating INTEGER NOT NULL,
                feedback_text TEXT NOT NULL,
                tool_name TEXT NOT NULL,
                email TEXT,
                name TEXT,
                institution TEXT,
                phone_number TEXT,
                moodle_id TEXT,
                query TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("PostgreSQL feedback store initialized");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn save(&self, submission: FeedbackSubmission) -> Result<FeedbackRecord, StoreError> {
        validate_rating(submission.rating)?;

        let (id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO final_feedback
                (rating, feedback_text, tool_name, email, name, institution, phone_number, moodle_id, query)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
            "#,
        )
        .bind(submission.rating as i32)
        .bind(&submission.feedback_text)
        .bind(TOOL_NAME)
        .bind(&submission.email)
        .bind(&submission.name)
        .bind(&submission.institution)
        .bind(&submission.phone_number)
        .bind(&submission.moodle_id)
        .bind(&submission.query)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Error saving feedback: {}", e);
            StoreError::Database(e)
        })?;

        debug!("Stored feedback {} with rating {}", id, submission.rating);
        Ok(FeedbackRecord::from_submission(id, created_at, submission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(rating: i64) -> FeedbackSubmission {
        FeedbackSubmission {
            rating,
            feedback_text: "Clear steps, good safety notes".to_string(),
            email: Some("tech@example.com".to_string()),
            name: None,
            institution: Some("Trade school".to_string()),
            phone_number: None,
            moodle_id: Some("m-77".to_string()),
            query: Some("Why is my AC freezing up?".to_string()),
        }
    }

    #[test]
    fn test_validate_rating_bounds() {
        for rating in MIN_RATING..=MAX_RATING {
            assert!(validate_rating(rating).is_ok());
        }
        assert!(matches!(validate_rating(0), Err(StoreError::InvalidRating(0))));
        assert!(matches!(validate_rating(6), Err(StoreError::InvalidRating(6))));
        assert!(validate_rating(-3).is_err());
    }

    #[tokio::test]
    async fn test_in_memory_save() {
        let store = InMemoryFeedbackStore::new();
        let record = store.save(submission(4)).await.unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.rating, 4);
        assert_eq!(record.tool_name, TOOL_NAME);
        assert_eq!(record.moodle_id.as_deref(), Some("m-77"));
        assert_eq!(store.records().await, vec![record]);
    }

    #[tokio::test]
    async fn test_invalid_rating_is_not_written() {
        let store = InMemoryFeedbackStore::new();
        let err = store.save(submission(9)).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRating(9)));
        assert!(store.records().await.is_empty());
    }

    #[test]
    fn test_rating_accepts_whole_floats() {
        let whole: FeedbackSubmission = serde_json::from_str(r#"{"rating": 4.0}"#).unwrap();
        assert_eq!(whole.rating, 4);

        let err = serde_json::from_str::<FeedbackSubmission>(r#"{"rating": 4.5}"#).unwrap_err();
        assert!(err.to_string().contains("whole number"));
        assert!(serde_json::from_str::<FeedbackSubmission>(r#"{"rating": "4"}"#).is_err());
    }

    #[test]
    fn test_submission_optional_fields_default() {
        let parsed: FeedbackSubmission = serde_json::from_str(r#"{"rating": 5}"#).unwrap();
        assert_eq!(parsed.rating, 5);
        assert_eq!(parsed.feedback_text, "");
        assert!(parsed.email.is_none());
        assert!(parsed.query.is_none());
    }
}
