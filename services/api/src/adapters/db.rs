//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `StudyStore` port from the `core` crate. Each collection is stored as
//! one JSON document under a fixed key in the `study_state` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{FromRow, PgPool};
use study_assistant_core::domain::{QuizQuestion, QuizResult};
use study_assistant_core::ports::{PortError, PortResult, StudyMaterials, StudyStore};

const STUDY_DATA_KEY: &str = "study_data";
const ERROR_NOTEBOOK_KEY: &str = "error_notebook";
const QUIZ_RESULTS_KEY: &str = "quiz_results";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `StudyStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> PortResult<T> {
        let record = sqlx::query_as::<_, StateRecord>(
            "SELECT key, value, updated_at FROM study_state WHERE key = $1",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Nothing saved under '{}'", key)),
            _ => PortError::Unexpected(e.to_string()),
        })?;

        tracing::debug!("Loaded '{}' saved at {}.", record.key, record.updated_at);
        serde_json::from_str(&record.value)
            .map_err(|e| PortError::Malformed(format!("Stored '{}' is unreadable: {}", key, e)))
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> PortResult<()> {
        let json = serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        sqlx::query(
            "INSERT INTO study_state (key, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
        )
        .bind(key)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct StateRecord {
    key: String,
    value: String,
    updated_at: DateTime<Utc>,
}

//=========================================================================================
// `StudyStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl StudyStore for DbAdapter {
    async fn load_study_materials(&self) -> PortResult<StudyMaterials> {
        self.load(STUDY_DATA_KEY).await
    }

    async fn save_study_materials(&self, materials: &StudyMaterials) -> PortResult<()> {
        self.save(STUDY_DATA_KEY, materials).await
    }

    async fn load_error_notebook(&self) -> PortResult<Vec<QuizQuestion>> {
        self.load(ERROR_NOTEBOOK_KEY).await
    }

    async fn save_error_notebook(&self, questions: &[QuizQuestion]) -> PortResult<()> {
        self.save(ERROR_NOTEBOOK_KEY, questions).await
    }

    async fn load_quiz_results(&self) -> PortResult<Vec<QuizResult>> {
        self.load(QUIZ_RESULTS_KEY).await
    }

    async fn save_quiz_results(&self, results: &[QuizResult]) -> PortResult<()> {
        self.save(QUIZ_RESULTS_KEY, results).await
    }
}
