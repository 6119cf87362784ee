/// Document model and database operations
///
/// A document row records where an uploaded registration file was stored. The
/// bytes themselves live in the file store; see [`crate::storage`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE documents (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     file_name VARCHAR(512) NOT NULL,
///     file_path VARCHAR(1024) NOT NULL,
///     file_size BIGINT NOT NULL CHECK (file_size >= 0),
///     mime_type VARCHAR(255) NOT NULL,
///     company_id UUID NOT NULL REFERENCES companies (id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

const COLUMNS: &str = "id, file_name, file_path, file_size, mime_type, company_id, \
                       created_at, updated_at, deleted_at";

/// Stored document metadata
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,

    /// Name of the file as uploaded
    pub file_name: String,

    /// Location in the file store
    pub file_path: String,

    /// Size in bytes
    pub file_size: i64,

    pub mime_type: String,

    pub company_id: Uuid,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a document row
#[derive(Debug, Clone)]
pub struct CreateDocument {
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub company_id: Uuid,
}

impl Document {
    /// Inserts a document row
    pub async fn create<'e, E>(executor: E, data: CreateDocument) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO documents (file_name, file_path, file_size, mime_type, company_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Document>(&sql)
            .bind(data.file_name)
            .bind(data.file_path)
            .bind(data.file_size)
            .bind(data.mime_type)
            .bind(data.company_id)
            .fetch_one(executor)
            .await
    }

    /// Lists the live documents of a company in upload order
    pub async fn list_by_company(pool: &PgPool, company_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {COLUMNS} FROM documents \
             WHERE company_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at, id"
        );

        sqlx::query_as::<_, Document>(&sql)
            .bind(company_id)
            .fetch_all(pool)
            .await
    }
}
