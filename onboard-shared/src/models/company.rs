/// Company model and database operations
///
/// A company is created together with its primary user by the registration
/// workflow. Its postal address is embedded as columns of the `companies`
/// table and surfaces as a nested [`Address`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE companies (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     industry VARCHAR(255) NOT NULL,
///     size VARCHAR(64) NOT NULL,
///     website VARCHAR(512),
///     tax_id VARCHAR(128) NOT NULL,
///     phone VARCHAR(64) NOT NULL,
///     street, city, state, zip_code, country  -- all NOT NULL
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX companies_tax_id_active_key
///     ON companies (tax_id) WHERE deleted_at IS NULL;
/// ```
///
/// Soft-deleted companies (`deleted_at IS NOT NULL`) are invisible to every
/// query here and don't count against tax id uniqueness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, PgPool, Postgres};
use tracing::debug;
use uuid::Uuid;

use super::document::Document;
use super::user::User;

/// Name of the partial unique index guarding `tax_id`
pub const TAX_ID_CONSTRAINT: &str = "companies_tax_id_active_key";

const COLUMNS: &str = "id, name, industry, size, website, tax_id, phone, \
                       street, city, state, zip_code, country, \
                       created_at, updated_at, deleted_at";

/// Postal address embedded in a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// A registered company
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    /// Unique company ID (UUID v4)
    pub id: Uuid,

    /// Legal or trading name
    pub name: String,

    /// Industry the company operates in
    pub industry: String,

    /// Head-count bracket, e.g. "1-10" or "51-200"
    pub size: String,

    /// Optional public website
    pub website: Option<String>,

    /// Tax identifier, unique among live companies
    pub tax_id: String,

    /// Main phone number
    pub phone: String,

    /// Postal address
    #[sqlx(flatten)]
    pub address: Address,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft delete marker
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Input for creating a company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCompany {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub website: Option<String>,
    pub tax_id: String,
    pub phone: String,
    pub address: Address,
}

/// A company with its live users, as returned by listings
#[derive(Debug, Clone, Serialize)]
pub struct CompanyWithUsers {
    #[serde(flatten)]
    pub company: Company,

    pub users: Vec<User>,
}

/// A company with its live documents
#[derive(Debug, Clone, Serialize)]
pub struct CompanyDetails {
    #[serde(flatten)]
    pub company: Company,

    pub documents: Vec<Document>,
}

/// Paging and filtering for [`Company::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyQuery {
    /// 1-based page number
    pub page: u32,

    /// Page size
    pub limit: u32,

    /// Case-insensitive substring matched against name or industry
    pub search: Option<String>,
}

impl Default for CompanyQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
            search: None,
        }
    }
}

impl CompanyQuery {
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a query from optional raw parameters, applying defaults and bounds
    ///
    /// Page is at least 1, limit is clamped to `1..=MAX_LIMIT` and a blank
    /// search term counts as no filter.
    pub fn new(page: Option<u32>, limit: Option<u32>, search: Option<String>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT),
            search: search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }

    /// Row offset of the first company on this page
    pub fn offset(&self) -> i64 {
        (i64::from(self.page.max(1)) - 1) * i64::from(self.limit)
    }

    /// `ILIKE` pattern for the search term with wildcards in it escaped
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }
}

/// One page of companies plus the number of matching companies overall
#[derive(Debug, Clone)]
pub struct CompanyPage {
    pub companies: Vec<CompanyWithUsers>,
    pub total: i64,
}

impl Company {
    /// Inserts a company
    ///
    /// Accepts any executor so it can run inside the registration transaction.
    ///
    /// # Errors
    ///
    /// A live company with the same tax id fails with a unique violation on
    /// [`TAX_ID_CONSTRAINT`].
    pub async fn create<'e, E>(executor: E, data: CreateCompany) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO companies (name, industry, size, website, tax_id, phone,
                                   street, city, state, zip_code, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, Company>(&sql)
            .bind(data.name)
            .bind(data.industry)
            .bind(data.size)
            .bind(data.website)
            .bind(data.tax_id)
            .bind(data.phone)
            .bind(data.address.street)
            .bind(data.address.city)
            .bind(data.address.state)
            .bind(data.address.zip_code)
            .bind(data.address.country)
            .fetch_one(executor)
            .await
    }

    /// Finds a live company by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM companies WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, Company>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a live company by tax id
    pub async fn find_by_tax_id<'e, E>(executor: E, tax_id: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM companies WHERE tax_id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, Company>(&sql)
            .bind(tax_id)
            .fetch_optional(executor)
            .await
    }

    /// Loads a live company together with its live documents
    pub async fn find_with_documents(pool: &PgPool, id: Uuid) -> Result<Option<CompanyDetails>, sqlx::Error> {
        let Some(company) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let documents = Document::list_by_company(pool, id).await?;

        Ok(Some(CompanyDetails { company, documents }))
    }

    /// Lists live companies, newest first, with their users eagerly loaded
    ///
    /// Offset-based; `total` counts every company matching the filter.
    pub async fn list(pool: &PgPool, query: &CompanyQuery) -> Result<CompanyPage, sqlx::Error> {
        let pattern = query.search_pattern();

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM companies
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR name ILIKE $1 OR industry ILIKE $1)
            "#,
        )
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM companies
            WHERE deleted_at IS NULL
              AND ($1::text IS NULL OR name ILIKE $1 OR industry ILIKE $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        );

        let companies = sqlx::query_as::<_, Company>(&sql)
            .bind(&pattern)
            .bind(i64::from(query.limit))
            .bind(query.offset())
            .fetch_all(pool)
            .await?;

        let ids: Vec<Uuid> = companies.iter().map(|c| c.id).collect();
        let mut users = User::list_by_companies(pool, &ids).await?;

        debug!(
            page = query.page,
            limit = query.limit,
            returned = companies.len(),
            total,
            "Listed companies"
        );

        let companies = companies
            .into_iter()
            .map(|company| {
                let (mine, rest): (Vec<User>, Vec<User>) =
                    users.drain(..).partition(|u| u.company_id == company.id);
                users = rest;
                CompanyWithUsers { company, users: mine }
            })
            .collect();

        Ok(CompanyPage { companies, total })
    }

    /// Soft-deletes a company along with its users and documents
    ///
    /// All three updates run in one transaction. Rows are kept; only
    /// `deleted_at` is set, which frees the tax id and emails for reuse.
    ///
    /// # Returns
    ///
    /// True if a live company was deleted, false if none matched
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE companies SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE company_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE documents SET deleted_at = NOW(), updated_at = NOW() \
             WHERE company_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
