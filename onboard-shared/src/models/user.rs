/// User model and database operations
///
/// Every user belongs to exactly one company. The first user of a company is
/// created by the registration workflow; the profile endpoints update it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(255) NOT NULL,
///     last_name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role VARCHAR(32) NOT NULL DEFAULT 'employee',
///     department VARCHAR(255) NOT NULL,
///     job_title VARCHAR(255) NOT NULL,
///     phone VARCHAR(64) NOT NULL,
///     company_id UUID NOT NULL REFERENCES companies (id),
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// CREATE UNIQUE INDEX users_email_active_key
///     ON users (lower(email)) WHERE deleted_at IS NULL;
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use super::company::Company;

/// Name of the partial unique index guarding `email`
pub const EMAIL_CONSTRAINT: &str = "users_email_active_key";

/// Role assigned when none is given
pub const DEFAULT_ROLE: &str = "employee";

/// Roles a user may hold
pub const ROLES: [&str; 3] = ["admin", "manager", "employee"];

const COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, department, \
                       job_title, phone, company_id, is_active, created_at, updated_at, deleted_at";

/// User account
///
/// Only the Argon2id hash of the password is stored, and it is never
/// serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    pub first_name: String,

    pub last_name: String,

    /// Email address, stored lowercase
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// One of [`ROLES`]
    pub role: String,

    pub department: String,

    pub job_title: String,

    pub phone: String,

    /// Owning company
    pub company_id: Uuid,

    /// Inactive users can't log in
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft delete marker
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether the user may administer their company
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub role: String,
    pub department: String,
    pub job_title: String,
    pub phone: String,
    pub company_id: Uuid,
}

/// Profile fields a user may change themselves
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
}

/// A user with their company embedded, as returned by the profile endpoint
#[derive(Debug, Clone, Serialize)]
pub struct UserWithCompany {
    #[serde(flatten)]
    pub user: User,

    pub company: Option<Company>,
}

impl User {
    /// Inserts an active user
    ///
    /// # Errors
    ///
    /// A live user with the same email (case-insensitive) fails with a unique
    /// violation on [`EMAIL_CONSTRAINT`]; an unknown `company_id` fails the
    /// foreign key.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash, role,
                               department, job_title, phone, company_id, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE)
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.role)
            .bind(data.department)
            .bind(data.job_title)
            .bind(data.phone)
            .bind(data.company_id)
            .fetch_one(executor)
            .await
    }

    /// Finds a live user by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a live user by email, ignoring case
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "SELECT {COLUMNS} FROM users WHERE lower(email) = lower($1) AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(executor)
            .await
    }

    /// Loads a live user with their company
    pub async fn find_with_company(pool: &PgPool, id: Uuid) -> Result<Option<UserWithCompany>, sqlx::Error> {
        let Some(user) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };

        let company = Company::find_by_id(pool, user.company_id).await?;

        Ok(Some(UserWithCompany { user, company }))
    }

    /// Lists the live users of several companies, oldest first
    pub async fn list_by_companies(pool: &PgPool, company_ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        if company_ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {COLUMNS} FROM users \
             WHERE company_id = ANY($1) AND deleted_at IS NULL \
             ORDER BY created_at, id"
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(company_ids)
            .fetch_all(pool)
            .await
    }

    /// Applies a profile update to a live user
    ///
    /// # Returns
    ///
    /// The updated user, or None if the user doesn't exist
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE users SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                department = COALESCE($4, department),
                job_title = COALESCE($5, job_title),
                phone = COALESCE($6, phone),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.department)
            .bind(data.job_title)
            .bind(data.phone)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$v=19$m=65536,t=3,p=4$c2FsdA$aGFzaA".to_string(),
            role: "admin".to_string(),
            department: "Engineering".to_string(),
            job_title: "CTO".to_string(),
            phone: "555".to_string(),
            company_id: Uuid::new_v4(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_user_serialization_hides_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();

        assert!(json.get("password_hash").is_none());
        assert!(json.get("deleted_at").is_none());
        assert_eq!(json["email"], "a@b.com");
        assert_eq!(json["is_active"], true);
        assert!(!json.to_string().contains("argon2id"));
    }

    #[test]
    fn test_user_with_company_flattens_user() {
        let json = serde_json::to_value(UserWithCompany {
            user: sample_user(),
            company: None,
        })
        .unwrap();

        assert_eq!(json["first_name"], "Ada");
        assert!(json["company"].is_null());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_is_admin() {
        let mut user = sample_user();
        assert!(user.is_admin());
        user.role = DEFAULT_ROLE.to_string();
        assert!(!user.is_admin());
    }

    #[test]
    fn test_update_profile_default() {
        let update = UpdateProfile::default();
        assert!(update.first_name.is_none());
        assert!(update.phone.is_none());
    }
}
