/// Database models for Onboard
///
/// This module contains the database models and their queries.
///
/// # Models
///
/// - `company`: Registered companies, their address, listing and soft delete
/// - `user`: User accounts belonging to a company
/// - `document`: Metadata of documents uploaded at registration
///
/// Write operations take any `sqlx::Executor` so the registration workflow can
/// run them inside a single transaction.
///
/// # Example
///
/// ```no_run
/// use onboard_shared::models::company::{Company, CompanyQuery};
/// use onboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let page = Company::list(&pool, &CompanyQuery::new(Some(1), Some(20), Some("tech".into()))).await?;
/// println!("{} of {} companies", page.companies.len(), page.total);
/// # Ok(())
/// # }
/// ```

pub mod company;
pub mod document;
pub mod user;
