/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a health check
/// - `migrations`: Embedded schema migrations
///
/// Table access lives in the `models` module at crate root level.

pub mod migrations;
pub mod pool;
