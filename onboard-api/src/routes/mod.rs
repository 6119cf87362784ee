/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `register`: Multipart company registration
/// - `auth`: Login
/// - `profile`: The caller's own profile
/// - `companies`: Company listing, detail and soft delete

pub mod auth;
pub mod companies;
pub mod health;
pub mod profile;
pub mod register;
