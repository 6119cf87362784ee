//! # Onboard Shared Library
//!
//! This crate contains the domain types and business logic behind the Onboard
//! company registration API.
//!
//! ## Module Organization
//!
//! - `models`: Database models (companies, users, documents) and their queries
//! - `auth`: Password hashing, JWT issuance and the authenticated caller context
//! - `storage`: Durable storage for uploaded registration documents
//! - `registration`: The company + primary user registration workflow
//! - `db`: Connection pooling and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod registration;
pub mod storage;

/// Current version of the Onboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
