//! PostgreSQL database integration
//!
//! This module stores submissions, export batches, access recipients and the
//! encrypted credential in PostgreSQL.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
