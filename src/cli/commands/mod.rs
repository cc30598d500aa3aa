//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod authorize;
pub mod context;
pub mod export;
pub mod init;
pub mod status;
pub mod submit;
pub mod users;
pub mod validate;
