//! Storage abstraction layer
//!
//! This module provides a trait-based abstraction for persistence, allowing
//! the exporter to run against PostgreSQL or an in-process store.

pub mod factory;
pub mod memory;
pub mod traits;

pub use factory::create_store;
pub use memory::MemoryStore;
pub use traits::ExportStore;
