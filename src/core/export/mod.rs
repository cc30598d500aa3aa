//! Export orchestration
//!
//! This module provides the core export logic:
//! - Per-submission orchestration and batch finishing ([`coordinator`])
//! - Project access assignment ([`permissions`])
//! - Entry points for the front end and CLI ([`service`])
//! - Background workers ([`worker`])
//! - Summary and reporting ([`summary`])

pub mod coordinator;
pub mod permissions;
pub mod service;
pub mod summary;
pub mod worker;

pub use coordinator::ExportCoordinator;
pub use permissions::{assign_full_access, AccessOutcome, AccessStatus};
pub use service::{ExportService, TriggerOutcome};
pub use summary::ExportSummary;
pub use worker::ExportWorkerPool;
