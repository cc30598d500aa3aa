//! Bluebeam Studio integration
//!
//! [`DocumentService`] is the capability the export engine depends on;
//! [`BluebeamClient`] implements it over the REST API.

pub mod client;
pub mod models;
pub mod service;

pub use client::BluebeamClient;
pub use models::{ProjectUser, UploadTicket};
pub use service::DocumentService;
