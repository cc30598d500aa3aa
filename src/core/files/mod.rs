//! File acquisition for uploads
//!
//! - [`fetch`] - Download into a scoped temporary directory
//! - [`archive`] - Expand `.zip` uploads into their PDF entries
//! - [`sanitize`] - Strip characters the document service rejects
//!
//! Temporary directories are owned by [`FetchedFile`] and [`ExpandedFiles`]
//! and removed when those values drop, on success and failure alike.

pub mod archive;
pub mod fetch;
pub mod sanitize;

pub use archive::{expand_if_archive, ExpandedFiles};
pub use fetch::{FetchedFile, FileFetcher};
pub use sanitize::sanitize_filename;
