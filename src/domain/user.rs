//! Access recipients
//!
//! Users are granted full control of every newly created project. They play
//! no other part in the export.

use serde::{Deserialize, Serialize};

/// A user that receives access to new projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

/// Normalises and checks an e-mail address for the user registry
///
/// This is a shape check only; the document service is the final authority.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !email.contains(' ') => {
            Ok(email.to_lowercase())
        }
        _ => Err(format!("Invalid e-mail address: {email}")),
    }
}
