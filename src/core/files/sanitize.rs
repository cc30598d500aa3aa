//! Filename sanitization for the document service

/// Characters the document service rejects in file names
pub const FORBIDDEN_CHARS: [char; 9] = ['"', '<', '>', '|', ':', '*', '?', '\\', '/'];

/// Strips every forbidden character from a filename
///
/// Idempotent: sanitizing an already sanitized name returns it unchanged.
///
/// # Examples
///
/// ```
/// use permit_export::core::files::sanitize_filename;
///
/// assert_eq!(sanitize_filename("plan: rev<2>?.pdf"), "plan rev2.pdf");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}
