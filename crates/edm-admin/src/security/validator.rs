//! Input validation for entity names and emails

use crate::error::{AdminError, AdminResult};
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Maximum folder name length accepted by the document library
pub const MAX_NAME_LENGTH: usize = 128;

/// Characters the document library refuses in folder names
static FORBIDDEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r##"["#%*:<>?/\\{|}~]"##).expect("static regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

static TRAILING_DOTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.+$").expect("static regex"));

/// Very loose shape check; the directory is the source of truth for emails
static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+$").expect("static regex"));

/// Strip characters the library rejects, collapse whitespace and drop
/// trailing dots
pub fn sanitize_folder_name(raw: &str) -> String {
    let stripped = FORBIDDEN_CHARS.replace_all(raw.trim(), "");
    let collapsed = WHITESPACE_RUN.replace_all(&stripped, " ");
    TRAILING_DOTS.replace(collapsed.trim(), "").trim().to_string()
}

/// Sanitize a company or area name and reject what cannot become a folder
pub fn validate_entity_name(label: &str, raw: &str) -> AdminResult<String> {
    let name = sanitize_folder_name(raw);
    if name.is_empty() {
        return Err(AdminError::Validation(format!("{} name cannot be empty", label)));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AdminError::Validation(format!(
            "{} name cannot exceed {} characters",
            label, MAX_NAME_LENGTH
        )));
    }
    Ok(name)
}

/// Normalized, non-empty email
pub fn validate_email(raw: &str) -> AdminResult<String> {
    let email = crate::models::normalize_email(raw);
    if email.is_empty() {
        return Err(AdminError::Validation("A user must be selected".to_string()));
    }
    if !EMAIL_SHAPE.is_match(&email) {
        return Err(AdminError::Validation(format!("Invalid email address: {}", email)));
    }
    Ok(email)
}

/// Comparison key for names: decomposed, accents stripped, lower-cased, trimmed
pub fn normalize_name(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
        .trim()
        .to_string()
}

/// Accent- and case-insensitive name equality
pub fn names_match(a: &str, b: &str) -> bool {
    normalize_name(a) == normalize_name(b)
}
