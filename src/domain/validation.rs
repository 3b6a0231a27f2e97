//! Input validation
//!
//! Field rules for the public forms (contact, newsletter, event registration).

use super::DomainError;

/// Trimmed, non-empty text no longer than `max_len` characters.
pub fn required_text(field: &'static str, value: &str, max_len: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::invalid(field, "this field is required"));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::invalid(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }
    Ok(value.to_string())
}

/// Optional text: blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, DomainError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required_text(field, value, max_len).map(Some),
    }
}

/// Lowercased email address with a plausible `local@domain.tld` shape.
pub fn email(field: &'static str, value: &str) -> Result<String, DomainError> {
    let value = required_text(field, value, 254)?.to_lowercase();

    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(DomainError::invalid(field, "enter a valid email address"));
    }
    Ok(value)
}
