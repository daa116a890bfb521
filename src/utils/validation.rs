use crate::error::{AppError, Result};

/// Trims `value` and checks it is non-empty and at most `max_chars` long.
/// Returns the trimmed text.
pub fn require_text(field: &str, value: &str, max_chars: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }

    if trimmed.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }

    Ok(trimmed.to_string())
}

/// Trimmed nickname of at least `min_chars` characters.
pub fn validate_nickname(nickname: &str, min_chars: usize) -> Result<String> {
    let trimmed = nickname.trim();
    if trimmed.chars().count() < min_chars {
        return Err(AppError::Validation(format!(
            "Nickname must be at least {} characters",
            min_chars
        )));
    }

    Ok(trimmed.to_string())
}

/// Multi-select check: at least one value, every value from `allowed`.
pub fn require_selection(field: &str, values: &[String], allowed: &[&str]) -> Result<()> {
    if values.is_empty() {
        return Err(AppError::Validation(format!(
            "Select at least one {}",
            field
        )));
    }

    if let Some(unknown) = values.iter().find(|v| !allowed.contains(&v.as_str())) {
        return Err(AppError::Validation(format!(
            "Unknown {}: {}",
            field, unknown
        )));
    }

    Ok(())
}
