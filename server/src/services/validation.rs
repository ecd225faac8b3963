//! Input normalization shared by the catalog services
//!
//! Everything here runs before the store is touched.

use crate::error::{AppError, Result};

/// Trimmed, non-empty, at most `max` characters
pub fn required(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    bounded(field, value, max)?;
    Ok(value.to_string())
}

/// Blank becomes `None`
pub fn optional(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => {
            bounded(field, v, max)?;
            Ok(Some(v.to_string()))
        }
        _ => Ok(None),
    }
}

/// Trimmed and bounded; unlike [`optional`], a blank value stays `Some("")`
pub fn text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
    match value.map(str::trim) {
        Some(v) => {
            bounded(field, v, max)?;
            Ok(Some(v.to_string()))
        }
        None => Ok(None),
    }
}

/// Required, uppercased code
pub fn code(field: &str, value: &str, max: usize) -> Result<String> {
    Ok(required(field, value, max)?.to_uppercase())
}

/// Optional, lowercased email with a minimal shape check
pub fn email(value: Option<&str>) -> Result<Option<String>> {
    let Some(email) = optional("email", value, 254)? else {
        return Ok(None);
    };
    let well_formed = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
        .unwrap_or(false);
    if !well_formed {
        return Err(AppError::InvalidInput(format!("Invalid email: {}", email)));
    }
    Ok(Some(email.to_lowercase()))
}

fn bounded(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}
