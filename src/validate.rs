use crate::error::AppError;

/// Rejects `value` when it is empty or only whitespace. The value is kept as sent.
pub(crate) fn required(value: &str, field: &str) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{} can not be empty", field)));
    }
    Ok(value.to_string())
}

/// Like [`required`], for keys that may be absent from the body.
pub(crate) fn required_key(value: Option<&str>, field: &str) -> Result<String, AppError> {
    required(value.unwrap_or_default(), field)
}
