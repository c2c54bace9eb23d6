use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Decode a JSON request body. Any malformed or mistyped body is a 400.
pub fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejecting malformed body: {}", e);
        ApiError::invalid_json(format!("Malformed request body: {}", e))
    })
}

/// Parse an optional integer query parameter. Absent or empty means `default`;
/// anything that is not a non-negative integer is a validation failure.
pub fn parse_query_i64(field: &str, raw: Option<&str>, default: i64) -> Result<i64, ApiError> {
    let raw = match raw {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        Ok(_) => Err(ApiError::field_error(field, "must not be negative")),
        Err(_) => Err(ApiError::field_error(field, format!("'{}' is not an integer", raw))),
    }
}
