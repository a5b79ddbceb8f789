//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest clicker identifier accepted on the WebSocket.
const MAX_CLICKER_ID_LEN: usize = 64;

/// Best-of matches need an odd number of sets so a majority always exists.
pub fn validate_total_sets(total_sets: u32) -> Result<(), ValidationError> {
    if total_sets % 2 == 0 {
        let mut err = ValidationError::new("total_sets_parity");
        err.message = Some(format!("Total sets must be odd (got {total_sets})").into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a clicker ID is 1 to 64 ASCII alphanumeric, `-` or `_` characters.
///
/// ```ignore
/// validate_clicker_id("remote-left") // Ok
/// validate_clicker_id("")            // Err - empty
/// validate_clicker_id("left remote") // Err - space
/// ```
pub fn validate_clicker_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_CLICKER_ID_LEN {
        let mut err = ValidationError::new("clicker_id_length");
        err.message = Some(
            format!(
                "Clicker ID must be 1 to {MAX_CLICKER_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("clicker_id_format");
        err.message = Some("Clicker ID may only contain letters, digits, `-` and `_`".into());
        return Err(err);
    }

    Ok(())
}
