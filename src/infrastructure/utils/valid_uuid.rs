use uuid::Uuid;

use crate::errors::AppError;

/// Validates that a gallery id is a well-formed UUID
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::validation("id", "Invalid gallery id format"))
}
