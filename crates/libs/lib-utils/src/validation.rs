//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate maximum length.
pub fn validate_max_len(value: &str, max: usize, field_name: &str) -> Result<(), String> {
    if value.len() > max {
        Err(format!("{} must be at most {} characters", field_name, max))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_empty() {
        assert!(validate_not_empty("WETH", "symbol").is_ok());
        assert_eq!(validate_not_empty("  ", "symbol").unwrap_err(), "symbol cannot be empty");
    }

    #[test]
    fn test_validate_max_len() {
        assert!(validate_max_len("USDC", 32, "symbol").is_ok());
        assert!(validate_max_len(&"X".repeat(33), 32, "symbol").is_err());
    }
}
