//! Common validation and input normalization utilities.

use validator::ValidationError;

/// Maximum length of a hospital identifier (slug).
const MAX_HOSPITAL_ID_LENGTH: usize = 64;

/// Validates that a patient name is present.
pub fn validate_patient_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("patient_name_blank");
        err.message = Some("Please enter patient name".into());
        Err(err)
    } else {
        Ok(())
    }
}

/// Validates a hospital identifier.
///
/// Hospital identifiers are lowercase slugs such as `saniat-rmel`:
/// ASCII lowercase letters, digits, `-` and `_`, at most 64 characters.
pub fn validate_hospital_id(hospital_id: &str) -> Result<(), ValidationError> {
    if hospital_id.is_empty() {
        let mut err = ValidationError::new("hospital_id_blank");
        err.message = Some("Hospital information is required".into());
        return Err(err);
    }

    if hospital_id.len() > MAX_HOSPITAL_ID_LENGTH {
        let mut err = ValidationError::new("hospital_id_length");
        err.message = Some("Hospital identifier is too long".into());
        return Err(err);
    }

    let valid = hospital_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        let mut err = ValidationError::new("hospital_id_format");
        err.message = Some("Hospital identifier contains invalid characters".into());
        return Err(err);
    }

    Ok(())
}

/// Trims a required text value.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_string()
}

/// Trims an optional text value, mapping blank input to `None`.
pub fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_patient_name() {
        assert!(validate_patient_name("Amina").is_ok());
        assert!(validate_patient_name("  ").is_err());
    }

    #[test]
    fn test_validate_patient_name_error_message() {
        let err = validate_patient_name("").unwrap_err();
        assert_eq!(err.message.unwrap().to_string(), "Please enter patient name");
    }

    #[test]
    fn test_validate_hospital_id() {
        assert!(validate_hospital_id("saniat-rmel").is_ok());
        assert!(validate_hospital_id("mohammed-6").is_ok());
        assert!(validate_hospital_id("north_wing").is_ok());
        assert!(validate_hospital_id("").is_err());
        assert!(validate_hospital_id("Saniat").is_err());
        assert!(validate_hospital_id("a b").is_err());
        assert!(validate_hospital_id("drop;table").is_err());
    }

    #[test]
    fn test_validate_hospital_id_length() {
        let at_limit = "h".repeat(64);
        let over_limit = "h".repeat(65);
        assert!(validate_hospital_id(&at_limit).is_ok());
        assert!(validate_hospital_id(&over_limit).is_err());
    }

    #[test]
    fn test_validate_hospital_id_blank_message() {
        let err = validate_hospital_id("").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Hospital information is required"
        );
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  Youssef  "), "Youssef");
        assert_eq!(normalize_text("plain"), "plain");
    }

    #[test]
    fn test_normalize_optional_text() {
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(normalize_optional_text(Some("")), None);
        assert_eq!(normalize_optional_text(Some("   ")), None);
        assert_eq!(
            normalize_optional_text(Some("  Near the mosque ")),
            Some("Near the mosque".to_string())
        );
    }
}
