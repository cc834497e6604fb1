//! Input validation shared by person and address models.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum characters for family, given and joint names.
pub const NAME_MAX_CHARS: usize = 20;
/// Maximum characters for each address line.
pub const ADDRESS_LINE_MAX_CHARS: usize = 100;

static ZIPCODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{3})-?([0-9]{4})$").expect("valid zipcode regex"));

/// Rejected user input, reported with the offending field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is blank after trim.
    Blank { field: &'static str },
    /// Field exceeds its character limit.
    TooLong {
        field: &'static str,
        max_chars: usize,
    },
    /// Zipcode is not seven digits (`NNNNNNN` or `NNN-NNNN`).
    InvalidZipcode(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank { field } => write!(f, "`{field}` must not be blank"),
            Self::TooLong { field, max_chars } => {
                write!(f, "`{field}` must be at most {max_chars} characters")
            }
            Self::InvalidZipcode(value) => {
                write!(f, "zipcode must be 7 digits, got `{value}`")
            }
        }
    }
}

impl Error for ValidationError {}

/// Trims a required field and checks its length.
pub fn required_text(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank { field });
    }
    check_length(field, trimmed, max_chars)?;
    Ok(trimmed.to_string())
}

/// Trims an optional field; blank input becomes `None`.
pub fn optional_text(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    check_length(field, trimmed, max_chars)?;
    Ok(Some(trimmed.to_string()))
}

/// Normalizes a zipcode to its seven-digit storage form.
pub fn normalize_zipcode(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let caps = ZIPCODE_RE
        .captures(trimmed)
        .ok_or_else(|| ValidationError::InvalidZipcode(trimmed.to_string()))?;
    Ok(format!("{}{}", &caps[1], &caps[2]))
}

fn check_length(field: &'static str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max_chars {
        return Err(ValidationError::TooLong { field, max_chars });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_zipcode, optional_text, required_text, ValidationError};

    #[test]
    fn zipcode_accepts_hyphenated_and_plain_forms() {
        assert_eq!(normalize_zipcode("123-4567").unwrap(), "1234567");
        assert_eq!(normalize_zipcode(" 1234567 ").unwrap(), "1234567");
    }

    #[test]
    fn zipcode_rejects_wrong_digit_count() {
        let err = normalize_zipcode("12-34567").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidZipcode(_)));
        assert!(normalize_zipcode("１２３４５６７").is_err());
    }

    #[test]
    fn required_text_counts_characters_not_bytes() {
        assert_eq!(
            required_text("family_name", " 山田 ", 2).unwrap(),
            "山田".to_string()
        );
        let err = required_text("family_name", "山田太郎", 3).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooLong {
                field: "family_name",
                max_chars: 3
            }
        );
    }

    #[test]
    fn optional_text_maps_blank_to_none() {
        assert_eq!(optional_text("joint_name1", Some("  "), 20).unwrap(), None);
        assert_eq!(optional_text("joint_name1", None, 20).unwrap(), None);
    }
}
