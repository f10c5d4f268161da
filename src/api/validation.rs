use regex::Regex;
use std::sync::OnceLock;

use super::ApiError;

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*$")
            .expect("email regex is valid")
    })
}

pub fn validate_email(email: &str) -> Result<&str, ApiError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if trimmed.len() > 254 || !email_regex().is_match(trimmed) {
        return Err(ApiError::validation(format!(
            "Invalid email address: {trimmed}"
        )));
    }
    Ok(trimmed)
}

pub fn validate_id(id: i32, what: &str) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {what} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(" a.b+c@example.co.uk ").unwrap(), "a.b+c@example.co.uk");
        assert!(validate_email("admin@localhost").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("space in@example.com").is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id(1, "issue").is_ok());
        assert!(validate_id(0, "issue").is_err());
        assert!(validate_id(-3, "file").is_err());
    }
}
