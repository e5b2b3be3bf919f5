use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("email regex is valid")
    })
}

/// Checks the address shape (`local@domain.tld`), max 320 characters.
pub fn validate_email(email: &str) -> AppResult<()> {
    if email.len() > 320 || !email_regex().is_match(email) {
        return Err(AppError::ValidationError(format!(
            "invalid email address: {email}"
        )));
    }
    Ok(())
}

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user-thetiptop@yopmail.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.fr").is_ok());
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("user.yopmail.com").is_err());
        assert!(validate_email("@yopmail.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@YopMail.com "), "user@yopmail.com");
    }
}
