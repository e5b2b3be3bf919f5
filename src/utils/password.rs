use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// Password policy: 8 to 64 characters, with lowercase, uppercase, digit
/// and punctuation or symbol.
pub fn validate_password(password: &str) -> AppResult<()> {
    let mut errors = Vec::new();
    let length = password.chars().count();

    if length < 8 {
        errors.push("password is too short");
    }
    if length > 64 {
        errors.push("password is too long");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push("password must include lowercase letters");
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push("password must include uppercase letters");
    }
    if !password.chars().any(|c| c.is_numeric()) {
        errors.push("password must include numbers");
    }
    if !password
        .chars()
        .any(|c| c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_whitespace()))
    {
        errors.push("password must include special characters");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "invalid password: {}",
            errors.join(", ")
        )))
    }
}

/// Hashes are salted with the owner's email: `bcrypt("<email>:<password>")`.
pub fn hash_password(email: &str, password: &str) -> AppResult<String> {
    hash(format!("{email}:{password}"), DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

pub fn verify_password(email: &str, password: &str, hash: &str) -> AppResult<bool> {
    verify(format!("{email}:{password}"), hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Aa1@azetyuiop").is_ok());
        assert!(validate_password("aa1@azetyuiop").is_err()); // no uppercase
        assert!(validate_password("AA1@AZETYUIOP").is_err()); // no lowercase
        assert!(validate_password("Aa@azetyuiop").is_err()); // no digit
        assert!(validate_password("Aa1azetyuiop").is_err()); // no special
        assert!(validate_password("Aa1@a").is_err()); // too short
        assert!(validate_password(&format!("Aa1@{}", "z".repeat(61))).is_err()); // too long
    }

    #[test]
    fn test_validation_message_lists_every_issue() {
        let err = validate_password("abc").unwrap_err().to_string();
        assert!(err.contains("too short"));
        assert!(err.contains("uppercase"));
        assert!(err.contains("numbers"));
        assert!(err.contains("special"));
    }

    #[test]
    fn test_hash_and_verify_password() {
        let email = "user-thetiptop@yopmail.com";
        let hashed = hash_password(email, "Aa1@azetyuiop").unwrap();

        assert!(verify_password(email, "Aa1@azetyuiop", &hashed).unwrap());
        assert!(!verify_password(email, "WrongPassword1!", &hashed).unwrap());
        assert!(!verify_password("other@yopmail.com", "Aa1@azetyuiop", &hashed).unwrap());
    }
}
