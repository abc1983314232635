use crate::errors::GateError;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

pub fn validate_email(email: &str) -> Result<(), GateError> {
    if email.is_empty() {
        return Err(GateError::Validation("Email is required".to_string()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(GateError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

pub fn require(field: &str, value: &str) -> Result<(), GateError> {
    if value.trim().is_empty() {
        return Err(GateError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@nodot").is_err());
        assert!(validate_email("a b@x.com").is_err());
    }

    #[test]
    fn test_require() {
        assert!(require("otp", "4821").is_ok());
        assert!(matches!(
            require("otp", "  "),
            Err(GateError::Validation(msg)) if msg == "otp is required"
        ));
    }
}
