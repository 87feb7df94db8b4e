//! Common validation utilities.

use validator::{ValidateEmail, ValidationError};

/// Maximum length of a campaign name after trimming.
pub const MAX_CAMPAIGN_NAME_CHARS: usize = 100;

/// Trims and lower-cases an email address so comparisons are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Compares two email addresses case-insensitively, ignoring surrounding whitespace.
pub fn emails_match(a: &str, b: &str) -> bool {
    normalize_email(a) == normalize_email(b)
}

/// Validates that an (already normalized) email address is syntactically valid.
pub fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if !email.is_empty() && email.validate_email() {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_format");
        err.message = Some("Enter a valid email address".into());
        Err(err)
    }
}

/// Validates a campaign name: 1 to 100 characters once trimmed.
pub fn validate_campaign_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 {
        let mut err = ValidationError::new("campaign_name_empty");
        err.message = Some("Campaign name cannot be empty".into());
        return Err(err);
    }
    if len > MAX_CAMPAIGN_NAME_CHARS {
        let mut err = ValidationError::new("campaign_name_length");
        err.message = Some("Campaign name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::Fake;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Bob@Example.COM "), "bob@example.com");
        assert_eq!(normalize_email("alice@example.com"), "alice@example.com");
    }

    #[test]
    fn test_emails_match_ignores_case() {
        assert!(emails_match("Bob@Example.com", "bob@example.com"));
        assert!(!emails_match("bob@example.com", "carol@example.com"));
    }

    #[test]
    fn test_validate_email_address() {
        assert!(validate_email_address("bob@example.com").is_ok());
        assert!(validate_email_address("").is_err());
        assert!(validate_email_address("bob").is_err());
        assert!(validate_email_address("bob@").is_err());
    }

    #[test]
    fn test_validate_generated_emails() {
        for _ in 0..20 {
            let email: String = SafeEmail().fake();
            assert!(validate_email_address(&normalize_email(&email)).is_ok());
        }
    }

    #[test]
    fn test_validate_email_error_message() {
        let err = validate_email_address("nope").unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Enter a valid email address"
        );
    }

    #[test]
    fn test_validate_campaign_name() {
        assert!(validate_campaign_name("Curse of Strahd").is_ok());
        assert!(validate_campaign_name("  x  ").is_ok());
        assert!(validate_campaign_name("").is_err());
        assert!(validate_campaign_name("    ").is_err());
        assert!(validate_campaign_name(&"a".repeat(100)).is_ok());
        assert!(validate_campaign_name(&"a".repeat(101)).is_err());
    }

    #[test]
    fn test_validate_campaign_name_counts_chars_not_bytes() {
        // 100 two-byte characters
        assert!(validate_campaign_name(&"é".repeat(100)).is_ok());
    }
}
