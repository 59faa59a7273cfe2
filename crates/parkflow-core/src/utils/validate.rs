//! Input checks applied before anything is sent to the gateway.

use crate::models::normalize_plate;

/// Minimum password length accepted at registration and password change
pub const MIN_PASSWORD_LEN: usize = 8;

const PLATE_LEN: std::ops::RangeInclusive<usize> = 2..=10;

/// `local@domain.tld`: no whitespace, exactly one `@`, and a dot inside the domain
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.contains('@') && !s.chars().any(char::is_whitespace);
    if !clean(local) || !clean(domain) {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn validate_password(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters long");
    }
    if password != confirmation {
        return Err("Passwords do not match");
    }
    Ok(())
}

/// Normalize a plate and check its length
pub fn validate_plate(plate: &str) -> Result<String, &'static str> {
    let plate = normalize_plate(plate);
    if plate.is_empty() {
        return Err("Please enter a license plate");
    }
    if !PLATE_LEN.contains(&plate.chars().count()) {
        return Err("License plate must be between 2 and 10 characters");
    }
    Ok(plate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("driver@example.com"));
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("driver@example"));
        assert!(!is_valid_email("driver@.com"));
        assert!(!is_valid_email("driver@example."));
        assert!(!is_valid_email("dri ver@example.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("longenough", "longenough").is_ok());
        assert_eq!(validate_password("short", "short"), Err("Password must be at least 8 characters long"));
        assert_eq!(validate_password("longenough", "different"), Err("Passwords do not match"));
    }

    #[test]
    fn test_plate_validation() {
        assert_eq!(validate_plate(" wa12345 "), Ok("WA12345".to_string()));
        assert!(validate_plate("   ").is_err());
        assert!(validate_plate("W").is_err());
        assert!(validate_plate("WA1234567890").is_err());
    }
}
