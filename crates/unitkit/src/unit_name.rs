//! Unit name validation.
//!
//! Names end up as arguments to `systemctl` or as a path under
//! `/etc/init.d`, so anything outside the systemd unit-name alphabet is
//! rejected before a command is built.

use crate::error::{Error, Result};

/// Longest unit name systemd accepts.
pub const MAX_UNIT_NAME_LEN: usize = 255;

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '.' | '@' | '-' | '\\')
}

/// Validate a unit name.
///
/// # Example
///
/// ```
/// use unitkit::validate_unit_name;
///
/// assert!(validate_unit_name("kafka-manager").is_ok());
/// assert!(validate_unit_name("getty@tty1.service").is_ok());
/// assert!(validate_unit_name("nginx; rm -rf /").is_err());
/// ```
pub fn validate_unit_name(name: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidUnitName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }

    if name.len() > MAX_UNIT_NAME_LEN {
        return Err(invalid("name is longer than 255 bytes"));
    }

    if name.starts_with('-') || name.starts_with('.') {
        return Err(invalid("name cannot start with '-' or '.'"));
    }

    if name.contains("..") {
        return Err(invalid("name cannot contain '..'"));
    }

    if let Some(c) = name.chars().find(|c| !is_allowed_char(*c)) {
        return Err(invalid(&format!("character {c:?} is not allowed")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_unit_name("kafka-manager").is_ok());
        assert!(validate_unit_name("burrow").is_ok());
        assert!(validate_unit_name("kafka-manager.service").is_ok());
        assert!(validate_unit_name("getty@tty1.service").is_ok());
        assert!(validate_unit_name("dev-disk-by\\x2duuid.device").is_ok());
    }

    #[test]
    fn test_empty_name() {
        assert!(matches!(
            validate_unit_name(""),
            Err(Error::InvalidUnitName { .. })
        ));
    }

    #[test]
    fn test_injection_attempts() {
        assert!(validate_unit_name("../etc/passwd").is_err());
        assert!(validate_unit_name("nginx; rm -rf /").is_err());
        assert!(validate_unit_name("nginx\nmalicious").is_err());
        assert!(validate_unit_name("--now").is_err());
        assert!(validate_unit_name("a/b").is_err());
    }

    #[test]
    fn test_too_long() {
        let name = "a".repeat(MAX_UNIT_NAME_LEN + 1);
        assert!(validate_unit_name(&name).is_err());
        assert!(validate_unit_name(&"a".repeat(MAX_UNIT_NAME_LEN)).is_ok());
    }
}
