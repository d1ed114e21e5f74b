use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation utilities for identity service

pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 20;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;

// Compile regex patterns once at startup
// This pattern is hardcoded and always valid, so we use expect() with explicit reasoning
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    // This regex is hardcoded and validated - it is a compile-time constant in practice
    Regex::new(r"^[a-zA-Z0-9_-]{4,20}$")
        .expect("hardcoded username regex is invalid - fix source code")
});

/// Validate username format (4-20 characters, alphanumeric with - and _)
pub fn validate_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

/// Validate password length (8-100 characters)
///
/// Counted in characters, not bytes, so non-ASCII passwords are not penalized.
pub fn validate_password(password: &str) -> bool {
    let len = password.chars().count();
    (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
}
