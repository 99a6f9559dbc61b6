//! Input validation helpers.

/// Coarse syntactic email check: one `@`, non-empty local part, and a host
/// containing a dot. Deliverability is proven by the OTP round trip, not here.
pub fn validate_email(email: &str) -> bool {
    let Some((local, host)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || host.is_empty() || email.len() > 254 {
        return false;
    }
    if local.chars().any(char::is_whitespace) || host.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((name, tld)) = host.rsplit_once('.') else {
        return false;
    };
    !name.is_empty() && !tld.is_empty()
}

/// Usernames are 3–30 chars of letters, digits, dot, underscore, or hyphen.
pub fn validate_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Lower-case and trim an email before any lookup or storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
