//! Outbound email content. Plain formatting, HTML + text alternatives.

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Registration verification code.
pub fn otp_email(app_name: &str, code: &str, minutes: i64) -> RenderedEmail {
    RenderedEmail {
        subject: format!("{app_name} verification code: {code}"),
        html: format!(
            "<p>Your {app_name} verification code is <strong>{code}</strong>.</p>\
             <p>It expires in {minutes} minutes. If you did not request this, you can ignore this email.</p>"
        ),
        text: format!(
            "Your {app_name} verification code is {code}.\n\
             It expires in {minutes} minutes. If you did not request this, you can ignore this email.\n"
        ),
    }
}

/// Deletion confirmation code, sent after a verified deletion request.
pub fn deletion_otp_email(
    app_name: &str,
    name: &str,
    code: &str,
    minutes: i64,
    reason: Option<&str>,
) -> RenderedEmail {
    let reason_html = reason
        .map(|r| format!("<p>Stated reason: {r}</p>"))
        .unwrap_or_default();
    let reason_text = reason
        .map(|r| format!("Stated reason: {r}\n"))
        .unwrap_or_default();
    RenderedEmail {
        subject: format!("{app_name}: confirm account deletion"),
        html: format!(
            "<p>Hi {name},</p>\
             <p>Use code <strong>{code}</strong> to confirm deleting your {app_name} account. \
             It expires in {minutes} minutes.</p>{reason_html}\
             <p>If you did not request this, change your password immediately.</p>"
        ),
        text: format!(
            "Hi {name},\n\
             Use code {code} to confirm deleting your {app_name} account. \
             It expires in {minutes} minutes.\n{reason_text}\
             If you did not request this, change your password immediately.\n"
        ),
    }
}

/// Sent to the pre-anonymization address after a completed deletion.
pub fn deletion_completed_email(
    app_name: &str,
    name: &str,
    confirmed_at: DateTime<Utc>,
) -> RenderedEmail {
    let when = confirmed_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    RenderedEmail {
        subject: format!("{app_name}: your account has been deleted"),
        html: format!(
            "<p>Hi {name},</p>\
             <p>Your {app_name} account was deleted on {when}. \
             Your profile data has been removed and cannot be restored.</p>"
        ),
        text: format!(
            "Hi {name},\n\
             Your {app_name} account was deleted on {when}. \
             Your profile data has been removed and cannot be restored.\n"
        ),
    }
}
