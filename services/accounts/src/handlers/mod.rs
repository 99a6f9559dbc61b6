pub mod admin;
pub mod deletion;
pub mod login;
pub mod otp;
pub mod register;
pub mod token;

use axum::http::HeaderMap;

/// Caller IP: first hop of `x-forwarded-for` when present.
/// The socket address is not consulted — the service always runs behind the
/// gateway, which sets the header.
pub(crate) fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = forwarded.split(',').next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some(first.to_owned())
}

pub(crate) fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
