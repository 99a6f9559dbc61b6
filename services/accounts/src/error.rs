use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Accounts service domain error variants.
///
/// Authorization-class failures stay deliberately coarse on the wire
/// (`InvalidCredentials`, `InvalidRequestOrOtp`); the precise cause is logged
/// at the use-case layer instead.
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid username")]
    InvalidUsername,
    #[error("invalid gender")]
    InvalidGender,
    #[error("invalid purpose")]
    InvalidPurpose,
    #[error("missing required fields")]
    MissingFields,
    #[error("email already registered")]
    AlreadyRegistered,
    #[error("username already in use")]
    UsernameTaken,
    #[error("student number already in use")]
    StudentNoTaken,
    #[error("employee number already in use")]
    EmployeeNoTaken,
    #[error("too many requests")]
    RateLimited { retry_after_secs: u64 },
    #[error("no active code")]
    NoActiveCode,
    #[error("code expired")]
    CodeExpired,
    #[error("invalid code")]
    InvalidCode,
    #[error("invalid ticket")]
    TicketInvalid,
    #[error("ticket already used")]
    TicketUsed,
    #[error("ticket expired")]
    TicketExpired,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("account not found")]
    AccountNotFound,
    #[error("account already deleted")]
    AccountGone,
    #[error("no pending deletion request")]
    NoPendingRequest,
    #[error("invalid requestId or otp")]
    InvalidRequestOrOtp,
    #[error("otp expired")]
    OtpExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("forbidden")]
    Forbidden,
    #[error("failed to deliver email")]
    DeliveryFailed,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccountServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidUsername => "INVALID_USERNAME",
            Self::InvalidGender => "INVALID_GENDER",
            Self::InvalidPurpose => "INVALID_PURPOSE",
            Self::MissingFields => "MISSING_FIELDS",
            Self::AlreadyRegistered => "ALREADY_REGISTERED",
            Self::UsernameTaken => "USERNAME_TAKEN",
            Self::StudentNoTaken => "STUDENT_NO_TAKEN",
            Self::EmployeeNoTaken => "EMPLOYEE_NO_TAKEN",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::NoActiveCode => "NO_ACTIVE_CODE",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::InvalidCode => "INVALID_CODE",
            Self::TicketInvalid => "TICKET_INVALID",
            Self::TicketUsed => "TICKET_USED",
            Self::TicketExpired => "TICKET_EXPIRED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::AccountNotFound => "ACCOUNT_NOT_FOUND",
            Self::AccountGone => "ACCOUNT_GONE",
            Self::NoPendingRequest => "NO_PENDING_REQUEST",
            Self::InvalidRequestOrOtp => "INVALID_REQUEST_OR_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail
            | Self::InvalidUsername
            | Self::InvalidGender
            | Self::InvalidPurpose
            | Self::MissingFields
            | Self::NoActiveCode
            | Self::CodeExpired
            | Self::InvalidCode
            | Self::TicketInvalid
            | Self::TicketUsed
            | Self::TicketExpired
            | Self::NoPendingRequest
            | Self::InvalidRequestOrOtp => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyRegistered
            | Self::UsernameTaken
            | Self::StudentNoTaken
            | Self::EmployeeNoTaken => StatusCode::CONFLICT,
            Self::AccountGone | Self::OtpExpired => StatusCode::GONE,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AccountServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            let secs = retry_after_secs.max(1);
            if let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string()) {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}
