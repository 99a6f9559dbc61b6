use chrono::Utc;
use uuid::Uuid;

use unilink_domain::account::Purpose;
use unilink_domain::validate::{normalize_email, validate_email, validate_username};

use crate::domain::repository::AccountRepository;
use crate::domain::secret::token_digest;
use crate::domain::types::{NewAccount, TICKET_LEN};
use crate::error::AccountServiceError;
use crate::password::hash_password;

const ALLOWED_GENDERS: [&str; 4] = ["male", "female", "other", "prefer_not_to_say"];

fn validate_ticket_format(ticket: &str) -> bool {
    ticket.len() == TICKET_LEN && ticket.chars().all(|c| c.is_ascii_digit())
}

pub struct RegisterInput {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub ticket: String,
    pub gender: Option<String>,
    pub student_no: Option<String>,
    pub employee_no: Option<String>,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
}

pub struct RegisterUseCase<A: AccountRepository> {
    pub accounts: A,
}

impl<A: AccountRepository> RegisterUseCase<A> {
    pub async fn execute(&self, input: RegisterInput) -> Result<RegisterOutput, AccountServiceError> {
        let full_name = input.full_name.trim().to_owned();
        let username = input.username.trim().to_owned();
        let email = normalize_email(&input.email);
        let ticket = input.ticket.trim();

        if full_name.is_empty() || username.is_empty() || email.is_empty() || input.password.is_empty()
        {
            return Err(AccountServiceError::MissingFields);
        }
        if !validate_username(&username) {
            return Err(AccountServiceError::InvalidUsername);
        }
        if !validate_email(&email) {
            return Err(AccountServiceError::InvalidEmail);
        }
        if !validate_ticket_format(ticket) {
            tracing::info!(email = %email, "register rejected: malformed ticket");
            return Err(AccountServiceError::TicketInvalid);
        }

        let gender = match input.gender.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => {
                let g = raw.to_lowercase().replace(' ', "_");
                if !ALLOWED_GENDERS.contains(&g.as_str()) {
                    return Err(AccountServiceError::InvalidGender);
                }
                Some(g)
            }
        };
        let student_no = input
            .student_no
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);
        let employee_no = input
            .employee_no
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        // Availability checks give precise errors; the unique constraints and
        // the guarded ticket update remain the authority under races.
        if self.accounts.email_exists(&email).await? {
            return Err(AccountServiceError::AlreadyRegistered);
        }
        if self.accounts.username_exists(&username).await? {
            return Err(AccountServiceError::UsernameTaken);
        }
        if let Some(ref n) = student_no {
            if self.accounts.student_no_exists(n).await? {
                return Err(AccountServiceError::StudentNoTaken);
            }
        }
        if let Some(ref n) = employee_no {
            if self.accounts.employee_no_exists(n).await? {
                return Err(AccountServiceError::EmployeeNoTaken);
            }
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();
        let account = NewAccount {
            id: Uuid::now_v7(),
            email: email.clone(),
            username: username.clone(),
            password_hash,
            role: 0,
            full_name: full_name.clone(),
            gender,
            student_no,
            employee_no,
            created_at: now,
        };

        // Ticket consumption and account creation commit atomically: a crash
        // in between cannot leave a spent ticket without an account.
        self.accounts
            .create_with_ticket(&account, Purpose::Register, &token_digest(ticket), now)
            .await?;

        tracing::info!(account_id = %account.id, email = %email, "register succeeded");
        Ok(RegisterOutput {
            id: account.id,
            full_name,
            username,
            email,
        })
    }
}
