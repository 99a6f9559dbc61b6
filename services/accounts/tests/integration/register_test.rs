use chrono::{Duration, Utc};

use unilink_accounts::error::AccountServiceError;
use unilink_accounts::password::verify_password;
use unilink_accounts::usecase::register::{RegisterInput, RegisterUseCase};
use unilink_domain::account::AccountStatus;

use crate::helpers::{MockAccountRepo, test_account, verified_code_with_ticket};

const TICKET: &str = "9876543210";

fn register_input(email: &str, username: &str) -> RegisterInput {
    RegisterInput {
        full_name: "Alice Doe".to_owned(),
        username: username.to_owned(),
        email: email.to_owned(),
        password: "hunter2hunter2".to_owned(),
        ticket: TICKET.to_owned(),
        gender: Some("female".to_owned()),
        student_no: Some("S-2044".to_owned()),
        employee_no: None,
    }
}

fn repo_with_ticket(email: &str) -> MockAccountRepo {
    let repo = MockAccountRepo::empty();
    repo.codes
        .lock()
        .unwrap()
        .push(verified_code_with_ticket(email, TICKET));
    repo
}

#[tokio::test]
async fn should_create_account_and_spend_ticket() {
    let repo = repo_with_ticket("student@example.edu");
    let accounts = repo.accounts_handle();
    let codes = std::sync::Arc::clone(&repo.codes);

    let out = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await
        .unwrap();

    assert_eq!(out.email, "student@example.edu");
    assert_eq!(out.username, "alice");

    let stored = accounts.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, AccountStatus::Active);
    assert_eq!(stored[0].session_epoch, 0);
    assert!(verify_password("hunter2hunter2", &stored[0].password_hash).unwrap());
    assert!(codes.lock().unwrap()[0].ticket_consumed_at.is_some());
}

#[tokio::test]
async fn should_reject_malformed_ticket_before_any_lookup() {
    let uc = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
    };
    for bad in ["", "12345", "123456789a", "12345678901"] {
        let mut input = register_input("student@example.edu", "alice");
        input.ticket = bad.to_owned();
        let result = uc.execute(input).await;
        assert!(
            matches!(result, Err(AccountServiceError::TicketInvalid)),
            "ticket {bad:?} should be invalid, got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_reject_ticket_issued_for_another_email() {
    let repo = repo_with_ticket("someone.else@example.edu");

    let result = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await;
    assert!(matches!(result, Err(AccountServiceError::TicketInvalid)));
}

#[tokio::test]
async fn should_reject_already_consumed_ticket() {
    let repo = MockAccountRepo::empty();
    let mut code = verified_code_with_ticket("student@example.edu", TICKET);
    code.ticket_consumed_at = Some(Utc::now());
    repo.codes.lock().unwrap().push(code);

    let result = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await;
    assert!(matches!(result, Err(AccountServiceError::TicketUsed)));
}

#[tokio::test]
async fn should_reject_expired_ticket_even_with_matching_digest() {
    let repo = MockAccountRepo::empty();
    let mut code = verified_code_with_ticket("student@example.edu", TICKET);
    code.ticket_expires_at = Some(Utc::now() - Duration::seconds(1));
    repo.codes.lock().unwrap().push(code);

    let result = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await;
    assert!(matches!(result, Err(AccountServiceError::TicketExpired)));
}

#[tokio::test]
async fn should_reject_ticket_on_record_never_verified() {
    let repo = MockAccountRepo::empty();
    let mut code = verified_code_with_ticket("student@example.edu", TICKET);
    code.consumed = false;
    code.verified_at = None;
    repo.codes.lock().unwrap().push(code);

    let result = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await;
    assert!(matches!(result, Err(AccountServiceError::TicketInvalid)));
}

#[tokio::test]
async fn should_reject_taken_username() {
    let repo = repo_with_ticket("student@example.edu");
    repo.accounts
        .lock()
        .unwrap()
        .push(test_account("other@example.edu", "alice"));

    let result = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await;
    assert!(matches!(result, Err(AccountServiceError::UsernameTaken)));
}

#[tokio::test]
async fn should_reject_taken_student_number() {
    let repo = repo_with_ticket("student@example.edu");
    let mut existing = test_account("other@example.edu", "bob");
    existing.student_no = Some("S-2044".to_owned());
    repo.accounts.lock().unwrap().push(existing);

    let result = RegisterUseCase { accounts: repo }
        .execute(register_input("student@example.edu", "alice"))
        .await;
    assert!(matches!(result, Err(AccountServiceError::StudentNoTaken)));
}

#[tokio::test]
async fn should_reject_invalid_username_and_gender() {
    let uc = RegisterUseCase {
        accounts: MockAccountRepo::empty(),
    };

    let mut input = register_input("student@example.edu", "a b");
    let result = uc.execute(input).await;
    assert!(matches!(result, Err(AccountServiceError::InvalidUsername)));

    input = register_input("student@example.edu", "alice");
    input.gender = Some("attack helicopter".to_owned());
    let result = uc.execute(input).await;
    assert!(matches!(result, Err(AccountServiceError::InvalidGender)));
}

/// The exactly-once property: many racing registrations holding the same
/// valid ticket produce one account; every loser sees a conflict error.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn should_consume_ticket_exactly_once_under_concurrency() {
    let repo = repo_with_ticket("student@example.edu");
    let accounts = repo.accounts_handle();

    let mut tasks = vec![];
    for i in 0..8 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move {
            RegisterUseCase { accounts: repo }
                .execute(register_input("student@example.edu", &format!("alice{i}")))
                .await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            // Losers race either the guarded consume or the availability check.
            Err(AccountServiceError::TicketUsed)
            | Err(AccountServiceError::AlreadyRegistered)
            | Err(AccountServiceError::StudentNoTaken) => {}
            Err(other) => panic!("unexpected loser error: {other:?}"),
        }
    }

    assert_eq!(successes, 1, "exactly one registration may win the ticket");
    assert_eq!(accounts.lock().unwrap().len(), 1);
}
