pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod handlers;
pub mod infra;
pub mod limiter;
pub mod password;
pub mod router;
pub mod state;
pub mod usecase;
