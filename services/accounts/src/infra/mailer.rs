use anyhow::{Context as _, anyhow};
use serde::Serialize;

use crate::domain::repository::Mailer;

#[derive(Debug, Serialize)]
struct MailAddress<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailBody<'a> {
    sender: MailAddress<'a>,
    to: Vec<MailAddress<'a>>,
    subject: &'a str,
    html_content: &'a str,
    text_content: &'a str,
}

/// Transactional mail over a Brevo-style HTTP API.
///
/// Plain HTTP call with its own connection pool — never invoked while a
/// database transaction is open, so a slow provider cannot hold a lock.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    sender: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, sender: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            sender,
        }
    }
}

impl Mailer for HttpMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        text: &str,
    ) -> Result<(), anyhow::Error> {
        let body = SendMailBody {
            sender: MailAddress {
                email: &self.sender,
            },
            to: vec![MailAddress { email: to }],
            subject,
            html_content: html,
            text_content: text,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .context("send mail request")?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let detail = response.text().await.unwrap_or_default();
        Err(anyhow!("mail provider returned {status}: {detail}"))
    }
}
