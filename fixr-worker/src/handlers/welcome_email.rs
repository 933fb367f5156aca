/// `email:welcome`: greets a newly registered user

use async_trait::async_trait;
use fixr_shared::jobs::{TaskMessage, WelcomeEmailPayload, TASK_WELCOME_EMAIL};

use super::{HandlerResult, TaskHandler};
use crate::email::{EmailClient, EmailMessage};

pub struct WelcomeEmailHandler {
    email: EmailClient,
}

impl WelcomeEmailHandler {
    pub fn new(email: EmailClient) -> Self {
        Self { email }
    }
}

#[async_trait]
impl TaskHandler for WelcomeEmailHandler {
    fn task_type(&self) -> &str {
        TASK_WELCOME_EMAIL
    }

    async fn handle(&self, task: &TaskMessage) -> HandlerResult<()> {
        let payload: WelcomeEmailPayload = task.decode_payload()?;

        tracing::info!(task_id = %task.id, to = %payload.to, "Sending welcome email");
        self.email.send(&render(&payload)).await?;
        Ok(())
    }
}

/// Builds the welcome message for `payload`
pub fn render(payload: &WelcomeEmailPayload) -> EmailMessage {
    let name = payload.first_name.trim();
    let greeting = if name.is_empty() {
        "Welcome to Fixr!".to_string()
    } else {
        format!("Welcome to Fixr, {}!", name)
    };

    EmailMessage {
        to: payload.to.clone(),
        subject: greeting.clone(),
        html: format!(
            "<h1>{}</h1><p>Your account is ready. Start by adding the services you offer \
             and grouping them into categories.</p>",
            escape_html(&greeting)
        ),
        text: format!(
            "{}\n\nYour account is ready. Start by adding the services you offer and \
             grouping them into categories.",
            greeting
        ),
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
