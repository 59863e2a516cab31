//! Telegram Bot API delivery: [`Notifier`] trait and [`TelegramNotifier`].

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use tplwatch_core::types::{Config, Repository, TelegramCredentials};

use crate::error::NotifyError;
use crate::render::MessageRenderer;

/// Outbound notification seam used by the per-repository pipeline.
pub trait Notifier: Send + Sync {
    /// Announce `items` as new templates in `repo`.
    ///
    /// Returns the number of messages delivered.
    fn new_templates(&self, repo: &Repository, items: &[String]) -> Result<usize, NotifyError>;

    /// Acknowledge that `count` templates were recorded as the first baseline.
    fn baseline_recorded(&self, repo: &Repository, count: usize) -> Result<(), NotifyError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Delivers messages through `sendMessage` with HTML parse mode.
pub struct TelegramNotifier {
    agent: ureq::Agent,
    endpoint: String,
    bot_token: String,
    chat_id: String,
    renderer: MessageRenderer,
    message_limit: usize,
}

impl TelegramNotifier {
    pub fn new(
        credentials: &TelegramCredentials,
        timeout: Duration,
        message_limit: usize,
        renderer: MessageRenderer,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let endpoint = format!(
            "{}/bot{}/sendMessage",
            credentials.api_base.trim_end_matches('/'),
            credentials.bot_token
        );
        Self {
            agent,
            endpoint,
            bot_token: credentials.bot_token.clone(),
            chat_id: credentials.chat_id.clone(),
            renderer,
            message_limit,
        }
    }

    /// Build from the resolved process configuration.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let renderer = MessageRenderer::with_overrides(config.templates_dir.as_deref())?;
        Ok(Self::new(
            &config.telegram,
            config.http_timeout,
            config.message_limit,
            renderer,
        ))
    }

    /// POST one pre-rendered message.
    pub fn send_text(&self, text: &str) -> Result<(), NotifyError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = match self.agent.post(&self.endpoint).send_json(payload) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let description = response
                    .into_json::<ApiResponse>()
                    .ok()
                    .and_then(|body| body.description)
                    .unwrap_or_else(|| "no description".to_string());
                return Err(NotifyError::Status {
                    status,
                    description,
                });
            }
            Err(err) => return Err(NotifyError::Transport(self.redact(&err.to_string()))),
        };

        let body: ApiResponse = response
            .into_json()
            .map_err(|e| NotifyError::Transport(format!("invalid response body: {e}")))?;
        if !body.ok {
            return Err(NotifyError::Rejected(
                body.description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }
        Ok(())
    }

    // Transport errors quote the request URL, which embeds the bot token.
    fn redact(&self, message: &str) -> String {
        if self.bot_token.is_empty() {
            return message.to_string();
        }
        message.replace(&self.bot_token, "<redacted>")
    }
}

impl Notifier for TelegramNotifier {
    fn new_templates(&self, repo: &Repository, items: &[String]) -> Result<usize, NotifyError> {
        let batches = self
            .renderer
            .render_batches(repo, items, self.message_limit)?;
        let total = batches.len();
        for (index, text) in batches.iter().enumerate() {
            if let Err(err) = self.send_text(text) {
                return Err(NotifyError::Batch {
                    index: index + 1,
                    total,
                    sent: index,
                    source: Box::new(err),
                });
            }
            tracing::debug!(repo = %repo.name, "delivered message {}/{}", index + 1, total);
        }
        tracing::info!(repo = %repo.name, "notification sent ({total} message(s))");
        Ok(total)
    }

    fn baseline_recorded(&self, repo: &Repository, count: usize) -> Result<(), NotifyError> {
        let text = self.renderer.baseline(repo, count)?;
        self.send_text(&text)
    }
}
