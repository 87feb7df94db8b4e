//! Email service for campaign invite notifications.
//!
//! Supports multiple email providers:
//! - `console`: Logs emails (development)
//! - `resend`: Uses the Resend API
//! - `sendgrid`: Uses the SendGrid API

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use domain::models::InviteRole;
use domain::services::{InviteEmail, InviteNotifier, NotificationResult};

use crate::config::EmailConfig;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
    pub body_html: String,
}

/// Sends transactional email through the configured provider.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: Client,
}

impl EmailService {
    /// Creates a new EmailService; provider calls are bounded by `timeout_ms`.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn sender(&self) -> String {
        format!("{} <{}>", self.config.sender_name, self.config.sender_email)
    }

    /// Send an email message.
    pub async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "resend" => self.send_resend(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    fn send_console(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.sender(),
            "Email (console provider)"
        );
        info!(body_text = %message.body_text, "Email body (plain text)");
        debug!(body_html_length = message.body_html.len(), "Email body (HTML)");
        Ok(())
    }

    async fn send_resend(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.resend_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = json!({
            "from": self.sender(),
            "to": [message.to],
            "subject": message.subject,
            "text": message.body_text,
            "html": message.body_html,
        });

        let response = self
            .client
            .post(RESEND_ENDPOINT)
            .bearer_auth(&self.config.resend_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("Resend request failed: {}", e)))?;

        Self::check_response("Resend", response).await?;
        info!(to = %message.to, "Email sent via Resend");
        Ok(())
    }

    async fn send_sendgrid(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let body = json!({
            "personalizations": [{ "to": [{ "email": message.to }] }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [
                { "type": "text/plain", "value": message.body_text },
                { "type": "text/html", "value": message.body_html }
            ]
        });

        let response = self
            .client
            .post(SENDGRID_ENDPOINT)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        Self::check_response("SendGrid", response).await?;
        info!(to = %message.to, "Email sent via SendGrid");
        Ok(())
    }

    async fn check_response(provider: &str, response: reqwest::Response) -> Result<(), EmailError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let error_body = response.text().await.unwrap_or_default();
        error!(provider, status = %status, error = %error_body, "Email provider error");
        Err(EmailError::ProviderError(format!(
            "{} returned {}",
            provider, status
        )))
    }
}

#[async_trait]
impl InviteNotifier for EmailService {
    async fn send_invite(&self, email: &InviteEmail) -> NotificationResult {
        if !self.is_enabled() {
            debug!(to = %email.recipient, "Email disabled, invite link must be shared manually");
            return NotificationResult::Skipped;
        }

        match self.send(&render_invite(email)).await {
            Ok(()) => NotificationResult::Sent,
            Err(e) => NotificationResult::Failed(e.to_string()),
        }
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn role_blurb(role: InviteRole) -> &'static str {
    match role {
        InviteRole::Contributor => {
            "As a contributor you can edit campaign content, including items, players and transactions, and invite others."
        }
        InviteRole::Viewer => "As a viewer you can follow the campaign's loot and treasury.",
    }
}

/// Builds the invite email: an HTML call-to-action plus a plaintext copy of the link.
pub fn render_invite(email: &InviteEmail) -> EmailMessage {
    let subject = format!("You're invited to join \"{}\"!", email.campaign_name);
    let role = email.role.display_label();
    let expires = email.expires_at.format("%B %-d, %Y");

    let body_text = format!(
        r#"{inviter} has invited you to join their campaign "{campaign}" as a {role}.

{blurb}

Accept the invitation here:
{link}

This invitation expires in 7 days ({expires}). If you didn't expect it, you can ignore this email.

D20 Loot Tracker"#,
        inviter = email.inviter_name,
        campaign = email.campaign_name,
        role = role,
        blurb = role_blurb(email.role),
        link = email.link,
        expires = expires,
    );

    let body_html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Campaign invitation</title>
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #0f172a 0%, #312e81 100%); padding: 30px; text-align: center; border-radius: 8px 8px 0 0;">
        <h1 style="color: #22d3ee; margin: 0; font-size: 26px;">D20 Loot Tracker</h1>
    </div>
    <div style="background: #ffffff; padding: 36px 30px; border: 1px solid #e2e8f0; border-top: none;">
        <h2 style="color: #1e293b; margin-top: 0;">You've been invited!</h2>
        <p><strong>{inviter}</strong> has invited you to join their campaign:</p>
        <div style="background: #f8fafc; border-left: 4px solid #22d3ee; padding: 15px 20px; margin: 20px 0;">
            <p style="margin: 0; font-size: 18px; font-weight: 600;">{campaign}</p>
            <p style="margin: 5px 0 0 0; color: #64748b; font-size: 14px;">Role: {role}</p>
        </div>
        <p style="color: #475569;">{blurb}</p>
        <div style="text-align: center; margin: 30px 0;">
            <a href="{link}" style="display: inline-block; background: #06b6d4; color: #ffffff; text-decoration: none; padding: 14px 32px; border-radius: 6px; font-weight: 600;">Accept Invitation</a>
        </div>
        <p style="color: #64748b; font-size: 14px;">Or copy and paste this link into your browser:</p>
        <div style="background: #f1f5f9; padding: 12px; border-radius: 4px; word-break: break-all; font-size: 13px; font-family: monospace;">{link}</div>
        <p style="color: #94a3b8; font-size: 12px; margin-top: 30px; padding-top: 20px; border-top: 1px solid #e2e8f0;">This invitation expires in 7 days ({expires}). If you didn't expect this invitation, you can safely ignore this email.</p>
    </div>
</body>
</html>"#,
        inviter = escape_html(&email.inviter_name),
        campaign = escape_html(&email.campaign_name),
        role = role,
        blurb = role_blurb(email.role),
        link = escape_html(&email.link),
        expires = expires,
    );

    EmailMessage {
        to: email.recipient.clone(),
        subject,
        body_text,
        body_html,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sender_email: "invites@example.com".to_string(),
            sender_name: "Test".to_string(),
            ..EmailConfig::default()
        }
    }

    fn invite_email() -> InviteEmail {
        InviteEmail {
            recipient: "bob@example.com".to_string(),
            inviter_name: "alice@example.com".to_string(),
            campaign_name: "Curse of <Strahd>".to_string(),
            role: InviteRole::Contributor,
            link: "http://localhost:5173?invite=abc123".to_string(),
            expires_at: Utc::now() + ChronoDuration::days(7),
        }
    }

    #[test]
    fn test_render_invite_contains_link_and_expiry() {
        let message = render_invite(&invite_email());
        assert_eq!(message.to, "bob@example.com");
        assert!(message.subject.contains("Curse of <Strahd>"));
        assert!(message.body_text.contains("http://localhost:5173?invite=abc123"));
        assert!(message.body_text.contains("7 days"));
        assert!(message.body_html.contains("Accept Invitation"));
        assert!(message.body_html.contains("7 days"));
    }

    #[test]
    fn test_render_invite_escapes_html() {
        let message = render_invite(&invite_email());
        assert!(message.body_html.contains("Curse of &lt;Strahd&gt;"));
        assert!(!message.body_html.contains("<Strahd>"));
    }

    #[test]
    fn test_viewer_wording() {
        let mut email = invite_email();
        email.role = InviteRole::Viewer;
        let message = render_invite(&email);
        assert!(message.body_text.contains("as a Viewer"));
    }

    #[tokio::test]
    async fn test_console_provider_sends() {
        let service = EmailService::new(test_config()).unwrap();
        assert_eq!(
            service.send_invite(&invite_email()).await,
            NotificationResult::Sent
        );
    }

    #[tokio::test]
    async fn test_disabled_is_skipped() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config).unwrap();
        assert!(!service.is_enabled());
        assert_eq!(
            service.send_invite(&invite_email()).await,
            NotificationResult::Skipped
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_reports_failure() {
        let mut config = test_config();
        config.provider = "resend".to_string();
        let service = EmailService::new(config).unwrap();
        assert!(matches!(
            service.send_invite(&invite_email()).await,
            NotificationResult::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider_reports_failure() {
        let mut config = test_config();
        config.provider = "carrier-pigeon".to_string();
        let service = EmailService::new(config).unwrap();
        assert!(matches!(
            service.send_invite(&invite_email()).await,
            NotificationResult::Failed(_)
        ));
    }
}
