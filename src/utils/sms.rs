use anyhow::{Result, anyhow};
use chrono::NaiveTime;
use futures::future::BoxFuture;
use reqwest::Client;

use crate::config::Config;

/// Outbound SMS seam. The scan handler only sees this trait, so tests and
/// unconfigured deployments plug in [`NoopNotifier`].
pub trait Notifier: Send + Sync {
    fn send_sms(&self, to: String, body: String) -> BoxFuture<'static, Result<()>>;
}

/// Twilio-backed notifier. One shared reqwest client, form-encoded POST per
/// message, HTTP basic auth with the account credentials.
pub struct TwilioNotifier {
    client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioNotifier {
    /// Build from config; `None` when the Twilio credentials are not set.
    pub fn from_config(config: &Config) -> Option<Self> {
        let account_sid = config.twilio_account_sid.clone()?;
        let auth_token = config.twilio_auth_token.clone()?;
        let from_number = config.twilio_phone_number.clone()?;

        Some(Self {
            client: Client::new(),
            account_sid,
            auth_token,
            from_number,
        })
    }
}

impl Notifier for TwilioNotifier {
    fn send_sms(&self, to: String, body: String) -> BoxFuture<'static, Result<()>> {
        let client = self.client.clone();
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );
        let account_sid = self.account_sid.clone();
        let auth_token = self.auth_token.clone();
        let from_number = self.from_number.clone();

        Box::pin(async move {
            let response = client
                .post(&url)
                .basic_auth(&account_sid, Some(&auth_token))
                .form(&[("To", to.as_str()), ("From", from_number.as_str()), ("Body", body.as_str())])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(anyhow!("SMS provider returned {}", status));
            }

            tracing::info!(to = %to, "SMS sent");
            Ok(())
        })
    }
}

/// Used when no SMS provider is configured; records the skip and succeeds.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send_sms(&self, to: String, _body: String) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            tracing::warn!(to = %to, "SMS skipped: no provider configured");
            Ok(())
        })
    }
}

pub fn late_message(student_name: &str, time: NaiveTime) -> String {
    format!(
        "Dear Parent, {} arrived late to school at {}. Please ensure punctuality.",
        student_name,
        time.format("%H:%M")
    )
}

pub fn absent_message(student_name: &str) -> String {
    format!(
        "Dear Parent, {} was marked absent today. Please contact school for details.",
        student_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_message_carries_name_and_time() {
        let t = NaiveTime::from_hms_opt(9, 40, 12).unwrap();
        let msg = late_message("Asha", t);
        assert_eq!(
            msg,
            "Dear Parent, Asha arrived late to school at 09:40. Please ensure punctuality."
        );
    }

    #[test]
    fn absent_message_carries_name() {
        let msg = absent_message("Asha");
        assert!(msg.starts_with("Dear Parent, Asha was marked absent"));
    }

    #[test]
    fn noop_notifier_always_succeeds() {
        let notifier = NoopNotifier;
        let result = futures::executor::block_on(
            notifier.send_sms("+8801712345678".into(), "hello".into()),
        );
        assert!(result.is_ok());
    }
}
