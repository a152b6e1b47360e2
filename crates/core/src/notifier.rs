//! Outbound account notifications.

use crate::config::CoreConfig;
use crate::{TrackerError, TrackerResult};
use medtrack_types::eq_ignore_case;
use serde::Serialize;
use std::sync::{Arc, Mutex};

pub trait Notifier: Send + Sync {
    /// Welcome a newly onboarded doctor with a one-time activation link.
    fn send_activation(&self, email: &str, hospital_name: &str, token: &str) -> TrackerResult<()>;

    fn send_password_reset_code(&self, email: &str, code: &str) -> TrackerResult<()>;
}

/// A notification that would have been delivered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    Activation {
        email: String,
        hospital_name: String,
        token: String,
        link: String,
    },
    PasswordReset { email: String, code: String },
}

/// Writes notifications to the tracing log.
pub struct LogNotifier {
    cfg: Arc<CoreConfig>,
}

impl LogNotifier {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }
}

impl Notifier for LogNotifier {
    fn send_activation(&self, email: &str, hospital_name: &str, token: &str) -> TrackerResult<()> {
        tracing::info!(
            to = email,
            hospital = hospital_name,
            link = %self.cfg.activation_link(token),
            "doctor account created"
        );
        Ok(())
    }

    fn send_password_reset_code(&self, email: &str, code: &str) -> TrackerResult<()> {
        tracing::info!(to = email, code, "password reset code issued");
        Ok(())
    }
}

/// Keeps notifications in memory.
pub struct OutboxNotifier {
    cfg: Arc<CoreConfig>,
    sent: Mutex<Vec<Notification>>,
}

impl OutboxNotifier {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self {
            cfg,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Everything sent so far, oldest first.
    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// Most recent activation token sent to `email`.
    pub fn activation_token_for(&self, email: &str) -> Option<String> {
        self.sent().into_iter().rev().find_map(|n| match n {
            Notification::Activation { email: to, token, .. } if eq_ignore_case(&to, email) => {
                Some(token)
            }
            _ => None,
        })
    }

    /// Most recent reset code sent to `email`.
    pub fn reset_code_for(&self, email: &str) -> Option<String> {
        self.sent().into_iter().rev().find_map(|n| match n {
            Notification::PasswordReset { email: to, code } if eq_ignore_case(&to, email) => {
                Some(code)
            }
            _ => None,
        })
    }

    fn push(&self, notification: Notification) -> TrackerResult<()> {
        self.sent
            .lock()
            .map_err(|_| TrackerError::Notification("outbox lock poisoned".into()))?
            .push(notification);
        Ok(())
    }
}

impl Notifier for OutboxNotifier {
    fn send_activation(&self, email: &str, hospital_name: &str, token: &str) -> TrackerResult<()> {
        self.push(Notification::Activation {
            email: email.to_string(),
            hospital_name: hospital_name.to_string(),
            token: token.to_string(),
            link: self.cfg.activation_link(token),
        })
    }

    fn send_password_reset_code(&self, email: &str, code: &str) -> TrackerResult<()> {
        self.push(Notification::PasswordReset {
            email: email.to_string(),
            code: code.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outbox_records_activation_link() {
        let outbox = OutboxNotifier::new(Arc::new(CoreConfig::default()));
        outbox
            .send_activation("dr@example.org", "General", "tok123")
            .unwrap();

        let sent = outbox.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Notification::Activation { link, .. } => {
                assert_eq!(link, "http://localhost:5173/set-password?token=tok123");
            }
            other => panic!("unexpected notification {other:?}"),
        }
        assert_eq!(
            outbox.activation_token_for("DR@example.org").as_deref(),
            Some("tok123")
        );
    }

    #[test]
    fn test_outbox_latest_reset_code_wins() {
        let outbox = OutboxNotifier::new(Arc::new(CoreConfig::default()));
        outbox.send_password_reset_code("a@example.org", "111111").unwrap();
        outbox.send_password_reset_code("a@example.org", "222222").unwrap();
        assert_eq!(outbox.reset_code_for("a@example.org").as_deref(), Some("222222"));
        assert_eq!(outbox.reset_code_for("b@example.org"), None);
    }
}
