use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{error, info};

use super::settings::SmtpAccount;

const SITE_NAME: &str = "Something More";

#[derive(Debug, Error)]
pub(crate) enum MailError {
    #[error("invalid mail address")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build mail message")]
    Build(#[from] lettre::error::Error),

    #[error("smtp delivery failed")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OutgoingMail {
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) html_body: String,
}

impl OutgoingMail {
    pub(crate) fn activation(to: &str, nickname: &str, link: &str) -> Self {
        let subject = format!("{SITE_NAME} account activation");
        let html_body = render(
            &subject,
            nickname,
            "Thanks for signing up. Confirm your address to activate the account:",
            link,
            "Activate account",
        );
        Self {
            to: to.to_string(),
            subject,
            html_body,
        }
    }

    pub(crate) fn password_reset(to: &str, nickname: &str, link: &str) -> Self {
        let subject = format!("{SITE_NAME} password reset");
        let html_body = render(
            &subject,
            nickname,
            "A password reset was requested for this account. Ignore this mail if it was not you.",
            link,
            "Choose a new password",
        );
        Self {
            to: to.to_string(),
            subject,
            html_body,
        }
    }
}

fn render(title: &str, nickname: &str, lead: &str, link: &str, action: &str) -> String {
    let nickname = html_escape::encode_text(nickname);
    let link = html_escape::encode_double_quoted_attribute(link);
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<p>Hello {nickname},</p>\n<p>{lead}</p>\n\
         <p><a href=\"{link}\">{action}</a></p>\n</body></html>\n"
    )
}

#[async_trait]
pub(crate) trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError>;
}

pub(crate) struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub(crate) fn new(account: &SmtpAccount) -> Result<Self, MailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&account.host)?
            .port(account.port)
            .credentials(Credentials::new(
                account.email.clone(),
                account.password.clone(),
            ))
            .build();

        Ok(Self {
            from: account.email.parse()?,
            transport,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse::<Mailbox>()?)
            .subject(mail.subject)
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body)?;

        self.transport.send(message).await?;
        Ok(())
    }
}

/// Used when no SMTP account is configured: mails only reach the log.
pub(crate) struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.html_body, "mail not sent: smtp is not configured");
        Ok(())
    }
}

pub(crate) fn build_mailer(account: Option<&SmtpAccount>) -> Result<Arc<dyn Mailer>, MailError> {
    match account {
        Some(account) => {
            info!(host = %account.host, port = account.port, "smtp mailer configured");
            Ok(Arc::new(SmtpMailer::new(account)?))
        }
        None => Ok(Arc::new(LogMailer)),
    }
}

/// Fire-and-forget delivery. The caller never waits on the send and a
/// failure only reaches the error log.
#[derive(Clone)]
pub(crate) struct MailDispatcher {
    mailer: Arc<dyn Mailer>,
}

impl MailDispatcher {
    pub(crate) fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    pub(crate) fn dispatch(&self, mail: OutgoingMail) -> tokio::task::JoinHandle<()> {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            let to = mail.to.clone();
            let subject = mail.subject.clone();
            if let Err(err) = mailer.send(mail).await {
                error!(%to, %subject, error = %err, "mail delivery failed");
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{MailError, Mailer, OutgoingMail};

    /// Records every mail it is asked to send.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingMailer {
        sent: Arc<Mutex<Vec<OutgoingMail>>>,
    }

    impl RecordingMailer {
        pub(crate) fn sent(&self) -> Vec<OutgoingMail> {
            self.sent.lock().expect("sent mutex poisoned").clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
            self.sent.lock().expect("sent mutex poisoned").push(mail);
            Ok(())
        }
    }

    /// Fails every delivery with an address error.
    pub(crate) struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
            Err(MailError::Address(
                "not an address".parse::<lettre::Address>().expect_err("must be invalid"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::{FailingMailer, RecordingMailer};
    use super::{MailDispatcher, OutgoingMail};

    #[test]
    fn activation_mail_escapes_nickname_and_carries_link() {
        let mail = OutgoingMail::activation(
            "writer@example.com",
            "<b>writer</b>",
            "http://localhost:8080/activate/abc",
        );

        assert_eq!(mail.to, "writer@example.com");
        assert!(mail.html_body.contains("&lt;b&gt;writer&lt;/b&gt;"));
        assert!(mail.html_body.contains("href=\"http://localhost:8080/activate/abc\""));
    }

    #[tokio::test]
    async fn dispatch_delivers_in_background() {
        let mailer = RecordingMailer::default();
        let dispatcher = MailDispatcher::new(Arc::new(mailer.clone()));

        dispatcher
            .dispatch(OutgoingMail::password_reset("a@example.com", "a", "http://x/reset"))
            .await
            .expect("task must not panic");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("password reset"));
    }

    #[tokio::test]
    async fn delivery_failure_is_contained() {
        let dispatcher = MailDispatcher::new(Arc::new(FailingMailer));
        let handle = dispatcher.dispatch(OutgoingMail::activation("a@example.com", "a", "http://x"));

        assert!(handle.await.is_ok());
    }
}
