use std::sync::Arc;

use tracing::{info, warn};

use super::password::{hash_password, password_stamp, verify_dummy, verify_password};
use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::id::ObjectId;
use crate::domain::user::{
    SignInRequest, SignUpRequest, User, normalize_email, validate_new_password,
};
use crate::infrastructure::jwt::{JwtService, TokenPurpose};
use crate::infrastructure::mailer::{MailDispatcher, OutgoingMail};

#[derive(Debug, Clone)]
pub(crate) struct AuthResult {
    pub(crate) user: User,
    pub(crate) access_token: String,
}

/// Where mailed links point and how long their tokens stay valid.
#[derive(Debug, Clone)]
pub(crate) struct LinkSettings {
    pub(crate) public_base_url: String,
    pub(crate) activation_ttl_seconds: i64,
    pub(crate) password_reset_ttl_seconds: i64,
}

pub(crate) struct AuthService<R: UserRepository> {
    repo: R,
    jwt: Arc<JwtService>,
    mail: MailDispatcher,
    links: LinkSettings,
}

impl<R: UserRepository> AuthService<R> {
    pub(crate) fn new(
        repo: R,
        jwt: Arc<JwtService>,
        mail: MailDispatcher,
        links: LinkSettings,
    ) -> Self {
        Self {
            repo,
            jwt,
            mail,
            links,
        }
    }

    /// Creates an inactive account and mails its activation link.
    pub(crate) async fn sign_up(&self, req: SignUpRequest) -> Result<User, DomainError> {
        let req = req.validate()?;
        let password_hash = hash_password(&req.password)?;

        let user = self
            .repo
            .create_user(NewUser {
                id: ObjectId::generate(),
                email: req.email,
                nickname: req.nickname,
                password_hash,
            })
            .await?;

        let token = self
            .jwt
            .generate_action_token(
                user.id,
                TokenPurpose::Activation,
                None,
                self.links.activation_ttl_seconds,
            )
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        let link = format!("{}/activate/{token}", self.links.public_base_url);
        self.mail
            .dispatch(OutgoingMail::activation(&user.email, &user.nickname, &link));

        info!(user_id = %user.id, "user signed up");
        Ok(user)
    }

    pub(crate) async fn sign_in(&self, req: SignInRequest) -> Result<AuthResult, DomainError> {
        let req = req.validate()?;

        let Some(creds) = self.repo.find_by_email(&req.email).await? else {
            verify_dummy(&req.password)?;
            return Err(DomainError::InvalidCredentials);
        };

        verify_password(&req.password, &creds.password_hash)?;
        if !creds.user.is_active {
            return Err(DomainError::InactiveAccount);
        }

        let access_token = self
            .jwt
            .generate_token(&creds.user)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;

        Ok(AuthResult {
            user: creds.user,
            access_token,
        })
    }

    /// Activating an already active account is a no-op.
    pub(crate) async fn activate(&self, token: &str) -> Result<User, DomainError> {
        let claims = self
            .jwt
            .verify_action_token(token, TokenPurpose::Activation)
            .map_err(|_| DomainError::Unauthorized("invalid or expired activation token"))?;

        let user = self
            .repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| DomainError::not_found("user"))?;
        if user.is_active {
            return Ok(user);
        }

        if !self.repo.activate(user.id).await? {
            return Err(DomainError::not_found("user"));
        }
        info!(user_id = %user.id, "account activated");

        Ok(User {
            is_active: true,
            ..user
        })
    }

    /// Silent for unknown addresses so the endpoint cannot be used to probe
    /// for accounts.
    pub(crate) async fn request_password_reset(&self, email: &str) -> Result<(), DomainError> {
        let Ok(email) = normalize_email(email) else {
            return Ok(());
        };
        let Some(creds) = self.repo.find_by_email(&email).await? else {
            info!("password reset requested for unknown address");
            return Ok(());
        };

        let token = self
            .jwt
            .generate_action_token(
                creds.user.id,
                TokenPurpose::PasswordReset,
                Some(password_stamp(&creds.password_hash)),
                self.links.password_reset_ttl_seconds,
            )
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        let link = format!("{}/password-reset?token={token}", self.links.public_base_url);
        self.mail.dispatch(OutgoingMail::password_reset(
            &creds.user.email,
            &creds.user.nickname,
            &link,
        ));

        info!(user_id = %creds.user.id, "password reset mail queued");
        Ok(())
    }

    pub(crate) async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        const REJECTED: DomainError = DomainError::Unauthorized("invalid or expired reset token");

        validate_new_password(new_password)?;
        let claims = self
            .jwt
            .verify_action_token(token, TokenPurpose::PasswordReset)
            .map_err(|_| REJECTED)?;

        let creds = self
            .repo
            .find_credentials_by_id(claims.sub)
            .await?
            .ok_or(REJECTED)?;
        if claims.stamp.as_deref() != Some(password_stamp(&creds.password_hash).as_str()) {
            warn!(user_id = %creds.user.id, "stale password reset token");
            return Err(REJECTED);
        }

        let password_hash = hash_password(new_password)?;
        if !self.repo.update_password(creds.user.id, &password_hash).await? {
            return Err(DomainError::not_found("user"));
        }

        info!(user_id = %creds.user.id, "password reset");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{AuthService, LinkSettings};
    use crate::data::repositories::memory::InMemoryUserRepo;
    use crate::domain::error::DomainError;
    use crate::domain::identity::Identity;
    use crate::domain::user::{SignInRequest, SignUpRequest};
    use crate::infrastructure::jwt::JwtService;
    use crate::infrastructure::mailer::MailDispatcher;
    use crate::infrastructure::mailer::testing::RecordingMailer;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const BASE_URL: &str = "http://stmore.test";

    struct Harness {
        repo: InMemoryUserRepo,
        mailer: RecordingMailer,
        jwt: Arc<JwtService>,
        service: AuthService<InMemoryUserRepo>,
    }

    fn harness() -> Harness {
        let repo = InMemoryUserRepo::default();
        let mailer = RecordingMailer::default();
        let jwt = Arc::new(JwtService::new(SECRET, 3600));
        let service = AuthService::new(
            repo.clone(),
            Arc::clone(&jwt),
            MailDispatcher::new(Arc::new(mailer.clone())),
            LinkSettings {
                public_base_url: BASE_URL.to_string(),
                activation_ttl_seconds: 3600,
                password_reset_ttl_seconds: 600,
            },
        );
        Harness {
            repo,
            mailer,
            jwt,
            service,
        }
    }

    fn sign_up_req(email: &str, nickname: &str) -> SignUpRequest {
        SignUpRequest {
            email: email.to_string(),
            nickname: nickname.to_string(),
            password: "very-secure-password".to_string(),
        }
    }

    fn sign_in_req(email: &str, password: &str) -> SignInRequest {
        SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    /// Lets the detached mail task run, then pulls the token out of the
    /// link in the `index`-th mail.
    async fn mailed_token(mailer: &RecordingMailer, index: usize, marker: &str) -> String {
        for _ in 0..100 {
            if mailer.sent().len() > index {
                break;
            }
            tokio::task::yield_now().await;
        }
        let sent = mailer.sent();
        let body = &sent.get(index).expect("mail must be sent").html_body;
        let start = body.find(marker).expect("link must be present") + marker.len();
        let rest = &body[start..];
        rest[..rest.find('"').expect("link must be quoted")].to_string()
    }

    #[tokio::test]
    async fn sign_up_creates_inactive_user_and_mails_activation_link() {
        let h = harness();

        let user = h
            .service
            .sign_up(sign_up_req("  Writer@Example.com ", " writer "))
            .await
            .expect("sign up must succeed");

        assert_eq!(user.email, "writer@example.com");
        assert_eq!(user.nickname, "writer");
        assert!(!user.is_active);

        let stored = h.repo.get(user.id).expect("user must be stored");
        assert!(stored.password_hash.starts_with("$argon2id$"));

        let token = mailed_token(&h.mailer, 0, "/activate/").await;
        assert!(!token.is_empty());
        assert_eq!(h.mailer.sent()[0].to, "writer@example.com");
    }

    #[tokio::test]
    async fn duplicate_email_or_nickname_conflicts() {
        let h = harness();
        h.service
            .sign_up(sign_up_req("writer@example.com", "writer"))
            .await
            .expect("first sign up must succeed");

        let err = h
            .service
            .sign_up(sign_up_req("writer@example.com", "other"))
            .await
            .expect_err("email is taken");
        assert!(matches!(err, DomainError::AlreadyExists(ref what) if what == "email"));

        let err = h
            .service
            .sign_up(sign_up_req("other@example.com", "writer"))
            .await
            .expect_err("nickname is taken");
        assert!(matches!(err, DomainError::AlreadyExists(ref what) if what == "nickname"));
    }

    #[tokio::test]
    async fn inactive_account_cannot_sign_in_until_activated() {
        let h = harness();
        h.service
            .sign_up(sign_up_req("writer@example.com", "writer"))
            .await
            .expect("sign up must succeed");

        let err = h
            .service
            .sign_in(sign_in_req("writer@example.com", "very-secure-password"))
            .await
            .expect_err("inactive account");
        assert!(matches!(err, DomainError::InactiveAccount));

        let token = mailed_token(&h.mailer, 0, "/activate/").await;
        let activated = h.service.activate(&token).await.expect("must activate");
        assert!(activated.is_active);

        let result = h
            .service
            .sign_in(sign_in_req("WRITER@example.com", "very-secure-password"))
            .await
            .expect("sign in must succeed");
        let identity = Identity::from(h.jwt.verify_token(&result.access_token).expect("valid"));
        assert_eq!(identity, Identity::from(&result.user));
        assert!(identity.is_active);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_invalid_credentials() {
        let h = harness();
        h.service
            .sign_up(sign_up_req("writer@example.com", "writer"))
            .await
            .expect("sign up must succeed");

        let err = h
            .service
            .sign_in(sign_in_req("writer@example.com", "wrong-password"))
            .await
            .expect_err("wrong password");
        assert!(matches!(err, DomainError::InvalidCredentials));

        let err = h
            .service
            .sign_in(sign_in_req("nobody@example.com", "whatever-password"))
            .await
            .expect_err("unknown email");
        assert!(matches!(err, DomainError::InvalidCredentials));
    }

    #[tokio::test]
    async fn garbage_activation_token_is_rejected() {
        let h = harness();
        let err = h
            .service
            .activate("not-a-token")
            .await
            .expect_err("garbage token");
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn password_reset_token_works_once() {
        let h = harness();
        let user = h
            .service
            .sign_up(sign_up_req("writer@example.com", "writer"))
            .await
            .expect("sign up must succeed");
        let activation = mailed_token(&h.mailer, 0, "/activate/").await;
        h.service.activate(&activation).await.expect("must activate");

        h.service
            .request_password_reset(" Writer@example.com ")
            .await
            .expect("request must succeed");
        let token = mailed_token(&h.mailer, 1, "?token=").await;

        h.service
            .reset_password(&token, "brand-new-password")
            .await
            .expect("reset must succeed");
        h.service
            .sign_in(sign_in_req("writer@example.com", "brand-new-password"))
            .await
            .expect("new password must work");

        let err = h
            .service
            .reset_password(&token, "another-new-password")
            .await
            .expect_err("token is bound to the old hash");
        assert!(matches!(err, DomainError::Unauthorized(_)));
        assert!(h.repo.get(user.id).is_some());
    }

    #[tokio::test]
    async fn activation_token_cannot_reset_password() {
        let h = harness();
        h.service
            .sign_up(sign_up_req("writer@example.com", "writer"))
            .await
            .expect("sign up must succeed");
        let activation = mailed_token(&h.mailer, 0, "/activate/").await;

        let err = h
            .service
            .reset_password(&activation, "brand-new-password")
            .await
            .expect_err("wrong purpose");
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn reset_request_for_unknown_email_is_silent() {
        let h = harness();
        h.service
            .request_password_reset("nobody@example.com")
            .await
            .expect("must not reveal anything");
        h.service
            .request_password_reset("not an email")
            .await
            .expect("must not reveal anything");

        tokio::task::yield_now().await;
        assert!(h.mailer.sent().is_empty());
    }
}
