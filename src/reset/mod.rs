/// Password reset
///
/// Two steps. `request_reset` emails a link carrying an encoded user id and a
/// signed token; the response never reveals whether the address is
/// registered. `confirm_reset` checks the pair and stores the new password,
/// which also invalidates every other link issued for the old one.
///
/// Unexpected failures are written to the error log here, with the request
/// path and method, and surface as [`InventoryError::ServerFault`] carrying a
/// fixed message.
pub mod token;

use crate::{
    account::AccountManager,
    error::{error_trace, InventoryError, InventoryResult},
    logs::{ErrorLogManager, RequestInfo},
    mailer::{MailSender, OutgoingEmail},
    metrics,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use token::{decode_uid, encode_uid, ResetTokenGenerator};
use validator::Validate;

pub const RESET_EMAIL_SENT: &str =
    "If this email is registered, you will receive instructions to reset your password.";
pub const RESET_SEND_FAILED: &str =
    "Error sending email, please contact the system administrator.";
pub const RESET_CONFIRMED: &str = "Password reset successfully.";
pub const RESET_CONFIRM_FAILED: &str =
    "Error confirming the password change, please contact the system administrator.";

const RESET_SUBJECT: &str = "Password recovery";

/// Body of `POST /auth/password/reset/`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(
        length(min = 1, message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    #[serde(default)]
    pub email: String,
}

/// Body of `POST /auth/password/reset/confirm/`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PasswordResetConfirm {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[serde(default)]
    pub uid: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[serde(default)]
    pub token: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password must be between 6 and 128 characters."
    ))]
    #[serde(default)]
    pub new_password: String,
}

/// What happened to a reset request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestOutcome {
    Sent,
    Suppressed,
}

pub struct PasswordResetFlow {
    accounts: Arc<AccountManager>,
    tokens: ResetTokenGenerator,
    mailer: Arc<dyn MailSender>,
    error_log: Arc<ErrorLogManager>,
    frontend_url: String,
    from_address: String,
}

impl PasswordResetFlow {
    pub fn new(
        accounts: Arc<AccountManager>,
        tokens: ResetTokenGenerator,
        mailer: Arc<dyn MailSender>,
        error_log: Arc<ErrorLogManager>,
        frontend_url: impl Into<String>,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            tokens,
            mailer,
            error_log,
            frontend_url: frontend_url.into().trim_end_matches('/').to_string(),
            from_address: from_address.into(),
        }
    }

    /// Send a reset link if the address belongs to a user.
    ///
    /// Returns the same message whether or not a user was found.
    pub async fn request_reset(
        &self,
        request: &RequestInfo,
        input: &PasswordResetRequest,
    ) -> InventoryResult<&'static str> {
        input.validate()?;

        match self.send_reset_link(&input.email).await {
            Ok(outcome) => {
                let label = match outcome {
                    RequestOutcome::Sent => "sent",
                    RequestOutcome::Suppressed => "suppressed",
                };
                metrics::record_password_reset("request", label);
                Ok(RESET_EMAIL_SENT)
            }
            Err(e) => {
                metrics::record_password_reset("request", "failed");
                Err(self.fault(request, e, RESET_SEND_FAILED).await)
            }
        }
    }

    /// Replace the password of the user named by `uid` if `token` is valid
    pub async fn confirm_reset(
        &self,
        request: &RequestInfo,
        input: &PasswordResetConfirm,
    ) -> InventoryResult<&'static str> {
        input.validate()?;

        match self.apply_reset(input).await {
            Ok(()) => {
                metrics::record_password_reset("confirm", "updated");
                Ok(RESET_CONFIRMED)
            }
            Err(e @ (InventoryError::InvalidToken | InventoryError::ExpiredOrInvalidToken)) => {
                tracing::debug!("Password reset rejected: {}", e);
                metrics::record_password_reset("confirm", "rejected");
                Err(e)
            }
            Err(e) => {
                metrics::record_password_reset("confirm", "failed");
                Err(self.fault(request, e, RESET_CONFIRM_FAILED).await)
            }
        }
    }

    async fn send_reset_link(&self, email: &str) -> InventoryResult<RequestOutcome> {
        let Some(user) = self.accounts.get_user_by_email(email).await? else {
            tracing::info!("Password reset requested for an unregistered email");
            return Ok(RequestOutcome::Suppressed);
        };

        let uid = encode_uid(user.id);
        let token = self.tokens.make_token(&user);
        let link = format!(
            "{}/reset-password?uid={}&token={}",
            self.frontend_url,
            urlencoding::encode(&uid),
            urlencoding::encode(&token)
        );

        let body = format!(
            r#"Hello {},

We received a request to reset the password for your account.

To choose a new password, open the link below:

{}

This link expires in {} and can only be used once.

If you did not request a password reset, you can ignore this email. Your password will remain unchanged.
"#,
            user.username,
            link,
            describe_duration(self.tokens.timeout_secs())
        );

        let email = OutgoingEmail {
            to: user.email.clone(),
            from: self.from_address.clone(),
            subject: RESET_SUBJECT.to_string(),
            body,
        };
        self.mailer.send(&email).await?;

        tracing::info!("Password reset email sent to user {}", user.id);
        Ok(RequestOutcome::Sent)
    }

    async fn apply_reset(&self, input: &PasswordResetConfirm) -> InventoryResult<()> {
        let user_id = decode_uid(&input.uid).ok_or(InventoryError::InvalidToken)?;
        let user = self
            .accounts
            .get_user(user_id)
            .await?
            .ok_or(InventoryError::InvalidToken)?;

        if !self.tokens.check_token(&user, &input.token) {
            return Err(InventoryError::ExpiredOrInvalidToken);
        }

        // A concurrent confirm with the same token may have won the race
        if !self.accounts.replace_password(&user, &input.new_password).await? {
            return Err(InventoryError::ExpiredOrInvalidToken);
        }

        tracing::info!("Password reset completed for user {}", user.id);
        Ok(())
    }

    /// Write `err` to the error log and replace it with `message`
    async fn fault(
        &self,
        request: &RequestInfo,
        err: InventoryError,
        message: &str,
    ) -> InventoryError {
        tracing::error!(
            method = %request.method,
            path = %request.path,
            "Password reset failed: {}",
            err
        );

        let trace = error_trace(&err);
        if let Err(log_err) = self
            .error_log
            .record(request, 500, &err.to_string(), Some(&trace))
            .await
        {
            tracing::error!("Failed to write error log: {}", log_err);
        }

        InventoryError::ServerFault(message.to_string())
    }
}

fn describe_duration(secs: i64) -> String {
    let (value, unit) = if secs % 86_400 == 0 {
        (secs / 86_400, "day")
    } else if secs % 3_600 == 0 {
        (secs / 3_600, "hour")
    } else if secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };

    if value == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", value, unit)
    }
}
