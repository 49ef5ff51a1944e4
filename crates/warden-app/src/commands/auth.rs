use tokio_util::sync::CancellationToken;
use tracing::info;
use warden_common::WardenError;
use warden_vrchat::session::bounded;
use warden_vrchat::{AuthOutcome, AuthStatus, TwoFactorMethod};

use super::prompt;
use crate::services::Services;

const MAX_CODE_ATTEMPTS: usize = 5;

pub async fn login(
    services: &Services,
    username: &str,
    password: Option<String>,
    cancel: &CancellationToken,
) -> Result<(), WardenError> {
    let password = match password.or_else(|| std::env::var("WARDEN_PASSWORD").ok()) {
        Some(p) => p,
        None => prompt("Password: ").await?,
    };
    let timeout = services.config.session.login_timeout();

    let mut outcome = bounded(
        timeout,
        cancel,
        services.session.login(username, &password, cancel),
    )
    .await;

    let mut attempts = 0;
    while outcome.status == AuthStatus::RequiresTwoFactor && attempts < MAX_CODE_ATTEMPTS {
        attempts += 1;
        if let Some(message) = &outcome.error_message {
            println!("{message}");
        }
        let method = preferred_method(&outcome);
        let code = prompt(&format!("{method} code: ")).await?;
        outcome = bounded(
            timeout,
            cancel,
            services.session.submit_two_factor(method, &code, cancel),
        )
        .await;
    }

    finish(services, outcome).await
}

async fn finish(services: &Services, outcome: AuthOutcome) -> Result<(), WardenError> {
    match outcome.status {
        AuthStatus::Success => {
            if let Some(user) = services.session.current_user().await {
                info!(user = %user.user_id, "logged in");
                println!("Logged in as {} ({}).", user.display_name, user.user_id);
            }
            Ok(())
        }
        AuthStatus::RequiresTwoFactor => Err(WardenError::Other(
            "Too many verification attempts.".into(),
        )),
        AuthStatus::Failed => Err(WardenError::Other(
            outcome
                .error_message
                .unwrap_or_else(|| "Login failed.".into()),
        )),
    }
}

/// Authenticator codes first, then email, then recovery codes.
fn preferred_method(outcome: &AuthOutcome) -> TwoFactorMethod {
    [
        TwoFactorMethod::Totp,
        TwoFactorMethod::EmailOtp,
        TwoFactorMethod::RecoveryCode,
    ]
    .into_iter()
    .find(|m| outcome.methods().contains(m))
    .unwrap_or(TwoFactorMethod::Totp)
}

pub async fn logout(services: &Services, cancel: &CancellationToken) -> Result<(), WardenError> {
    // Restoring first lets the server side of the session be closed too.
    let _ = services.restore(cancel).await;
    services.session.logout(cancel).await;
    println!("Logged out.");
    Ok(())
}

pub async fn status(services: &Services, cancel: &CancellationToken) -> Result<(), WardenError> {
    let outcome = services.restore(cancel).await;
    let state = services.session.state().await;
    match services.session.current_user().await {
        Some(user) if outcome.is_success() => {
            println!("{state}: {} ({})", user.display_name, user.user_id);
        }
        _ => {
            let reason = outcome.error_message.unwrap_or_default();
            println!("{state}: {reason}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_authenticator_codes() {
        let outcome = AuthOutcome::requires_two_factor(vec![
            TwoFactorMethod::EmailOtp,
            TwoFactorMethod::Totp,
        ]);
        assert_eq!(preferred_method(&outcome), TwoFactorMethod::Totp);
    }

    #[test]
    fn falls_back_to_email() {
        let outcome = AuthOutcome::requires_two_factor(vec![TwoFactorMethod::EmailOtp]);
        assert_eq!(preferred_method(&outcome), TwoFactorMethod::EmailOtp);
    }

    #[test]
    fn no_methods_defaults_to_totp() {
        let outcome = AuthOutcome::failed("nope");
        assert_eq!(preferred_method(&outcome), TwoFactorMethod::Totp);
    }
}
