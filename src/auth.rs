//! Sign-in, registration and session restoration.
//!
//! Credentials are checked locally before anything is sent. A stored token
//! that the server no longer accepts is dropped quietly.
use log::{debug, info, warn};

use crate::{ApiClient, LoginCredentials, NotesError, RegisterRequest, Result, User};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Rejects blank usernames and passwords before dispatch.
pub fn validate_credentials(username: &str, password: &str) -> Result<LoginCredentials> {
    let username = username.trim();
    if username.is_empty() {
        return Err(NotesError::validation("username or email is required"));
    }
    if password.trim().is_empty() {
        return Err(NotesError::validation("password is required"));
    }

    Ok(LoginCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Registration rules: credentials as for sign-in, an optional email with a
/// domain, a matching confirmation and a minimum password length.
pub fn validate_registration(
    username: &str,
    email: Option<&str>,
    password: &str,
    confirm_password: &str,
) -> Result<RegisterRequest> {
    let credentials = validate_credentials(username, password)?;

    let email = email.map(str::trim).filter(|e| !e.is_empty());
    if let Some(email) = email {
        let valid = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid {
            return Err(NotesError::validation(format!(
                "'{}' is not a valid email address",
                email
            )));
        }
    }

    if password != confirm_password {
        return Err(NotesError::validation("passwords do not match"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(NotesError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    Ok(RegisterRequest {
        username: credentials.username,
        password: credentials.password,
        email: email.map(str::to_string),
    })
}

pub async fn sign_in(client: &ApiClient, username: &str, password: &str) -> Result<User> {
    let credentials = validate_credentials(username, password)?;
    let response = client.login(&credentials).await?;
    client.session().set(&response.token)?;
    info!("Signed in as {}", response.user.username);
    Ok(response.user)
}

pub async fn sign_up(
    client: &ApiClient,
    username: &str,
    email: Option<&str>,
    password: &str,
    confirm_password: &str,
) -> Result<User> {
    let request = validate_registration(username, email, password, confirm_password)?;
    let response = client.register(&request).await?;
    client.session().set(&response.token)?;
    info!("Registered and signed in as {}", response.user.username);
    Ok(response.user)
}

/// Tells the server, then forgets the local token whatever the server said.
pub async fn sign_out(client: &ApiClient) -> Result<()> {
    if client.session().is_signed_in() {
        if let Err(e) = client.logout().await {
            warn!("Logout request failed, clearing local session anyway: {}", e);
        }
    }
    client.session().clear()?;
    info!("Signed out");
    Ok(())
}

/// Returns the user behind the stored token, or `None` when there is no
/// usable session. A rejected token is cleared.
pub async fn restore_session(client: &ApiClient) -> Result<Option<User>> {
    if !client.session().is_signed_in() {
        debug!("No stored session");
        return Ok(None);
    }

    match client.verify_token().await {
        Ok(response) if response.valid => match response.user {
            Some(user) => {
                debug!("Session restored for {}", user.username);
                Ok(Some(user))
            }
            None => {
                warn!("Token verified but no user returned, clearing session");
                client.session().clear()?;
                Ok(None)
            }
        },
        Ok(_) => {
            info!("Stored session is no longer valid");
            client.session().clear()?;
            Ok(None)
        }
        Err(e) => {
            warn!("Session verification failed: {}", e);
            client.session().clear()?;
            Ok(None)
        }
    }
}
