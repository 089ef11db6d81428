//! Login, registration and logout.
//!
//! The backend has no auth endpoint: login lists users and matches the
//! credentials client-side, registration posts a new user record. Logout
//! also drops the local cart.

use std::sync::Arc;

use pocketshop_core::{Email, RegisterRequest, User};
use tracing::{info, instrument};

use crate::cart::CartEngine;
use crate::checkout::MIN_ADDRESS_CHARS;
use crate::error::{Error, Result, clear_sentry_user, set_sentry_user};
use crate::remote::RemoteStore;
use crate::session::SessionStore;

/// Shortest accepted password.
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Clone)]
pub struct Profile {
    remote: Arc<dyn RemoteStore>,
    session: Arc<dyn SessionStore>,
    cart: CartEngine,
}

impl Profile {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        session: Arc<dyn SessionStore>,
        cart: CartEngine,
    ) -> Self {
        Self {
            remote,
            session,
            cart,
        }
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.session.current().active_user().cloned()
    }

    /// Log in and persist the session.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCredentials`] if no user matches,
    /// [`Error::Remote`] or [`Error::Session`] on I/O failure.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = Email::parse(email).map_err(|_| Error::InvalidCredentials)?;
        let user = self
            .remote
            .users()
            .await?
            .into_iter()
            .find(|user| user.email.trim().eq_ignore_ascii_case(email.as_str()) && user.password == password)
            .ok_or(Error::InvalidCredentials)?;

        self.session.save(&user).await?;
        set_sentry_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for malformed input, [`Error::AccountExists`]
    /// if the email is taken, [`Error::Remote`] or [`Error::Session`] on
    /// I/O failure.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let request = validate_registration(request)?;

        let taken = self
            .remote
            .users()
            .await?
            .iter()
            .any(|user| user.email.trim().eq_ignore_ascii_case(&request.email));
        if taken {
            return Err(Error::AccountExists);
        }

        let user = self.remote.create_user(&request).await?;
        self.session.save(&user).await?;
        set_sentry_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "Registered");
        Ok(user)
    }

    /// Forget the logged-in user and drop the local cart snapshot. The
    /// server cart is kept for the next login.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`] if the session cannot be cleared; the cart
    /// is left as it was.
    pub async fn logout(&self) -> Result<()> {
        self.session.clear().await?;
        self.cart.reset();
        clear_sentry_user();
        info!("Logged out");
        Ok(())
    }
}

/// Check and normalise a registration request.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the first invalid field.
pub fn validate_registration(mut request: RegisterRequest) -> Result<RegisterRequest> {
    request.first_name = request.first_name.trim().to_string();
    request.last_name = request.last_name.trim().to_string();
    request.phone = request.phone.trim().to_string();
    request.address = request.address.trim().to_string();

    if request.first_name.is_empty() || request.last_name.is_empty() {
        return Err(Error::Validation("First and last name are required".to_string()));
    }
    request.email = Email::parse(&request.email)
        .map_err(|e| Error::Validation(format!("Invalid email: {e}")))?
        .to_string();
    if request.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(Error::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if request.address.chars().count() < MIN_ADDRESS_CHARS {
        return Err(Error::Validation(format!(
            "Address must be at least {MIN_ADDRESS_CHARS} characters"
        )));
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            first_name: " Amina ".to_string(),
            last_name: "Bennani".to_string(),
            email: "Amina@Example.com".to_string(),
            password: "hunter22".to_string(),
            phone: "0600000000".to_string(),
            address: "12 Rue des Fleurs, Rabat".to_string(),
        }
    }

    #[test]
    fn test_valid_registration_is_normalised() {
        let req = validate_registration(request()).ok();
        assert_eq!(req.as_ref().map(|r| r.first_name.as_str()), Some("Amina"));
        assert_eq!(req.as_ref().map(|r| r.email.as_str()), Some("amina@example.com"));
    }

    #[test]
    fn test_short_password_rejected() {
        let mut req = request();
        req.password = "12345".to_string();
        assert!(matches!(validate_registration(req), Err(Error::Validation(_))));
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut req = request();
        req.email = "amina.example.com".to_string();
        assert!(matches!(validate_registration(req), Err(Error::Validation(_))));
    }

    #[test]
    fn test_blank_name_and_short_address_rejected() {
        let mut req = request();
        req.last_name = "  ".to_string();
        assert!(validate_registration(req).is_err());

        let mut req = request();
        req.address = "Rabat".to_string();
        assert!(validate_registration(req).is_err());
    }
}
