//! Auth*entication* mechanics
//!
//! The schema only decides *which* operations exist. What they do is up to an
//! [``IdentityProvider``]: checking credentials, issuing tokens and sending mails.
//! Every call is scoped by the [``Resource``] the operation was mounted for.
use async_graphql::ErrorExtensions;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{fallible::UserError, resource::Resource};

mod memory;

pub use memory::{Delivery, DeliveryKind, MemoryIdentity};

/// The header names credentials are sent with
pub const ACCESS_TOKEN_HEADER: &str = "access-token";
pub const CLIENT_HEADER: &str = "client";
pub const UID_HEADER: &str = "uid";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Authenticatable
///
/// The account of a resource as the schema exposes it
pub struct Authenticatable {
    pub id: Uuid,
    pub email: String,
    /// if the account followed the confirmation instructions
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Credentials
///
/// A client has to send these as ``access-token``, ``client`` and ``uid``
/// headers to act as an authenticated account.
pub struct Credentials {
    pub access_token: String,
    /// identifies the device the token was issued to
    pub client: String,
    /// the email of the account
    pub uid: String,
    /// unix timestamp after which the token is no longer accepted
    pub expiry: i64,
    pub token_type: String,
}

impl Credentials {
    /// Collects the credentials from the request headers. Returns ``None``
    /// unless all three headers are present.
    pub fn from_headers<'a>(header: impl Fn(&str) -> Option<&'a str>) -> Option<Self> {
        Some(Self {
            access_token: header(ACCESS_TOKEN_HEADER)?.to_string(),
            client: header(CLIENT_HEADER)?.to_string(),
            uid: header(UID_HEADER)?.to_string(),
            expiry: 0,
            token_type: "Bearer".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub authenticatable: Authenticatable,
    /// ``None`` if the account cannot log in yet, e.g. after signing up
    /// to a resource that requires confirmation
    pub credentials: Option<Credentials>,
}

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    /// where the confirmation mail should lead to
    pub confirm_success_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdatePasswordInput {
    pub password: String,
    pub password_confirmation: String,
    pub current_password: Option<String>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Invalid login credentials. Please try again.")]
    InvalidCredentials,
    #[error("A confirmation email was sent to your account at '{0}'. You must follow the instructions in the email before your account can be activated")]
    NotConfirmed(String),
    #[error("User is not logged in.")]
    NotAuthenticated,
    #[error("Unable to find user with email '{0}'.")]
    UserNotFound(String),
    #[error("Invalid token.")]
    InvalidToken,
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<String>,
    },
    #[error("internal identity error: {0}")]
    Internal(String),
}

impl IdentityError {
    pub fn validation(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }
}

impl ErrorExtensions for IdentityError {
    fn extend(&self) -> async_graphql::Error {
        match self {
            IdentityError::NotAuthenticated => UserError::authentication(self.to_string()).into(),
            IdentityError::Validation { message, errors } => UserError::new(message.clone())
                .with_details(errors.clone())
                .into(),
            IdentityError::Internal(_) => async_graphql::Error::new(self.to_string()),
            _ => UserError::new(self.to_string()).into(),
        }
    }
}

/// IdentityProvider
///
/// Performs the actual authentication for the default operations. The
/// [``Resource``] tells which kind of account an incoming request is about.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(
        &self,
        resource: &Resource,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// revokes the given credentials
    async fn logout(
        &self,
        resource: &Resource,
        credentials: &Credentials,
    ) -> Result<Authenticatable, IdentityError>;

    async fn sign_up(&self, resource: &Resource, input: SignUpInput)
        -> Result<Session, IdentityError>;

    async fn update_password(
        &self,
        resource: &Resource,
        credentials: &Credentials,
        input: UpdatePasswordInput,
    ) -> Result<Authenticatable, IdentityError>;

    /// sends the reset password instructions
    async fn send_password_reset(
        &self,
        resource: &Resource,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), IdentityError>;

    /// sends the confirmation instructions again
    async fn resend_confirmation(
        &self,
        resource: &Resource,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), IdentityError>;

    async fn confirm_account(
        &self,
        resource: &Resource,
        confirmation_token: &str,
    ) -> Result<Authenticatable, IdentityError>;

    /// checks a reset password token and issues credentials to set a new password with
    async fn check_password_token(
        &self,
        resource: &Resource,
        reset_password_token: &str,
    ) -> Result<Session, IdentityError>;
}
