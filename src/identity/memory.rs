use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Mutex, RwLock},
    time::Duration,
};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use lazy_static::lazy_static;
use log::{debug, info};
use moka::future::Cache;
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

use super::{
    Authenticatable, Credentials, IdentityError, IdentityProvider, Session, SignUpInput,
    UpdatePasswordInput,
};
use crate::resource::Resource;

/// how long issued access tokens are accepted
const TOKEN_LIFESPAN: Duration = Duration::from_secs(60 * 60 * 24 * 14);
const CONFIRMATION_LIFESPAN: Duration = Duration::from_secs(60 * 60 * 24 * 3);
const RESET_PASSWORD_LIFESPAN: Duration = Duration::from_secs(60 * 60 * 6);

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;

const EMAIL_TAKEN: &str = "Email has already been taken";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryKind {
    Confirmation,
    ResetPassword,
}

/// A mail that would have been sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub kind: DeliveryKind,
    pub email: String,
    pub token: String,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone)]
struct Account {
    id: Uuid,
    email: String,
    password_hash: String,
    confirmed: bool,
}

impl From<&Account> for Authenticatable {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            confirmed: account.confirmed,
        }
    }
}

/// (resource mapping, email)
type AccountKey = (String, String);

#[derive(Debug, Clone)]
struct IssuedToken {
    key: AccountKey,
    client: String,
    expiry: i64,
    /// issued by a password reset, the password may be changed without the current one
    allow_password_change: bool,
}

/// MemoryIdentity
///
/// An [``IdentityProvider``] that keeps every account in memory. Nothing is
/// persisted and no mails are sent; they are recorded in an outbox instead.
/// Accounts of different resources never see each other, even with the same email.
pub struct MemoryIdentity {
    /// new accounts have to be confirmed before they can log in
    confirmable: bool,
    accounts: RwLock<HashMap<AccountKey, Account>>,
    access_tokens: Cache<String, IssuedToken>,
    confirmation_tokens: Cache<String, AccountKey>,
    reset_password_tokens: Cache<String, AccountKey>,
    outbox: Mutex<Vec<Delivery>>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MemoryIdentity {
    pub fn new(confirmable: bool) -> Self {
        Self {
            confirmable,
            accounts: RwLock::new(HashMap::new()),
            access_tokens: Cache::builder().time_to_live(TOKEN_LIFESPAN).build(),
            confirmation_tokens: Cache::builder()
                .time_to_live(CONFIRMATION_LIFESPAN)
                .build(),
            reset_password_tokens: Cache::builder()
                .time_to_live(RESET_PASSWORD_LIFESPAN)
                .build(),
            outbox: Mutex::new(vec![]),
        }
    }

    /// Every mail recorded so far
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    /// The token of the most recent mail of ``kind`` to ``email``
    pub fn last_token(&self, kind: DeliveryKind, email: &str) -> Option<String> {
        self.deliveries()
            .into_iter()
            .rev()
            .find(|delivery| delivery.kind == kind && delivery.email == email)
            .map(|delivery| delivery.token)
    }

    fn account(&self, key: &AccountKey) -> Result<Option<Account>, IdentityError> {
        Ok(self
            .accounts
            .read()
            .map_err(|_| poisoned())?
            .get(key)
            .cloned())
    }

    /// Inserts ``account`` unless the key is taken, returns if it was inserted
    fn insert_account(&self, key: AccountKey, account: Account) -> Result<bool, IdentityError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        match accounts.entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(account);
                Ok(true)
            }
        }
    }

    fn update_account(
        &self,
        key: &AccountKey,
        update: impl FnOnce(&mut Account),
    ) -> Result<Account, IdentityError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        let account = accounts
            .get_mut(key)
            .ok_or_else(|| IdentityError::UserNotFound(key.1.clone()))?;
        update(account);
        Ok(account.clone())
    }

    fn deliver(&self, delivery: Delivery) -> Result<(), IdentityError> {
        debug!(
            "{:?} instructions for {} with token {}",
            delivery.kind, delivery.email, delivery.token
        );
        self.outbox.lock().map_err(|_| poisoned())?.push(delivery);
        Ok(())
    }

    async fn issue_credentials(&self, key: AccountKey, allow_password_change: bool) -> Credentials {
        let access_token = generate_token();
        let client = Uuid::new_v4().to_string();
        let expiry = Utc::now().timestamp() + TOKEN_LIFESPAN.as_secs() as i64;
        let uid = key.1.clone();

        self.access_tokens
            .insert(
                access_token.clone(),
                IssuedToken {
                    key,
                    client: client.clone(),
                    expiry,
                    allow_password_change,
                },
            )
            .await;

        Credentials {
            access_token,
            client,
            uid,
            expiry,
            token_type: "Bearer".to_string(),
        }
    }

    /// Looks the account up the credentials were issued for
    async fn authenticate(
        &self,
        resource: &Resource,
        credentials: &Credentials,
    ) -> Result<(Account, IssuedToken), IdentityError> {
        let issued = self
            .access_tokens
            .get(&credentials.access_token)
            .await
            .ok_or(IdentityError::NotAuthenticated)?;

        if issued.key.0 != resource.mapping()
            || issued.key.1 != credentials.uid
            || issued.client != credentials.client
            || issued.expiry < Utc::now().timestamp()
        {
            return Err(IdentityError::NotAuthenticated);
        }

        let account = self
            .account(&issued.key)?
            .ok_or(IdentityError::NotAuthenticated)?;
        Ok((account, issued))
    }

    /// Takes a token out of ``tokens`` if it was issued for ``resource``.
    /// Tokens of other resources stay where they are.
    async fn redeem(
        tokens: &Cache<String, AccountKey>,
        resource: &Resource,
        token: &str,
    ) -> Result<AccountKey, IdentityError> {
        match tokens.get(token).await {
            Some(key) if key.0 == resource.mapping() => tokens
                .remove(token)
                .await
                .ok_or(IdentityError::InvalidToken),
            _ => Err(IdentityError::InvalidToken),
        }
    }

    async fn send_confirmation(
        &self,
        key: AccountKey,
        redirect_url: Option<String>,
    ) -> Result<(), IdentityError> {
        let token = generate_token();
        self.confirmation_tokens
            .insert(token.clone(), key.clone())
            .await;
        self.deliver(Delivery {
            kind: DeliveryKind::Confirmation,
            email: key.1,
            token,
            redirect_url,
        })
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn login(
        &self,
        resource: &Resource,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let key = account_key(resource, email);
        let account = self
            .account(&key)?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !verify_password(password, &account.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }
        if !account.confirmed {
            return Err(IdentityError::NotConfirmed(account.email));
        }

        info!("{} {} logged in", resource, account.id);
        let credentials = self.issue_credentials(key, false).await;
        Ok(Session {
            authenticatable: Authenticatable::from(&account),
            credentials: Some(credentials),
        })
    }

    async fn logout(
        &self,
        resource: &Resource,
        credentials: &Credentials,
    ) -> Result<Authenticatable, IdentityError> {
        let (account, _) = self.authenticate(resource, credentials).await?;
        self.access_tokens
            .invalidate(&credentials.access_token)
            .await;
        info!("{} {} logged out", resource, account.id);
        Ok(Authenticatable::from(&account))
    }

    async fn sign_up(
        &self,
        resource: &Resource,
        input: SignUpInput,
    ) -> Result<Session, IdentityError> {
        let mut errors = validate_password(&input.password, &input.password_confirmation);
        if !is_email(&input.email) {
            errors.push("Email is not an email".to_string());
        }

        let key = account_key(resource, &input.email);
        if self.account(&key)?.is_some() {
            errors.push(EMAIL_TAKEN.to_string());
        }

        if !errors.is_empty() {
            return Err(IdentityError::validation(
                format!("{} could not be saved", resource),
                errors,
            ));
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: key.1.clone(),
            password_hash: hash_password(&input.password)?,
            confirmed: !self.confirmable,
        };
        // another sign up may have taken the email while the password was hashed
        if !self.insert_account(key.clone(), account.clone())? {
            return Err(IdentityError::validation(
                format!("{} could not be saved", resource),
                vec![EMAIL_TAKEN.to_string()],
            ));
        }
        info!("{} {} signed up", resource, account.id);

        let credentials = if account.confirmed {
            Some(self.issue_credentials(key, false).await)
        } else {
            self.send_confirmation(key, input.confirm_success_url)
                .await?;
            None
        };

        Ok(Session {
            authenticatable: Authenticatable::from(&account),
            credentials,
        })
    }

    async fn update_password(
        &self,
        resource: &Resource,
        credentials: &Credentials,
        input: UpdatePasswordInput,
    ) -> Result<Authenticatable, IdentityError> {
        let (account, issued) = self.authenticate(resource, credentials).await?;

        let mut errors = validate_password(&input.password, &input.password_confirmation);
        match &input.current_password {
            Some(current_password) => {
                if !verify_password(current_password, &account.password_hash) {
                    errors.push("Current password is invalid".to_string());
                }
            }
            // only a password reset session may skip the current password
            None if issued.allow_password_change => {}
            None => errors.push("Current password can't be blank".to_string()),
        }
        if !errors.is_empty() {
            return Err(IdentityError::validation(
                "Unable to update user password",
                errors,
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let key = account_key(resource, &account.email);
        let account = self.update_account(&key, |account| account.password_hash = password_hash)?;

        if issued.allow_password_change {
            self.access_tokens
                .insert(
                    credentials.access_token.clone(),
                    IssuedToken {
                        allow_password_change: false,
                        ..issued
                    },
                )
                .await;
        }
        Ok(Authenticatable::from(&account))
    }

    async fn send_password_reset(
        &self,
        resource: &Resource,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), IdentityError> {
        let key = account_key(resource, email);
        if self.account(&key)?.is_none() {
            return Err(IdentityError::UserNotFound(email.to_string()));
        }

        let token = generate_token();
        self.reset_password_tokens
            .insert(token.clone(), key.clone())
            .await;
        self.deliver(Delivery {
            kind: DeliveryKind::ResetPassword,
            email: key.1,
            token,
            redirect_url: Some(redirect_url.to_string()),
        })
    }

    async fn resend_confirmation(
        &self,
        resource: &Resource,
        email: &str,
        redirect_url: &str,
    ) -> Result<(), IdentityError> {
        let key = account_key(resource, email);
        match self.account(&key)? {
            Some(account) if !account.confirmed => {
                self.send_confirmation(key, Some(redirect_url.to_string()))
                    .await
            }
            Some(_) => Err(IdentityError::validation(
                "Email was already confirmed, please try signing in",
                vec![],
            )),
            None => Err(IdentityError::UserNotFound(email.to_string())),
        }
    }

    async fn confirm_account(
        &self,
        resource: &Resource,
        confirmation_token: &str,
    ) -> Result<Authenticatable, IdentityError> {
        let key = Self::redeem(&self.confirmation_tokens, resource, confirmation_token).await?;

        let account = self.update_account(&key, |account| account.confirmed = true)?;
        info!("{} {} confirmed", resource, account.id);
        Ok(Authenticatable::from(&account))
    }

    async fn check_password_token(
        &self,
        resource: &Resource,
        reset_password_token: &str,
    ) -> Result<Session, IdentityError> {
        let key =
            Self::redeem(&self.reset_password_tokens, resource, reset_password_token).await?;

        // following the reset instructions proves access to the mailbox
        let account = self.update_account(&key, |account| account.confirmed = true)?;
        let credentials = self.issue_credentials(key, true).await;
        Ok(Session {
            authenticatable: Authenticatable::from(&account),
            credentials: Some(credentials),
        })
    }
}

fn account_key(resource: &Resource, email: &str) -> AccountKey {
    (resource.mapping().to_string(), email.trim().to_lowercase())
}

fn poisoned() -> IdentityError {
    IdentityError::Internal("account store is poisoned".to_string())
}

fn generate_token() -> String {
    // 32 random bytes as hex
    let token: [u8; 32] = rand::thread_rng().gen();
    hex::encode(token)
}

fn is_email(email: &str) -> bool {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    RE.is_match(email.trim())
}

fn validate_password(password: &str, confirmation: &str) -> Vec<String> {
    let mut errors = vec![];
    if password.len() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password is too short (minimum is {} characters)",
            MIN_PASSWORD_LENGTH
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        errors.push(format!(
            "Password is too long (maximum is {} characters)",
            MAX_PASSWORD_LENGTH
        ));
    }
    if password != confirmation {
        errors.push("Password confirmation doesn't match Password".to_string());
    }
    errors
}

/// returns a PHC string ($argon2id$v=19$...). Note: The string contains the salt.
fn hash_password(password: &str) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Internal(e.to_string()))
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}
