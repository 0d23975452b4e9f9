//! Account records.
//!
//! The account is the identity record callers authenticate as. Its only link to
//! billing is `billing_id`, the customer id at the billing provider; plan and
//! payment state are never stored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{AccountId, ApiKey};

/// Most API keys an account holds at once. Issuing past this retires the
/// oldest key.
pub const MAX_API_KEYS: usize = 10;

/// An account registered with the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account ID.
    pub id: AccountId,

    /// Customer id at the billing provider.
    pub billing_id: String,

    /// Given name.
    pub first_name: String,

    /// Family name.
    pub last_name: String,

    /// Contact email.
    pub email: String,

    /// SHA-256 digests of the API keys issued to this account.
    #[serde(default)]
    pub api_key_digests: Vec<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account linked to an existing billing customer.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidField` if a name is blank or the email is
    /// obviously malformed.
    pub fn new(
        billing_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let now = Utc::now();
        let account = Self {
            id: AccountId::generate(),
            billing_id: billing_id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            api_key_digests: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        account.validate()?;
        Ok(account)
    }

    /// Check the caller-supplied profile fields.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidField` naming the first bad field.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("firstName", &self.first_name)?;
        validate_name("lastName", &self.last_name)?;
        validate_email(&self.email)
    }

    /// Issue a new API key for this account and remember its digest.
    ///
    /// The returned key is the only copy of the raw value. Once the account
    /// holds [`MAX_API_KEYS`] keys the oldest ones stop working.
    pub fn issue_api_key(&mut self) -> ApiKey {
        let key = ApiKey::generate();
        self.api_key_digests.push(key.digest());
        let excess = self.api_key_digests.len().saturating_sub(MAX_API_KEYS);
        self.api_key_digests.drain(..excess);
        self.updated_at = Utc::now();
        key
    }

    /// Display name as sent to the billing provider.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

fn validate_name(field: &'static str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::InvalidField {
            field,
            reason: "must not be empty".into(),
        });
    }
    Ok(())
}

fn validate_email(value: &str) -> Result<(), CoreError> {
    let valid = value
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(CoreError::InvalidField {
            field: "email",
            reason: format!("not an email address: {value}"),
        })
    }
}
