//! Key encoding utilities for `RocksDB`.

use rl_accounts_core::AccountId;

use crate::error::{Result, StoreError};

/// Create an account key from an account ID.
#[must_use]
pub fn account_key(id: &AccountId) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Decode an account ID stored as an index value.
///
/// # Errors
///
/// Returns `StoreError::Serialization` if the value is not 16 bytes.
pub fn decode_account_key(value: &[u8]) -> Result<AccountId> {
    let bytes: [u8; 16] = value
        .try_into()
        .map_err(|_| StoreError::Serialization(format!("bad account key length {}", value.len())))?;
    Ok(AccountId::from_uuid(uuid::Uuid::from_bytes(bytes)))
}

/// Create an API-key index key from a key digest.
#[must_use]
pub fn api_key_key(digest: &str) -> Vec<u8> {
    digest.as_bytes().to_vec()
}

/// Create a plan key from an internal plan id.
#[must_use]
pub fn plan_key(id: &str) -> Vec<u8> {
    id.as_bytes().to_vec()
}

/// Create a billing-id index key.
#[must_use]
pub fn plan_billing_key(billing_id: &str) -> Vec<u8> {
    billing_id.as_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_length() {
        let id = AccountId::generate();
        assert_eq!(account_key(&id).len(), 16);
    }

    #[test]
    fn account_key_decodes() {
        let id = AccountId::generate();
        assert_eq!(decode_account_key(&account_key(&id)).unwrap(), id);
    }

    #[test]
    fn short_account_key_is_rejected() {
        assert!(matches!(
            decode_account_key(&[1, 2, 3]),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn plan_keys_sort_like_ids() {
        assert!(plan_key("basic") < plan_key("pro"));
    }
}
