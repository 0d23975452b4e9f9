//! Storage layer for rl-accounts.
//!
//! Two concerns live here:
//!
//! - [`Store`]: account records and the API-key index used by authentication
//! - [`PlanCatalog`]: the internal plan records, looked up by internal id or by
//!   billing-provider plan id
//!
//! [`MemoryStore`] is always available. `RocksStore` persists the same data in
//! `RocksDB` and is compiled with the `rocksdb-backend` feature.
//!
//! # Example
//!
//! ```
//! use rl_accounts_core::Account;
//! use rl_accounts_store::{MemoryStore, Store};
//!
//! let store = MemoryStore::new();
//! let mut account = Account::new("cus_123", "Ada", "Lovelace", "ada@example.com").unwrap();
//! let key = account.issue_api_key();
//! store.put_account(&account).unwrap();
//!
//! let found = store.find_account_by_api_key(&key.digest()).unwrap();
//! assert_eq!(found.map(|a| a.id), Some(account.id));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use rl_accounts_core::{Account, AccountId, Plan};

/// Default page size for [`PlanCatalog::list_plans`].
pub const DEFAULT_PLAN_PAGE_SIZE: usize = 100;

/// Account storage.
pub trait Store: Send + Sync {
    /// Insert or update an account record, including its API-key index entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, id: &AccountId) -> Result<Option<Account>>;

    /// Delete an account and its API-key index entries.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn delete_account(&self, id: &AccountId) -> Result<()>;

    /// Resolve an API-key digest to the account it was issued to.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn find_account_by_api_key(&self, digest: &str) -> Result<Option<Account>>;
}

/// The internal plan catalog.
pub trait PlanCatalog: Send + Sync {
    /// Insert or replace a plan.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_plan(&self, plan: &Plan) -> Result<()>;

    /// Get a plan by internal id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_plan(&self, id: &str) -> Result<Option<Plan>>;

    /// Get a plan by its billing-provider plan id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_by_billing_id(&self, billing_id: &str) -> Result<Option<Plan>>;

    /// List plans ordered by id, starting after `start_key` (exclusive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_plans(&self, start_key: Option<&str>, limit: usize) -> Result<Vec<Plan>>;
}
