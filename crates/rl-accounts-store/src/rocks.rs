//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` and
//! `PlanCatalog` traits.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use rl_accounts_core::{Account, AccountId, Plan};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{PlanCatalog, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!(path = %path.as_ref().display(), "Opening RocksDB store");

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get_value<T: serde::de::DeserializeOwned>(&self, family: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(family)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }
}

impl Store for RocksStore {
    fn put_account(&self, account: &Account) -> Result<()> {
        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_keys = self.cf(cf::API_KEYS)?;
        let key = keys::account_key(&account.id);
        let value = Self::serialize(account)?;

        let mut batch = WriteBatch::default();

        // Drop index entries for keys that were removed from the record
        if let Some(previous) = self.get_account(&account.id)? {
            for digest in &previous.api_key_digests {
                if !account.api_key_digests.contains(digest) {
                    batch.delete_cf(&cf_keys, keys::api_key_key(digest));
                }
            }
        }

        for digest in &account.api_key_digests {
            batch.put_cf(&cf_keys, keys::api_key_key(digest), &key);
        }
        batch.put_cf(&cf_accounts, &key, &value);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_account(&self, id: &AccountId) -> Result<Option<Account>> {
        self.get_value(cf::ACCOUNTS, &keys::account_key(id))
    }

    fn delete_account(&self, id: &AccountId) -> Result<()> {
        let account = self.get_account(id)?.ok_or_else(|| StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_keys = self.cf(cf::API_KEYS)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_accounts, keys::account_key(id));
        for digest in &account.api_key_digests {
            batch.delete_cf(&cf_keys, keys::api_key_key(digest));
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn find_account_by_api_key(&self, digest: &str) -> Result<Option<Account>> {
        let cf = self.cf(cf::API_KEYS)?;
        let Some(raw_id) = self
            .db
            .get_cf(&cf, keys::api_key_key(digest))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        let id = keys::decode_account_key(&raw_id)?;
        self.get_account(&id)
    }
}

impl PlanCatalog for RocksStore {
    fn put_plan(&self, plan: &Plan) -> Result<()> {
        let cf_plans = self.cf(cf::PLANS)?;
        let cf_by_billing = self.cf(cf::PLANS_BY_BILLING_ID)?;

        let mut batch = WriteBatch::default();
        if let Some(previous) = self.get_plan(&plan.id)? {
            batch.delete_cf(&cf_by_billing, keys::plan_billing_key(&previous.billing_id));
        }
        batch.put_cf(&cf_plans, keys::plan_key(&plan.id), Self::serialize(plan)?);
        batch.put_cf(
            &cf_by_billing,
            keys::plan_billing_key(&plan.billing_id),
            keys::plan_key(&plan.id),
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn get_plan(&self, id: &str) -> Result<Option<Plan>> {
        self.get_value(cf::PLANS, &keys::plan_key(id))
    }

    fn get_by_billing_id(&self, billing_id: &str) -> Result<Option<Plan>> {
        let cf = self.cf(cf::PLANS_BY_BILLING_ID)?;
        let Some(raw_id) = self
            .db
            .get_cf(&cf, keys::plan_billing_key(billing_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
        else {
            return Ok(None);
        };

        self.get_value(cf::PLANS, &raw_id)
    }

    fn list_plans(&self, start_key: Option<&str>, limit: usize) -> Result<Vec<Plan>> {
        let cf = self.cf(cf::PLANS)?;
        let start = start_key.map(keys::plan_key);
        let mode = match &start {
            Some(key) => IteratorMode::From(key, Direction::Forward),
            None => IteratorMode::Start,
        };

        let mut plans = Vec::new();
        for item in self.db.iterator_cf(&cf, mode) {
            if plans.len() >= limit {
                break;
            }

            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            // start_key is exclusive
            if start.as_deref() == Some(&key[..]) {
                continue;
            }

            plans.push(Self::deserialize(&value)?);
        }

        Ok(plans)
    }
}
