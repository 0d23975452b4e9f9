//! In-memory storage implementation.
//!
//! Used by tests and by deployments that keep accounts elsewhere and only need
//! a process-local view.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rl_accounts_core::{Account, AccountId, Plan};

use crate::error::{Result, StoreError};
use crate::{PlanCatalog, Store};

#[derive(Default)]
struct Inner {
    accounts: HashMap<AccountId, Account>,
    api_keys: HashMap<String, AccountId>,
    plans: BTreeMap<String, Plan>,
    plans_by_billing_id: HashMap<String, String>,
}

/// Process-local storage backed by hash maps.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose catalog holds `plans`.
    ///
    /// # Errors
    ///
    /// Returns an error if a plan cannot be inserted.
    pub fn with_plans(plans: &[Plan]) -> Result<Self> {
        let store = Self::new();
        for plan in plans {
            store.put_plan(plan)?;
        }
        Ok(store)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn put_account(&self, account: &Account) -> Result<()> {
        let mut inner = self.write()?;

        // Drop index entries for keys that were removed from the record
        if let Some(previous) = inner.accounts.get(&account.id).cloned() {
            for digest in previous.api_key_digests {
                if !account.api_key_digests.contains(&digest) {
                    inner.api_keys.remove(&digest);
                }
            }
        }

        for digest in &account.api_key_digests {
            inner.api_keys.insert(digest.clone(), account.id);
        }
        inner.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn get_account(&self, id: &AccountId) -> Result<Option<Account>> {
        Ok(self.read()?.accounts.get(id).cloned())
    }

    fn delete_account(&self, id: &AccountId) -> Result<()> {
        let mut inner = self.write()?;
        let account = inner.accounts.remove(id).ok_or_else(|| StoreError::NotFound {
            entity: "account",
            id: id.to_string(),
        })?;
        for digest in &account.api_key_digests {
            inner.api_keys.remove(digest);
        }
        Ok(())
    }

    fn find_account_by_api_key(&self, digest: &str) -> Result<Option<Account>> {
        let inner = self.read()?;
        Ok(inner
            .api_keys
            .get(digest)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }
}

impl PlanCatalog for MemoryStore {
    fn put_plan(&self, plan: &Plan) -> Result<()> {
        let mut inner = self.write()?;
        if let Some(previous) = inner.plans.insert(plan.id.clone(), plan.clone()) {
            inner.plans_by_billing_id.remove(&previous.billing_id);
        }
        inner
            .plans_by_billing_id
            .insert(plan.billing_id.clone(), plan.id.clone());
        Ok(())
    }

    fn get_plan(&self, id: &str) -> Result<Option<Plan>> {
        Ok(self.read()?.plans.get(id).cloned())
    }

    fn get_by_billing_id(&self, billing_id: &str) -> Result<Option<Plan>> {
        let inner = self.read()?;
        Ok(inner
            .plans_by_billing_id
            .get(billing_id)
            .and_then(|id| inner.plans.get(id))
            .cloned())
    }

    fn list_plans(&self, start_key: Option<&str>, limit: usize) -> Result<Vec<Plan>> {
        let inner = self.read()?;
        let lower = start_key.map_or(Bound::Unbounded, |k| Bound::Excluded(k.to_string()));
        Ok(inner
            .plans
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, plan)| plan.clone())
            .collect())
    }
}
