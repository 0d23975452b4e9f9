//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by account id bytes.
    pub const ACCOUNTS: &str = "accounts";

    /// Index: API-key digest to account id bytes.
    pub const API_KEYS: &str = "api_keys";

    /// Plan records, keyed by internal plan id. Iteration order is id order.
    pub const PLANS: &str = "plans";

    /// Index: billing-provider plan id to internal plan id.
    pub const PLANS_BY_BILLING_ID: &str = "plans_by_billing_id";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::API_KEYS,
        cf::PLANS,
        cf::PLANS_BY_BILLING_ID,
    ]
}
