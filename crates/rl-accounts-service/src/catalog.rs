//! Plan catalog seeding.

use std::path::Path;

use rl_accounts_core::Plan;
use rl_accounts_store::{PlanCatalog, StoreError};

/// Errors loading the plans file.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("failed to read plans file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a JSON array of plans.
    #[error("invalid plans file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A plan could not be stored.
    #[error("failed to store plan: {0}")]
    Store(#[from] StoreError),
}

/// Load a JSON array of plans into the catalog, replacing plans with the same id.
///
/// Returns the number of plans written.
pub fn seed_plans(catalog: &dyn PlanCatalog, path: impl AsRef<Path>) -> Result<usize, SeedError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let plans: Vec<Plan> = serde_json::from_str(&contents)?;

    for plan in &plans {
        catalog.put_plan(plan)?;
        tracing::debug!(plan_id = %plan.id, billing_id = %plan.billing_id, "Plan seeded");
    }

    Ok(plans.len())
}
