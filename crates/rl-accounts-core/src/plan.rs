//! Plan catalog records.

use serde::{Deserialize, Serialize};

/// A plan offered by this service.
///
/// `billing_id` is the plan id at the billing provider. A provider subscription
/// belongs to this service exactly when its plan id resolves to one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Internal plan id.
    pub id: String,
    /// Plan id at the billing provider.
    pub billing_id: String,
    /// Human readable name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Price per interval in cents.
    #[serde(default)]
    pub price_cents: i64,
    /// Billing interval, e.g. `"month"`.
    #[serde(default = "default_interval")]
    pub interval: String,
}

fn default_interval() -> String {
    "month".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_file_entries_fill_defaults() {
        let plan: Plan =
            serde_json::from_str(r#"{"id":"basic","billingId":"plan_basic","name":"Basic"}"#)
                .unwrap();
        assert_eq!(plan.interval, "month");
        assert_eq!(plan.price_cents, 0);
        assert!(plan.description.is_none());
    }
}
