use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema};

pub const PAYMENT_TERMS: &[&str] = &["net_30d", "net_60d", "net_90d", "immediate"];
pub const PROJECT_STATUSES: &[&str] = &["active", "completed", "on_hold", "cancelled"];
pub const PRIORITIES: &[&str] = &["low", "medium", "high", "urgent"];

pub static PROJECT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "project",
        vec![
            Field::text("name").min(2.0).message("Project name must be at least 2 characters"),
            Field::uuid("clientId").message("Invalid client ID"),
            Field::text("type").optional().nullable(),
            Field::text("description").optional().nullable(),
            Field::date("startDate").optional().nullable(),
            Field::date("finishDate").optional().nullable(),
            Field::date("completionDate").optional().nullable(),
            Field::number("budget").optional().nullable(),
            Field::one_of("paymentTerms", PAYMENT_TERMS).default("net_30d"),
            Field::one_of("status", PROJECT_STATUSES).default("active"),
            Field::one_of("priority", PRIORITIES).default("medium"),
            Field::uuid("projectManager").optional().nullable().message("Invalid project manager ID"),
        ],
    )
});

pub static UPDATE_PROJECT: Lazy<Schema> = Lazy::new(|| PROJECT.partial(PartialDefaults::Apply));

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn valid() -> Value {
        json!({ "name": "Website", "clientId": "550e8400-e29b-41d4-a716-446655440000" })
    }

    #[test]
    fn malformed_client_id_is_rejected() {
        let mut input = valid();
        input["clientId"] = json!("not-a-uuid");
        assert!(!PROJECT.safe_parse(&input).success());
        input["clientId"] = json!("");
        assert!(!PROJECT.safe_parse(&input).success());
    }

    #[test]
    fn budget_is_coerced() {
        let mut input = valid();
        input["budget"] = json!("25000");
        assert_eq!(PROJECT.parse(&input).unwrap()["budget"], json!(25000));
        input["budget"] = json!(null);
        assert_eq!(PROJECT.parse(&input).unwrap()["budget"], Value::Null);
    }

    #[test]
    fn empty_update_still_carries_defaults() {
        let data = UPDATE_PROJECT.parse(&json!({})).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data["status"], "active");
        assert_eq!(data["priority"], "medium");
        assert_eq!(data["paymentTerms"], "net_30d");
    }
}
