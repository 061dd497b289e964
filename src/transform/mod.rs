//! Key-casing transforms between the wire format (camelCase) and storage
//! columns (snake_case).
//!
//! Every record crossing the service/repository boundary goes through
//! [`transform_to_db`] on the way down and [`transform_from_db`] on the way up.
//! Both functions recurse through arrays and nested objects and return a new
//! value; the input is never mutated.

use serde_json::{Map, Value};

/// Convert a camelCase identifier to snake_case (`companyId` → `company_id`).
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Convert a snake_case identifier to camelCase (`company_id` → `companyId`).
pub fn to_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Rewrite a user-supplied sort column (`createdAt`) to its storage name
/// (`created_at`). Names already in snake_case pass through unchanged.
pub fn transform_column_name(column: &str) -> String {
    to_snake_case(column)
}

/// Storage row(s) → wire representation.
pub fn transform_from_db(value: &Value) -> Value {
    transform_keys(value, &to_camel_case)
}

/// Wire record → storage representation.
pub fn transform_to_db(value: &Value) -> Value {
    transform_keys(value, &to_snake_case)
}

/// Map-level helper used by the service layer, which works on validated records.
pub fn record_to_db(record: &Map<String, Value>) -> Map<String, Value> {
    record
        .iter()
        .map(|(k, v)| (to_snake_case(k), transform_to_db(v)))
        .collect()
}

fn transform_keys(value: &Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (rename(k), transform_keys(v, rename)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| transform_keys(v, rename)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_identifiers() {
        assert_eq!(to_snake_case("totalContractValue"), "total_contract_value");
        assert_eq!(to_snake_case("name"), "name");
        assert_eq!(to_snake_case("created_at"), "created_at");
        assert_eq!(to_camel_case("follow_up_required"), "followUpRequired");
        assert_eq!(to_camel_case("id"), "id");
        assert_eq!(transform_column_name("createdAt"), "created_at");
    }

    #[test]
    fn transforms_nested_records_without_touching_values() {
        let row = json!({
            "company_id": "550e8400-e29b-41d4-a716-446655440001",
            "family_name": "Doe",
            "company": { "contact_person": "some_value" },
            "tags": [{ "created_at": "2024-01-01" }]
        });

        let camel = transform_from_db(&row);
        assert_eq!(camel["companyId"], "550e8400-e29b-41d4-a716-446655440001");
        assert_eq!(camel["company"]["contactPerson"], "some_value");
        assert_eq!(camel["tags"][0]["createdAt"], "2024-01-01");
        // input is untouched
        assert!(row.get("companyId").is_none());
    }

    #[test]
    fn round_trips_every_resource_schema() {
        use crate::schema::{client, communication_log, company, employee, member, milestone, payment, project};

        let schemas = [
            &*client::CLIENT,
            &*company::COMPANY,
            &*employee::EMPLOYEE,
            &*project::PROJECT,
            &*milestone::MILESTONE,
            &*payment::PAYMENT,
            &*communication_log::COMMUNICATION_LOG,
            &*member::PROJECT_MEMBER,
            &*member::MILESTONE_MEMBER,
        ];
        for schema in schemas {
            let record: Map<String, Value> = schema
                .fields()
                .iter()
                .enumerate()
                .map(|(i, field)| (field.name.to_string(), json!(i)))
                .collect();
            assert!(!record.is_empty());

            let input = Value::Object(record);
            assert_eq!(transform_from_db(&transform_to_db(&input)), input);
        }
    }
}
