//! Reusable pagination schema.
//!
//! Unlike the route-level parser in `crate::pagination`, which clamps, this
//! schema rejects out-of-range values. Numeric strings are coerced but not
//! floored, so `"3.7"` parses to `3.7`.

use once_cell::sync::Lazy;

use super::{Field, Schema};

pub static PAGINATION: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "pagination",
        vec![
            Field::number("page").min(1.0).default(1),
            Field::number("pageSize").min(1.0).max(100.0).default(10),
        ],
    )
});

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let data = PAGINATION.parse(&json!({})).unwrap();
        assert_eq!(data["page"], json!(1));
        assert_eq!(data["pageSize"], json!(10));
    }

    #[test]
    fn coerces_without_flooring() {
        let data = PAGINATION.parse(&json!({ "page": "3.7", "pageSize": "20" })).unwrap();
        assert_eq!(data["page"], json!(3.7));
        assert_eq!(data["pageSize"], json!(20));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(PAGINATION.parse(&json!({ "page": 0 })).is_err());
        assert!(PAGINATION.parse(&json!({ "pageSize": 101 })).is_err());
        assert!(PAGINATION.parse(&json!({ "pageSize": 0 })).is_err());
        assert!(PAGINATION.parse(&json!({ "pageSize": 100 })).is_ok());
    }
}
