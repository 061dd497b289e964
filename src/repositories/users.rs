use super::Repository;
use crate::database::{Condition, Row, StoreError};

pub const TABLE: &str = "users";

/// Columns never sent to a client.
const PRIVATE_COLUMNS: &[&str] = &["password_hash"];

pub async fn find_by_email(repo: &Repository, email: &str) -> Result<Option<Row>, StoreError> {
    repo.find_one_where(vec![Condition::eq("email", email.trim().to_lowercase())]).await
}

/// The row with credentials removed.
pub fn public_view(mut row: Row) -> Row {
    for column in PRIVATE_COLUMNS {
        row.remove(*column);
    }
    row
}

pub fn is_active(row: &Row) -> bool {
    row.get("is_active").and_then(|v| v.as_bool()).unwrap_or(false)
}

pub fn is_verified(row: &Row) -> bool {
    row.get("email_verified_at").map(|v| !v.is_null()).unwrap_or(false)
}
