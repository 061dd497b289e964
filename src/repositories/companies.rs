use std::collections::HashMap;

use super::Repository;
use crate::database::StoreError;

pub const TABLE: &str = "companies";

/// `company id → company name`.
pub async fn names(repo: &Repository, ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
    repo.names_by_ids(ids, &["name"]).await
}
