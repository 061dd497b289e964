use std::collections::HashMap;

use serde_json::Value;

use super::Repository;
use crate::database::{Condition, Relation, StoreError};

pub const TABLE: &str = "projects";

pub const CLIENT: Relation = Relation { name: "client", table: super::clients::TABLE, foreign_key: "client_id" };

/// Project status that blocks deleting the owning company.
pub const ACTIVE: &str = "active";

/// Distinct owning client ids of the given projects.
pub async fn client_ids(repo: &Repository, project_ids: &[String]) -> Result<Vec<String>, StoreError> {
    let ids = project_ids.iter().cloned().map(Value::String).collect();
    repo.pluck("client_id", vec![Condition::is_in("id", ids)]).await
}

/// `client id → number of projects`.
pub async fn counts_by_client(repo: &Repository, client_ids: &[String]) -> Result<HashMap<String, u64>, StoreError> {
    repo.count_by("client_id", client_ids, vec![]).await
}

/// Active projects across all of the given clients.
pub async fn active_count_for_clients(repo: &Repository, client_ids: &[String]) -> Result<u64, StoreError> {
    let counts = repo
        .count_by("client_id", client_ids, vec![Condition::eq("status", ACTIVE)])
        .await?;
    Ok(counts.values().sum())
}
