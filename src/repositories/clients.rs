use std::collections::{HashMap, HashSet};

use super::{projects, Repository};
use crate::database::{Condition, Relation, StoreError};

pub const TABLE: &str = "clients";

pub const COMPANY: Relation = Relation { name: "company", table: super::companies::TABLE, foreign_key: "company_id" };

/// `client id → "name familyName"`.
pub async fn names(repo: &Repository, ids: &[String]) -> Result<HashMap<String, String>, StoreError> {
    repo.names_by_ids(ids, &["name", "family_name"]).await
}

/// Ids of every client owning a project the user is an active member of.
pub async fn visible_to_user(
    project_members: &Repository,
    project_repo: &Repository,
    user_id: &str,
) -> Result<HashSet<String>, StoreError> {
    let project_ids = project_members
        .pluck(
            "project_id",
            vec![Condition::eq("user_id", user_id), Condition::is_null("deleted_at")],
        )
        .await?;
    if project_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let client_ids = projects::client_ids(project_repo, &project_ids).await?;
    tracing::debug!(user_id, projects = project_ids.len(), clients = client_ids.len(), "resolved client visibility");
    Ok(client_ids.into_iter().collect())
}

/// Ids of the clients belonging to a company.
pub async fn ids_for_company(repo: &Repository, company_id: &str) -> Result<Vec<String>, StoreError> {
    repo.pluck("id", vec![Condition::eq("company_id", company_id)]).await
}

