use super::{FindOptions, Repository};
use crate::database::{Condition, Ordering, Row, StoreError};

pub const PROJECT_MEMBERS: &str = "project_members";
pub const MILESTONE_MEMBERS: &str = "milestone_members";

/// Members of one parent row that have not been removed, oldest first.
pub async fn active(repo: &Repository, parent_column: &str, parent_id: &str) -> Result<Vec<Row>, StoreError> {
    let page = repo
        .find_all(FindOptions {
            filters: vec![Condition::eq(parent_column, parent_id), Condition::is_null("deleted_at")],
            order: vec![Ordering { column: "created_at".into(), ascending: true }],
            range: None,
        })
        .await?;
    Ok(page.rows)
}
