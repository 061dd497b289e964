use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::json;

use super::{into_row, timestamp, Repository};
use crate::auth::token::{generate_token, hash_token};
use crate::database::{value_text, Condition, Row, StoreError};

pub const TABLE: &str = "auth_tokens";

/// Store a fresh single-use token for `user_id` and return the raw value.
pub async fn issue(repo: &Repository, user_id: &str, kind: &str, valid_hours: u64) -> Result<String, StoreError> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(valid_hours as i64);

    let row = json!({
        "user_id": user_id,
        "kind": kind,
        "token_hash": hash_token(&token),
        "expires_at": expires_at.to_rfc3339_opts(SecondsFormat::Micros, true),
    });
    repo.create(into_row(row)).await?;
    Ok(token)
}

fn expired(row: &Row) -> bool {
    row.get("expires_at")
        .and_then(value_text)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|at| at.with_timezone(&Utc) <= Utc::now())
        .unwrap_or(true)
}

/// Mark a matching, unexpired, unused token as used and return its user id.
/// `None` when the token is unknown, expired or already spent.
pub async fn consume(repo: &Repository, raw: &str, kind: &str) -> Result<Option<String>, StoreError> {
    let candidates = repo
        .find_where(vec![
            Condition::eq("token_hash", hash_token(raw)),
            Condition::eq("kind", kind),
            Condition::is_null("used_at"),
        ])
        .await?;

    let Some(token) = candidates.into_iter().find(|row| !expired(row)) else {
        return Ok(None);
    };
    let Some(id) = token.get("id").and_then(value_text) else {
        return Ok(None);
    };

    // Only one concurrent consumer sees the row still unused.
    let mut patch = Row::new();
    patch.insert("used_at".to_string(), timestamp());
    let spent = repo
        .update_where(vec![Condition::eq("id", id), Condition::is_null("used_at")], patch)
        .await?;
    if spent == 0 {
        return Ok(None);
    }
    Ok(token.get("user_id").and_then(value_text))
}
