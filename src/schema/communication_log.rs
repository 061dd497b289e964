use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema};

pub const CHANNELS: &[&str] = &["email", "phone", "chat", "meeting", "video_call"];

pub static COMMUNICATION_LOG: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "communication_log",
        vec![
            Field::datetime("date").message("Invalid date"),
            Field::one_of("channel", CHANNELS),
            Field::text("summary").min(1.0).message("Summary is required"),
            Field::boolean("followUpRequired").default(false),
            Field::datetime("followUpDate").optional().nullable().message("Invalid follow-up date"),
            Field::uuid("clientId").message("Invalid client ID"),
            Field::uuid("employeeId").message("Invalid employee ID"),
        ],
    )
});

pub static UPDATE_COMMUNICATION_LOG: Lazy<Schema> =
    Lazy::new(|| COMMUNICATION_LOG.partial(PartialDefaults::Apply));

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requires_both_parties() {
        let err = COMMUNICATION_LOG
            .parse(&json!({
                "date": "2024-05-01T09:30:00Z",
                "channel": "phone",
                "summary": "Kick-off call",
                "clientId": "550e8400-e29b-41d4-a716-446655440000",
                "employeeId": ""
            }))
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.has_issue_for("employeeId"));
    }

    #[test]
    fn follow_up_defaults_to_false() {
        let data = COMMUNICATION_LOG
            .parse(&json!({
                "date": "2024-05-01T09:30:00+01:00",
                "channel": "video_call",
                "summary": "Review",
                "followUpDate": null,
                "clientId": "550e8400-e29b-41d4-a716-446655440000",
                "employeeId": "550e8400-e29b-41d4-a716-446655440002"
            }))
            .unwrap();
        assert_eq!(data["followUpRequired"], json!(false));
    }
}
