use once_cell::sync::Lazy;

use super::{Field, Schema};

pub static PROJECT_MEMBER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "project_member",
        vec![
            Field::uuid("userId").message("Invalid user ID"),
            Field::text("role").optional().nullable(),
        ],
    )
});

pub static MILESTONE_MEMBER: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "milestone_member",
        vec![
            Field::uuid("employeeId").message("Invalid employee ID"),
            Field::text("role").optional().nullable(),
        ],
    )
});
