use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema};

pub const MILESTONE_STATUSES: &[&str] = &["pending", "in_progress", "completed", "cancelled"];

pub static MILESTONE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "milestone",
        vec![
            Field::text("name").min(1.0).message("Name is required"),
            Field::text("description").optional().nullable(),
            Field::date("startDate").optional().nullable(),
            Field::date("finishDate").optional().nullable(),
            Field::date("completionDate").optional().nullable(),
            Field::one_of("status", MILESTONE_STATUSES).default("pending"),
            Field::uuid("projectId").message("Invalid project ID"),
            Field::integer("order").min(0.0).default(0),
        ],
    )
});

pub static UPDATE_MILESTONE: Lazy<Schema> = Lazy::new(|| MILESTONE.partial(PartialDefaults::Apply));
