use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema, GENDERS, PERSON_STATUSES, TITLES};

pub static EMPLOYEE: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "employee",
        vec![
            Field::one_of("title", TITLES).optional().default("mr"),
            Field::text("name").min(2.0).message("Name must be at least 2 characters"),
            Field::text("familyName").min(2.0).message("Family name must be at least 2 characters"),
            Field::text("preferredName").optional().nullable(),
            Field::one_of("gender", GENDERS).default("other"),
            Field::text("phoneNumber").min(1.0).message("Phone number is required"),
            Field::email("email").message("Invalid email address"),
            Field::text("photo").optional().nullable(),
            Field::text("department").optional().nullable(),
            Field::text("position").optional().nullable(),
            Field::text("address").optional().nullable(),
            Field::uuid("userId").optional().nullable().message("Invalid user ID"),
            Field::date("joinDate").optional().nullable(),
            Field::text("emergencyContact").optional().nullable(),
            Field::text("emergencyPhone").optional().nullable(),
            Field::one_of("status", PERSON_STATUSES).default("active"),
        ],
    )
});

pub static UPDATE_EMPLOYEE: Lazy<Schema> = Lazy::new(|| EMPLOYEE.partial(PartialDefaults::Apply));
