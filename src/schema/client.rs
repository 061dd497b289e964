use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema, GENDERS, PERSON_STATUSES, TITLES};

pub static CLIENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "client",
        vec![
            Field::one_of("title", TITLES).optional().default("mr"),
            Field::text("name").min(2.0).message("Name must be at least 2 characters"),
            Field::text("familyName").min(2.0).message("Family name must be at least 2 characters"),
            Field::one_of("gender", GENDERS).default("other"),
            Field::text("phoneNumber").min(1.0).message("Phone number is required"),
            Field::email("email").optional().or_empty().message("Invalid email address"),
            Field::number("totalContractValue").default(0),
            Field::date("joinDate").optional().nullable(),
            Field::uuid("companyId").optional().message("Invalid company ID"),
            Field::one_of("status", PERSON_STATUSES).default("active"),
        ],
    )
});

pub static UPDATE_CLIENT: Lazy<Schema> = Lazy::new(|| CLIENT.partial(PartialDefaults::Apply));
