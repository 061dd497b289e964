use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema};

pub static COMPANY: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "company",
        vec![
            Field::text("name").min(3.0).message("Company name must be at least 3 characters"),
            Field::email("email").message("Invalid email address"),
            Field::text("address").min(3.0).message("Address must be at least 3 characters"),
            Field::text("phoneNumber").min(9.0).message("Phone number must be at least 9 characters"),
            Field::text("contactPerson").optional().nullable(),
            Field::text("industry").optional().nullable(),
            Field::text("status").default("active"),
        ],
    )
});

pub static UPDATE_COMPANY: Lazy<Schema> = Lazy::new(|| COMPANY.partial(PartialDefaults::Apply));
