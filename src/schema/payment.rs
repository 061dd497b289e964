use once_cell::sync::Lazy;

use super::{Field, PartialDefaults, Schema};

pub const PAYMENT_STATUSES: &[&str] = &["pending", "completed", "failed"];
pub const PAYMENT_METHODS: &[&str] = &["cash", "bank_transfer", "credit_card", "cheque"];

pub static PAYMENT: Lazy<Schema> = Lazy::new(|| {
    Schema::new(
        "payment",
        vec![
            Field::text("description").min(1.0).message("Description is required"),
            Field::number("amount").min(1.0).message("Amount must be at least 1"),
            Field::one_of("status", PAYMENT_STATUSES).default("pending"),
            Field::datetime("date").message("Invalid date"),
            Field::one_of("method", PAYMENT_METHODS),
            Field::uuid("projectId").message("Invalid project ID"),
        ],
    )
});

pub static UPDATE_PAYMENT: Lazy<Schema> = Lazy::new(|| PAYMENT.partial(PartialDefaults::Apply));
