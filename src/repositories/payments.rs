pub const TABLE: &str = "payments";
