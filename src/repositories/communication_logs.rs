pub const TABLE: &str = "communication_logs";
