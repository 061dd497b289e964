pub const TABLE: &str = "milestones";
