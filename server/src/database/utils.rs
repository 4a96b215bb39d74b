use chrono::Utc;

/// Get current Unix timestamp in seconds
pub fn get_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Generate a document id (UUID v4)
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
