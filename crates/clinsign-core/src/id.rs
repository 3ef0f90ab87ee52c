use uuid::Uuid;

/// Generate a new entity identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
