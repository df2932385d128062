//! Durable per-profile user identifier

use tracing::info;
use uuid::Uuid;

use crate::storage::KeyValueStore;
use crate::Result;

/// Storage key holding the user identifier
pub const USER_ID_KEY: &str = "medbot_user_id";

/// Generate a fresh identifier (UUID v4, lowercase hyphenated hex)
pub fn generate_user_id() -> String {
    Uuid::new_v4().to_string()
}

/// Read the stored identifier, generating and storing one if absent.
///
/// A blank stored value counts as absent. Once written, the identifier is
/// never rotated.
pub fn resolve_user_id(store: &mut dyn KeyValueStore) -> Result<String> {
    if let Some(existing) = store.get(USER_ID_KEY)? {
        if !existing.trim().is_empty() {
            return Ok(existing);
        }
    }

    let user_id = generate_user_id();
    store.set(USER_ID_KEY, &user_id)?;
    info!("Generated new user id {}", user_id);
    Ok(user_id)
}
