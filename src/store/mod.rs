mod memory;
mod sqlite;

use anyhow::Result;

use crate::model::FormatProfile;

pub use memory::MemoryProfileStore;
pub use sqlite::{DB_SCHEMA_VERSION, SqliteProfileStore};

/// Persistence contract for format profiles, partitioned by owner scope.
///
/// `upsert` must be atomic per `(owner_scope_id, signature)`: saving a
/// signature that already exists bumps `usage_count`, refreshes `last_used`
/// and replaces the learned content instead of adding a second row. `list`
/// returns profiles in a stable order (creation order) so fuzzy matching
/// breaks ties deterministically.
pub trait ProfileStore: Send + Sync {
    fn upsert(&self, owner_scope_id: &str, profile: &FormatProfile) -> Result<FormatProfile>;

    fn list(&self, owner_scope_id: &str) -> Result<Vec<FormatProfile>>;

    fn get_by_signature(
        &self,
        owner_scope_id: &str,
        signature: &str,
    ) -> Result<Option<FormatProfile>>;
}
