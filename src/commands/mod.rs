pub mod learn;
pub mod profiles;
pub mod recognize;
pub mod signature;
pub mod stitch;

use std::path::Path;

use anyhow::Result;
use tabrecon::SqliteProfileStore;

use crate::util::ensure_directory;

pub(crate) fn open_store(db_path: &Path) -> Result<SqliteProfileStore> {
    if let Some(parent) = db_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        ensure_directory(parent)?;
    }
    SqliteProfileStore::open(db_path)
}
