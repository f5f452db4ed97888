use anyhow::Result;
use tabrecon::ProfileStore;
use tracing::{info, warn};

use crate::cli::ProfilesArgs;
use crate::commands::open_store;
use crate::util::emit_json;

pub fn run(args: ProfilesArgs) -> Result<()> {
    if !args.db.exists() {
        warn!(path = %args.db.display(), "profile database missing");
        return Ok(());
    }

    let store = open_store(&args.db)?;
    let profiles = store.list(&args.owner)?;

    info!(
        path = %args.db.display(),
        schema_version = %store.schema_version()?.unwrap_or_default(),
        owner = %args.owner,
        owner_profiles = profiles.len(),
        all_profiles = store.count_profiles(None)?,
        "profile store status"
    );

    for profile in &profiles {
        info!(
            signature = %profile.signature,
            headers = %profile.headers.join(" | "),
            usage_count = profile.usage_count,
            confidence = profile.confidence,
            last_used = %profile.last_used.to_rfc3339(),
            "learned format"
        );
    }

    if args.json {
        emit_json(None, &profiles)?;
    }
    Ok(())
}
