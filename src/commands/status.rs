use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::store::{DB_SCHEMA_VERSION, PennyStore};

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = &args.db_path;
    info!(path = %db_path.display(), "status requested");

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let store = PennyStore::open_read_only(db_path)?;
    let schema_version = store.metadata("db_schema_version")?.unwrap_or_default();
    if schema_version != DB_SCHEMA_VERSION {
        warn!(
            found = %schema_version,
            expected = DB_SCHEMA_VERSION,
            "database schema version differs from this build"
        );
    }

    info!(
        path = %db_path.display(),
        records = store.count()?,
        schema_version = %schema_version,
        opened_at = %store.metadata("db_opened_at")?.unwrap_or_default(),
        last_added_at = %store.latest_added_at()?.unwrap_or_default(),
        "database status"
    );

    Ok(())
}
