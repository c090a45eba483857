use std::fs::File;
use std::io::{self, BufWriter};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use crate::cli::QueryArgs;
use crate::commands::parse::write_records_to;
use crate::model::PennyRecord;
use crate::store::{PennyStore, StoredPenny};

pub fn run(args: QueryArgs) -> Result<()> {
    let db_path = &args.db_path;
    if !db_path.exists() {
        bail!("database does not exist: {}", db_path.display());
    }
    let store = PennyStore::open_read_only(db_path)?;

    let matches = select(&store, &args)?;
    let records: Vec<PennyRecord> = matches.into_iter().map(|stored| stored.record).collect();

    info!(
        path = %db_path.display(),
        state = ?args.state,
        year = ?args.year,
        since = ?args.since,
        digest = ?args.digest,
        results = records.len(),
        "query completed"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_records_to(BufWriter::new(file), &records)?;
            info!(path = %path.display(), "wrote query results");
        }
        None => write_records_to(BufWriter::new(io::stdout().lock()), &records)?,
    }

    Ok(())
}

fn select(store: &PennyStore, args: &QueryArgs) -> Result<Vec<StoredPenny>> {
    if let Some(digest) = &args.digest {
        return Ok(store.get(digest)?.into_iter().collect());
    }
    if let Some(state) = &args.state {
        return store.by_state(state);
    }
    if let Some(year) = &args.year {
        return store.by_year(year);
    }
    if let Some(since) = &args.since {
        let since = DateTime::parse_from_rfc3339(since)
            .with_context(|| format!("--since must be an RFC 3339 timestamp, got '{since}'"))?
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        return store.added_since(&since);
    }
    bail!("one of --digest, --state, --year or --since is required")
}
