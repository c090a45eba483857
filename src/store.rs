use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row, params};
use tracing::debug;

use crate::model::{Orientation, PennyRecord};
use crate::util::{now_utc_string, sha256_hex};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

const SELECT_COLUMNS: &str = "
    digest, state, city, neighborhood, location, name, orientation, coin_type,
    year, retired, position, source, created_at
";

/// Digest over the five identity fields. Exact case is kept, so
/// `World of Disney` and `World Of Disney` hash differently.
pub fn hash_record(record: &PennyRecord) -> String {
    let key = format!(
        "{}|{}|{}|{}|{}",
        record.state,
        record.city,
        record.location,
        record.name,
        record.orientation.as_str()
    );
    sha256_hex(&key)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPenny {
    pub digest: String,
    pub record: PennyRecord,
    pub created_at: String,
}

pub struct PennyStore {
    connection: Connection,
}

impl PennyStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let connection = Connection::open(db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        configure_connection(&connection)?;
        Self::from_connection(connection)
    }

    /// Opens an existing store for lookups without touching its schema.
    pub fn open_read_only(db_path: &Path) -> Result<Self> {
        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open database read-only: {}", db_path.display()))?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory database")?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn contains(&self, digest: &str) -> Result<bool> {
        let found = self
            .connection
            .query_row(
                "SELECT 1 FROM pennies WHERE digest = ?1 LIMIT 1",
                [digest],
                |_| Ok(()),
            )
            .optional()
            .context("failed to look up digest")?;
        Ok(found.is_some())
    }

    /// Returns `false` when the digest was already present.
    pub fn add(&self, record: &PennyRecord, digest: &str) -> Result<bool> {
        let inserted = insert_record(&self.connection, record, digest, &now_utc_string())?;
        Ok(inserted)
    }

    /// Keeps the records whose digest is neither stored nor seen earlier in
    /// the same slice. Never writes.
    pub fn filter_new(&self, records: &[PennyRecord]) -> Result<Vec<PennyRecord>> {
        let mut seen = HashSet::<String>::new();
        let mut fresh = Vec::new();

        for record in records {
            let digest = hash_record(record);
            if !seen.insert(digest.clone()) {
                continue;
            }
            if self.contains(&digest)? {
                continue;
            }
            fresh.push(record.clone());
        }

        Ok(fresh)
    }

    /// Writes every record in one transaction; returns how many were new.
    pub fn commit(&mut self, records: &[PennyRecord]) -> Result<usize> {
        let created_at = now_utc_string();
        let tx = self
            .connection
            .transaction()
            .context("failed to begin store transaction")?;

        let mut inserted = 0_usize;
        for record in records {
            let digest = hash_record(record);
            if insert_record(&tx, record, &digest, &created_at)? {
                inserted += 1;
            } else {
                debug!(digest = %digest, name = %record.name, "record already stored");
            }
        }

        tx.commit().context("failed to commit store transaction")?;
        Ok(inserted)
    }

    pub fn get(&self, digest: &str) -> Result<Option<StoredPenny>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM pennies WHERE digest = ?1");
        let stored = self
            .connection
            .query_row(&sql, [digest], stored_from_row)
            .optional()
            .with_context(|| format!("failed to load record {digest}"))?;
        Ok(stored)
    }

    pub fn by_state(&self, state: &str) -> Result<Vec<StoredPenny>> {
        self.select_where("state = ?1 ORDER BY year, city, position", state)
    }

    pub fn by_year(&self, year: &str) -> Result<Vec<StoredPenny>> {
        self.select_where("year = ?1 ORDER BY state, city, position", year)
    }

    /// `since` is an RFC 3339 UTC timestamp, compared against `created_at`.
    pub fn added_since(&self, since: &str) -> Result<Vec<StoredPenny>> {
        self.select_where("created_at > ?1 ORDER BY created_at DESC, id DESC", since)
    }

    pub fn count(&self) -> Result<i64> {
        let count = self
            .connection
            .query_row("SELECT COUNT(*) FROM pennies", [], |row| row.get(0))
            .context("failed to count records")?;
        Ok(count)
    }

    pub fn latest_added_at(&self) -> Result<Option<String>> {
        let latest = self
            .connection
            .query_row("SELECT MAX(created_at) FROM pennies", [], |row| row.get(0))
            .context("failed to read latest created_at")?;
        Ok(latest)
    }

    pub fn metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .connection
            .query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
            .with_context(|| format!("failed to read metadata key {key}"))?;
        Ok(value)
    }

    fn select_where(&self, clause: &str, value: &str) -> Result<Vec<StoredPenny>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM pennies WHERE {clause}");
        let mut statement = self.connection.prepare(&sql)?;
        let mut rows = statement.query([value])?;
        let mut out = Vec::new();

        while let Some(row) = rows.next()? {
            out.push(stored_from_row(row)?);
        }

        Ok(out)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS pennies (
              id INTEGER PRIMARY KEY,
              digest TEXT NOT NULL UNIQUE,
              state TEXT NOT NULL,
              city TEXT NOT NULL,
              neighborhood TEXT NOT NULL,
              location TEXT NOT NULL,
              name TEXT NOT NULL,
              orientation TEXT NOT NULL,
              coin_type TEXT NOT NULL,
              year TEXT NOT NULL,
              retired INTEGER NOT NULL DEFAULT 0,
              position INTEGER NOT NULL,
              source TEXT NOT NULL,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_pennies_digest ON pennies(digest);
            CREATE INDEX IF NOT EXISTS idx_pennies_state ON pennies(state);
            CREATE INDEX IF NOT EXISTS idx_pennies_year ON pennies(year);
            CREATE INDEX IF NOT EXISTS idx_pennies_created_at ON pennies(created_at);
            ",
        )
        .context("failed to initialize store schema")?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_opened_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    Ok(())
}

fn insert_record(
    connection: &Connection,
    record: &PennyRecord,
    digest: &str,
    created_at: &str,
) -> Result<bool> {
    let changed = connection
        .execute(
            "
            INSERT INTO pennies(
              digest, state, city, neighborhood, location, name, orientation,
              coin_type, year, retired, position, source, created_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(digest) DO NOTHING
            ",
            params![
                digest,
                record.state,
                record.city,
                record.neighborhood,
                record.location,
                record.name,
                record.orientation.as_str(),
                record.coin_type,
                record.year,
                record.retired,
                i64::from(record.position),
                record.source,
                created_at,
            ],
        )
        .with_context(|| format!("failed to insert record {digest}"))?;

    Ok(changed > 0)
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredPenny> {
    let orientation: String = row.get(6)?;
    let position: i64 = row.get(10)?;

    Ok(StoredPenny {
        digest: row.get(0)?,
        record: PennyRecord {
            state: row.get(1)?,
            city: row.get(2)?,
            neighborhood: row.get(3)?,
            location: row.get(4)?,
            name: row.get(5)?,
            orientation: Orientation::from_stored(&orientation),
            coin_type: row.get(7)?,
            year: row.get(8)?,
            retired: row.get(9)?,
            position: u32::try_from(position).unwrap_or_default(),
            source: row.get(11)?,
        },
        created_at: row.get(12)?,
    })
}
