//! Permission table layout and version bookkeeping

use rusqlite::{Connection, OptionalExtension};

use crate::error::{AccessError, AccessResult};

pub const SCHEMA_VERSION: u32 = 1;

const PERMISSIONS_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER PRIMARY KEY
    );

    -- Keyed by (owner, requester, cid); a revoke clears `active` in place
    CREATE TABLE IF NOT EXISTS permissions (
        owner      BLOB    NOT NULL CHECK (length(owner) = 20),
        requester  BLOB    NOT NULL CHECK (length(requester) = 20),
        cid        TEXT    NOT NULL CHECK (cid <> ''),
        scope      TEXT    NOT NULL,
        expiry     BLOB    NOT NULL CHECK (length(expiry) = 8),
        active     INTEGER NOT NULL CHECK (active IN (0, 1)),
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (owner, requester, cid)
    ) WITHOUT ROWID;

    CREATE INDEX IF NOT EXISTS permissions_by_requester
        ON permissions(requester, owner, cid);
"#;

/// Create the tables if needed and stamp the current version
///
/// A database written by a newer schema is refused rather than downgraded.
pub fn init_schema(conn: &Connection) -> AccessResult<()> {
    conn.execute_batch(PERMISSIONS_DDL)?;

    let found = check_version(conn)?;
    if found > SCHEMA_VERSION {
        return Err(AccessError::storage(format!(
            "database schema v{found} is newer than supported v{SCHEMA_VERSION}"
        )));
    }
    if found < SCHEMA_VERSION {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION],
        )?;
    }

    Ok(())
}

/// Highest recorded schema version, 0 for a fresh database
pub fn check_version(conn: &Connection) -> AccessResult<u32> {
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_stamps_version_once() {
        let conn = fresh();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(check_version(&conn).unwrap(), SCHEMA_VERSION);
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_refuses_newer_schema() {
        let conn = fresh();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [SCHEMA_VERSION + 1],
        )
        .unwrap();

        let err = init_schema(&conn).unwrap_err();
        assert!(err.is_infrastructure());
    }

    #[test]
    fn test_rejects_malformed_rows() {
        let conn = fresh();
        init_schema(&conn).unwrap();

        let short_owner = conn.execute(
            "INSERT INTO permissions VALUES (x'01', zeroblob(20), 'c', 's', zeroblob(8), 1, 0)",
            [],
        );
        assert!(short_owner.is_err());
    }
}
