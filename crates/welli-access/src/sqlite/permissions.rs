//! SQLite permission store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};

use super::schema::{check_version, init_schema};
use crate::clock::{Clock, SystemClock};
use crate::error::{AccessError, AccessResult};
use crate::identity::{IDENTITY_LEN, Identity};
use crate::permission::{Permission, PermissionKey};
use crate::store::{CommitOutcome, PermissionChange, PermissionStore};

const SELECT_COLUMNS: &str = "SELECT owner, requester, cid, scope, expiry, active FROM permissions";

/// SQLite-backed permission store
///
/// Each commit runs in one transaction. Grants are a conditional upsert
/// that only touches inactive rows; revokes only touch active rows. A
/// statement that changes nothing is a failed guard and rolls the whole
/// transaction back.
pub struct SqlitePermissionStore {
    conn: Mutex<Connection>,
}

impl SqlitePermissionStore {
    /// Open or create a database at the given path
    pub fn open(path: impl AsRef<Path>) -> AccessResult<Self> {
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> AccessResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn schema_version(&self) -> AccessResult<u32> {
        check_version(&*self.lock()?)
    }

    fn lock(&self) -> AccessResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AccessError::storage("sqlite connection lock poisoned"))
    }

    fn list_where(&self, column: &str, identity: &Identity) -> AccessResult<Vec<Permission>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE {column} = ? ORDER BY owner, requester, cid"
        ))?;

        let rows = stmt
            .query_map([identity.as_bytes().as_slice()], read_permission)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

fn identity_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Identity> {
    let bytes: Vec<u8> = row.get(idx)?;
    let arr: [u8; IDENTITY_LEN] = bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, "identity".into(), Type::Blob))?;
    Ok(Identity::from_bytes(arr))
}

/// Expiry is stored big-endian so the whole `u64` range round-trips
fn expiry_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let bytes: Vec<u8> = row.get(idx)?;
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| rusqlite::Error::InvalidColumnType(idx, "expiry".into(), Type::Blob))?;
    Ok(u64::from_be_bytes(arr))
}

fn read_permission(row: &Row<'_>) -> rusqlite::Result<Permission> {
    Ok(Permission {
        owner: identity_column(row, 0)?,
        requester: identity_column(row, 1)?,
        cid: row.get(2)?,
        scope: row.get(3)?,
        expiry: expiry_column(row, 4)?,
        active: row.get(5)?,
    })
}

#[async_trait]
impl PermissionStore for SqlitePermissionStore {
    async fn get(&self, key: &PermissionKey) -> AccessResult<Option<Permission>> {
        let conn = self.lock()?;

        let permission = conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE owner = ? AND requester = ? AND cid = ?"),
                (
                    key.owner.as_bytes().as_slice(),
                    key.requester.as_bytes().as_slice(),
                    &key.cid,
                ),
                read_permission,
            )
            .optional()?;

        Ok(permission)
    }

    async fn commit(&self, changes: &[PermissionChange]) -> AccessResult<CommitOutcome> {
        let mut conn = self.lock()?;
        let now = SystemClock.now() as i64;
        let tx = conn.transaction()?;

        for (index, change) in changes.iter().enumerate() {
            let applied = match change {
                PermissionChange::Grant(p) => tx.execute(
                    r#"INSERT INTO permissions
                       (owner, requester, cid, scope, expiry, active, updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                       ON CONFLICT (owner, requester, cid) DO UPDATE SET
                           scope = excluded.scope,
                           expiry = excluded.expiry,
                           active = 1,
                           updated_at = excluded.updated_at
                       WHERE permissions.active = 0"#,
                    (
                        p.owner.as_bytes().as_slice(),
                        p.requester.as_bytes().as_slice(),
                        &p.cid,
                        &p.scope,
                        p.expiry.to_be_bytes().as_slice(),
                        now,
                    ),
                )?,
                PermissionChange::Revoke(key) => tx.execute(
                    r#"UPDATE permissions SET active = 0, updated_at = ?1
                       WHERE owner = ?2 AND requester = ?3 AND cid = ?4 AND active = 1"#,
                    (
                        now,
                        key.owner.as_bytes().as_slice(),
                        key.requester.as_bytes().as_slice(),
                        &key.cid,
                    ),
                )?,
            };

            if applied == 0 {
                // Dropping the transaction rolls it back
                return Ok(CommitOutcome::Conflict { index });
            }
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed)
    }

    async fn list_by_owner(&self, owner: &Identity) -> AccessResult<Vec<Permission>> {
        self.list_where("owner", owner)
    }

    async fn list_by_requester(&self, requester: &Identity) -> AccessResult<Vec<Permission>> {
        self.list_where("requester", requester)
    }
}
