use std::cell::RefCell;
use std::fs;
use std::path::Path;

use log::{debug, error, info};
use parking_lot::ReentrantMutex;
use rusqlite::{Connection, Row, Statement, ToSql};

use crate::error::StorageError;

pub const IN_MEMORY_PATH: &str = ":memory:";

/// Named placeholder bindings, e.g. `&[("$id", &id)]`.
pub type NamedParams<'a> = [(&'a str, &'a dyn ToSql)];

/// Maps one result row onto a caller-chosen shape.
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl FromRow for i64 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

/// Owns the single SQLite handle and is the only place raw SQL runs.
///
/// The handle sits behind a re-entrant lock: a unit of work passed to
/// [`DbContext::transaction`] keeps the lock for its whole duration, while the
/// statements it issues on the same thread re-acquire it freely.
pub struct DbContext {
    path: String,
    conn: ReentrantMutex<RefCell<Option<Connection>>>,
}

impl DbContext {
    pub fn open(path: &str) -> Result<Self, StorageError> {
        if path != IN_MEMORY_PATH {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        let conn = Connection::open(path)?;
        info!("Opened database at {}", path);

        Ok(DbContext {
            path: path.to_string(),
            conn: ReentrantMutex::new(RefCell::new(Some(conn))),
        })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::open(IN_MEMORY_PATH)
    }

    fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let guard = self.conn.lock();
        let cell = guard.borrow();
        let conn = cell.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }

    /// Runs a SELECT and returns every matching row.
    ///
    /// A placeholder name the statement does not declare yields an empty
    /// result rather than an error.
    pub fn query<T: FromRow>(
        &self,
        sql: &str,
        params: &NamedParams<'_>,
    ) -> Result<Vec<T>, StorageError> {
        debug!("query: {}", sql);
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            if !bind_named(&mut stmt, params)? {
                debug!("query: unknown placeholder, returning no rows");
                return Ok(Vec::new());
            }

            let mut rows = stmt.raw_query();
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(T::from_row(row)?);
            }
            Ok(results)
        })
    }

    /// Same as [`DbContext::query`] but only the first row, if any.
    pub fn query_one<T: FromRow>(
        &self,
        sql: &str,
        params: &NamedParams<'_>,
    ) -> Result<Option<T>, StorageError> {
        debug!("query_one: {}", sql);
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(sql)?;
            if !bind_named(&mut stmt, params)? {
                return Ok(None);
            }

            let mut rows = stmt.raw_query();
            let first = match rows.next()? {
                Some(row) => Some(T::from_row(row)?),
                None => None,
            };
            Ok(first)
        })
    }

    /// Runs one or more statements that return no rows (DDL, plain DML).
    pub fn execute(&self, sql: &str) -> Result<(), StorageError> {
        debug!("execute: {}", sql);
        self.with_connection(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Runs a single parameterized DML statement, returning the affected row count.
    pub fn execute_with(&self, sql: &str, params: &NamedParams<'_>) -> Result<usize, StorageError> {
        debug!("execute_with: {}", sql);
        self.with_connection(|conn| Ok(conn.execute(sql, params)?))
    }

    /// Identifier generated by the most recent INSERT on this handle.
    pub fn last_inserted_id(&self) -> Result<Option<i64>, StorageError> {
        let id = self.query_one::<i64>("SELECT last_insert_rowid() AS last_insert_rowid;", &[])?;
        Ok(id.filter(|id| *id > 0))
    }

    /// Runs `work` atomically: commit on `Ok`, rollback on `Err`.
    ///
    /// Transactions do not nest. Calling this from inside another unit of work
    /// on the same context fails at `BEGIN`.
    pub fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StorageError>,
    {
        let _guard = self.conn.lock();
        self.begin_transaction()?;

        match work() {
            Ok(value) => {
                if let Err(e) = self.commit_transaction() {
                    self.rollback_quietly();
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                self.rollback_quietly();
                Err(e)
            }
        }
    }

    fn rollback_quietly(&self) {
        if let Err(e) = self.rollback_transaction() {
            error!("Rollback failed: {}", e);
        }
    }

    pub fn begin_transaction(&self) -> Result<(), StorageError> {
        self.execute("BEGIN TRANSACTION")
    }

    pub fn commit_transaction(&self) -> Result<(), StorageError> {
        self.execute("COMMIT")
    }

    pub fn rollback_transaction(&self) -> Result<(), StorageError> {
        self.execute("ROLLBACK")
    }

    /// Releases the handle. Every later call returns [`StorageError::Closed`].
    pub fn close(&self) -> Result<(), StorageError> {
        let guard = self.conn.lock();
        let taken = guard.borrow_mut().take();
        match taken {
            Some(conn) => {
                info!("Closing database at {}", self.path);
                conn.close().map_err(|(_, e)| StorageError::from(e))
            }
            None => Ok(()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().borrow().is_none()
    }
}

/// Binds named parameters; `false` when a name is not declared by the statement.
fn bind_named(stmt: &mut Statement<'_>, params: &NamedParams<'_>) -> Result<bool, StorageError> {
    for (name, value) in params {
        match stmt.parameter_index(name)? {
            Some(index) => stmt.raw_bind_parameter(index, *value)?,
            None => return Ok(false),
        }
    }
    Ok(true)
}
