//! A generic record-oriented database layer over SQLite.
//!
//! [`Database`] is the storage layer under the auxiliary data stores. It owns
//! one database connection and provides metadata key/value pairs plus simple
//! record operations: table creation from a column list, positional row
//! insertion, full-column projection, and equality-filtered reads. The
//! higher-level schema and semantics live in [`crate::store`].

use crate::error::{AuxError, Result};
use crate::utils;

use std::fs;
use std::path::Path;

use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, Row, ToSql};

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Column types for [`Database::create_table`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    /// UTF-8 text.
    Text,
    /// A numeric value.
    Numeric,
    /// A binary blob.
    Blob,
}

impl ColumnType {
    // SQL type name used in CREATE TABLE statements.
    fn sql(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Numeric => "numeric",
            ColumnType::Blob => "blob",
        }
    }
}

//-----------------------------------------------------------------------------

/// A connection to a record-oriented SQLite database.
///
/// A database stores its format version under key `version` in the metadata
/// table. [`Database::open`] checks the version and fails on a mismatch, so a
/// caller never reads records written in a format it does not understand.
///
/// Table and column names passed to the record operations are trusted and
/// spliced into the SQL; only values are bound as statement parameters.
/// In multi-threaded applications, each thread should have its own connection.
///
/// # Examples
///
/// ```
/// use aux_base::db::{ColumnType, Database};
///
/// let dir = tempfile::tempdir().unwrap();
/// let db_file = dir.path().join("test.db");
///
/// // Create a database and add a table with one row.
/// let database = Database::create(&db_file, "2").unwrap();
/// database.create_table(
///     "words", &[("word", ColumnType::Text), ("data", ColumnType::Blob)]
/// ).unwrap();
/// database.insert("words", &[&"key", &vec![1u8, 2, 3]]).unwrap();
/// database.close().unwrap();
///
/// // Reopen it and read the row back.
/// let database = Database::open(&db_file, "2").unwrap();
/// assert_eq!(database.version(), "2");
/// let rows = database.select_where(
///     "words", &["data"], "word", "key",
///     |row| row.get::<_, Vec<u8>>(0)
/// ).unwrap();
/// assert_eq!(rows, vec![vec![1u8, 2, 3]]);
/// database.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Database {
    connection: Connection,
    version: String,
}

impl Database {
    /// Name of the metadata key/value table.
    pub const META_TABLE: &'static str = "self";

    // Key for the format version in the metadata table.
    const KEY_VERSION: &'static str = "version";

    /// Creates a new database file with the given format version.
    ///
    /// A pre-existing file at the path is removed first. The new database
    /// contains the metadata table with the version as its only entry.
    ///
    /// # Errors
    ///
    /// Fails with [`AuxError::Open`] if the file cannot be created and with
    /// [`AuxError::Io`] if an old file cannot be removed.
    pub fn create<P: AsRef<Path>>(filename: P, version: &str) -> Result<Self> {
        let path = filename.as_ref();
        if utils::file_exists(path) {
            fs::remove_file(path)?;
        }
        let connection = Connection::open(path).map_err(
            |x| AuxError::Open { path: path.to_path_buf(), source: x }
        )?;

        let database = Database { connection, version: version.to_string() };
        database.connection.execute(
            &format!("CREATE TABLE {} (key text, value text)", Self::META_TABLE), ()
        )?;
        database.set_meta_value(Self::KEY_VERSION, version)?;
        Ok(database)
    }

    /// Opens a connection to the database in the given file.
    ///
    /// The file must exist and store the expected format version.
    ///
    /// # Errors
    ///
    /// Fails with [`AuxError::Open`] if the file cannot be opened or is not a
    /// database created by this crate, and with [`AuxError::Version`] if the
    /// stored format version is not `expected_version`.
    pub fn open<P: AsRef<Path>>(filename: P, expected_version: &str) -> Result<Self> {
        let path = filename.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let connection = Connection::open_with_flags(path, flags).map_err(
            |x| AuxError::Open { path: path.to_path_buf(), source: x }
        )?;

        let version = meta_value_from(&connection, Self::KEY_VERSION)
            .map_err(|x| open_error(path, x))?
            .unwrap_or_default();
        if version != expected_version {
            return Err(AuxError::Version { found: version, expected: expected_version.to_string() });
        }
        Ok(Database { connection, version })
    }

    /// Returns the format version of the database.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.connection.path()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        let filename = self.filename()?;
        utils::file_size(filename)
    }

    /// Sets the value for the given metadata key, replacing any old value.
    pub fn set_meta_value(&self, key: &str, value: &str) -> Result<()> {
        self.connection.execute(
            &format!("DELETE FROM {} WHERE key = ?1", Self::META_TABLE), (key,)
        )?;
        self.connection.execute(
            &format!("INSERT INTO {} (key, value) VALUES (?1, ?2)", Self::META_TABLE), (key, value)
        )?;
        Ok(())
    }

    /// Returns the value for the given metadata key, or [`None`] if the key is not set.
    pub fn meta_value(&self, key: &str) -> Result<Option<String>> {
        meta_value_from(&self.connection, key)
    }

    /// Creates a table from a list of column names and types.
    pub fn create_table(&self, name: &str, columns: &[(&str, ColumnType)]) -> Result<()> {
        let columns: Vec<String> = columns.iter().map(
            |(column, column_type)| format!("{} {}", column, column_type.sql())
        ).collect();
        self.connection.execute(
            &format!("CREATE TABLE {} ({})", name, columns.join(", ")), ()
        )?;
        Ok(())
    }

    /// Inserts one row into the table, with values given in column order.
    pub fn insert(&self, table: &str, values: &[&dyn ToSql]) -> Result<()> {
        let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("?{}", i)).collect();
        self.connection.execute(
            &format!("INSERT INTO {} VALUES ({})", table, placeholders.join(", ")), values
        )?;
        Ok(())
    }

    /// Returns all values in one text column of the table, in storage order.
    ///
    /// Duplicate values are returned as-is; collapsing them is up to the caller.
    pub fn single_column(&self, table: &str, column: &str) -> Result<Vec<String>> {
        let mut statement = self.connection.prepare(
            &format!("SELECT {} FROM {}", column, table)
        )?;
        let mut result: Vec<String> = Vec::new();
        let mut rows = statement.query(())?;
        while let Some(row) = rows.next()? {
            result.push(row.get(0)?);
        }
        Ok(result)
    }

    /// Returns the rows where `key_column` equals `key`, projected to the given
    /// columns and converted with the row mapper.
    ///
    /// The rows are returned in storage order. A key with no matching rows
    /// yields an empty vector.
    pub fn select_where<T, F>(
        &self, table: &str, columns: &[&str],
        key_column: &str, key: &str,
        mut mapper: F
    ) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut statement = self.connection.prepare(
            &format!("SELECT {} FROM {} WHERE {} = ?1", columns.join(", "), table, key_column)
        )?;
        let mut result: Vec<T> = Vec::new();
        let mut rows = statement.query((key,))?;
        while let Some(row) = rows.next()? {
            result.push(mapper(row)?);
        }
        Ok(result)
    }

    /// Closes the connection to the database.
    ///
    /// Dropping the database also releases the connection; closing explicitly
    /// reports errors instead of discarding them.
    pub fn close(self) -> Result<()> {
        self.connection.close().map_err(|(_, x)| AuxError::from(x))
    }
}

//-----------------------------------------------------------------------------

/// Type of a potential database file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseFileType {
    /// The file does not exist.
    Missing,
    /// The file is not a valid SQLite database.
    NotDatabase,
    /// The file is an SQLite database without the metadata this crate expects.
    UnknownDatabase,
    /// The file is a known database with the given format version.
    Version(String),
}

/// Determines the type of the given file, which may be a database.
///
/// This is a diagnostic helper for error messages and tooling. It never fails;
/// files that cannot be interpreted map to the corresponding
/// [`DatabaseFileType`] variant.
pub fn identify_database<P: AsRef<Path>>(filename: P) -> DatabaseFileType {
    match fs::metadata(&filename) {
        Ok(metadata) if metadata.is_file() => (),
        Ok(_) => return DatabaseFileType::NotDatabase,
        Err(_) => return DatabaseFileType::Missing,
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let connection = match Connection::open_with_flags(filename, flags) {
        Ok(connection) => connection,
        Err(_) => return DatabaseFileType::NotDatabase,
    };

    // SQLite reads the file header lazily, so corruption may only surface here.
    match meta_value_from(&connection, Database::KEY_VERSION) {
        Ok(Some(version)) => DatabaseFileType::Version(version),
        Ok(None) => DatabaseFileType::UnknownDatabase,
        Err(AuxError::Database(rusqlite::Error::SqliteFailure(error, _)))
            if error.code == ErrorCode::NotADatabase => DatabaseFileType::NotDatabase,
        Err(_) => DatabaseFileType::UnknownDatabase,
    }
}

//-----------------------------------------------------------------------------

// Returns the value for the given metadata key, if present.
fn meta_value_from(connection: &Connection, key: &str) -> Result<Option<String>> {
    let mut statement = connection.prepare(
        &format!("SELECT value FROM {} WHERE key = ?1", Database::META_TABLE)
    )?;
    let result = statement.query_row((key,), |row| row.get(0)).optional()?;
    Ok(result)
}

// Remaps database errors raised while opening a file to open errors naming the path.
fn open_error(path: &Path, error: AuxError) -> AuxError {
    match error {
        AuxError::Database(source) => AuxError::Open { path: path.to_path_buf(), source },
        other => other,
    }
}

//-----------------------------------------------------------------------------
