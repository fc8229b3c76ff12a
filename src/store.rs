//! Auxiliary databases for per-base data: split coverages and nucleotide position info.
//!
//! An auxiliary database stores variable-length numeric arrays as binary blobs
//! in a single SQLite file, addressed by string keys. [`CoverageBase`] stores
//! the coverage values of each split in each sample, while [`NtPositionBase`]
//! stores one position info array per contig. Every database is stamped with
//! the hash of the contigs database it belongs to, and opening it with another
//! hash fails unless the check is skipped explicitly.

use crate::db::{ColumnType, Database};
use crate::error::{AuxError, Result};
use crate::progress::{Progress, SilentProgress};
use crate::utils::{self, Element};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::ToSql;


//-----------------------------------------------------------------------------

/// Current auxiliary data format version.
pub const VERSION: &str = "2";

// Key for the database type.
const KEY_DB_TYPE: &str = "db_type";

// Key for the hash of the contigs database.
const KEY_HASH: &str = "contigs_db_hash";

// Key for the creation time.
const KEY_CREATION_DATE: &str = "creation_date";

//-----------------------------------------------------------------------------

/// Parameters for opening or creating an auxiliary database.
///
/// The constructors cover the common cases, and the fields can be adjusted
/// directly for the rest.
///
/// # Examples
///
/// ```
/// use aux_base::OpenParams;
///
/// let params = OpenParams::open_existing("auxiliary.db", "hash-1");
/// assert!(!params.create_new);
///
/// // Tolerate a foreign hash in an existing database.
/// let mut params = OpenParams::open_existing("auxiliary.db", "hash-1");
/// params.skip_hash_check = true;
/// ```
#[derive(Clone, Debug)]
pub struct OpenParams {
    /// Name of the database file.
    pub path: PathBuf,
    /// Hash of the contigs database this auxiliary database belongs to.
    pub owner_hash: String,
    /// Create a new database file instead of opening an existing one.
    pub create_new: bool,
    /// Do not compare the stored hash to [`OpenParams::owner_hash`] when opening.
    pub skip_hash_check: bool,
}

impl OpenParams {
    /// Returns parameters for opening the existing database in file `path`,
    /// checking that it belongs to the contigs database with the given hash.
    pub fn open_existing<P: AsRef<Path>>(path: P, owner_hash: &str) -> Self {
        OpenParams {
            path: path.as_ref().to_path_buf(),
            owner_hash: owner_hash.to_string(),
            create_new: false,
            skip_hash_check: false,
        }
    }

    /// Returns parameters for creating a new database in file `path`, stamped
    /// with the given contigs database hash.
    pub fn create_new<P: AsRef<Path>>(path: P, owner_hash: &str) -> Self {
        OpenParams {
            path: path.as_ref().to_path_buf(),
            owner_hash: owner_hash.to_string(),
            create_new: true,
            skip_hash_check: false,
        }
    }
}

//-----------------------------------------------------------------------------

// Identity and table layout of one database variant.
struct StoreSchema {
    db_type: &'static str,
    table: &'static str,
    key_columns: &'static [&'static str],
    data_column: &'static str,
}

static COVERAGE_SCHEMA: StoreSchema = StoreSchema {
    db_type: CoverageBase::DB_TYPE,
    table: "split_coverages",
    key_columns: &["split_name", "sample_name"],
    data_column: "coverages",
};

static NT_POSITION_SCHEMA: StoreSchema = StoreSchema {
    db_type: NtPositionBase::DB_TYPE,
    table: "nt_position_info",
    key_columns: &["contig_name"],
    data_column: "position_info",
};

// The shared core of the two database variants. The element type fixes the
// width of the stored values, and the schema fixes the table layout. Policy
// differences between the variants live in the public wrappers.
struct ArrayStore<T: Element> {
    db: Database,
    schema: &'static StoreSchema,
    db_type: String,
    owner_hash: String,
    creation_date: String,
    progress: Box<dyn Progress>,
    _element: PhantomData<T>,
}

impl<T: Element> ArrayStore<T> {
    // Creates or opens the database, as described by the parameters.
    fn open(schema: &'static StoreSchema, params: &OpenParams, progress: Box<dyn Progress>) -> Result<Self> {
        if params.create_new {
            let db = Database::create(&params.path, VERSION)?;
            let creation_date = unix_time();
            db.set_meta_value(KEY_DB_TYPE, schema.db_type)?;
            db.set_meta_value(KEY_HASH, &params.owner_hash)?;
            db.set_meta_value(KEY_CREATION_DATE, &creation_date)?;
            let mut columns: Vec<(&str, ColumnType)> = Vec::with_capacity(schema.key_columns.len() + 1);
            for column in schema.key_columns {
                columns.push((*column, ColumnType::Text));
            }
            columns.push((schema.data_column, ColumnType::Blob));
            db.create_table(schema.table, &columns)?;
            return Ok(ArrayStore {
                db,
                schema,
                db_type: schema.db_type.to_string(),
                owner_hash: params.owner_hash.clone(),
                creation_date,
                progress,
                _element: PhantomData,
            });
        }

        let db = Database::open(&params.path, VERSION)?;
        let db_type = db.meta_value(KEY_DB_TYPE)?.unwrap_or_default();
        let owner_hash = db.meta_value(KEY_HASH)?.unwrap_or_default();
        let creation_date = db.meta_value(KEY_CREATION_DATE)?.unwrap_or_default();
        if !params.skip_hash_check && owner_hash != params.owner_hash {
            return Err(AuxError::HashMismatch {
                stored: owner_hash,
                expected: params.owner_hash.clone(),
            });
        }
        Ok(ArrayStore {
            db, schema, db_type, owner_hash, creation_date, progress,
            _element: PhantomData,
        })
    }

    // Serializes the values and inserts one row with the given key columns.
    fn append(&self, keys: &[&str], values: &[T]) -> Result<()> {
        let blob = utils::encode_array(values);
        let mut row: Vec<&dyn ToSql> = Vec::with_capacity(keys.len() + 1);
        for key in keys {
            row.push(key);
        }
        row.push(&blob);
        self.db.insert(self.schema.table, &row)
    }

    // Returns the distinct values in the primary key column.
    fn known_keys(&self) -> Result<BTreeSet<String>> {
        let keys = self.db.single_column(self.schema.table, self.schema.key_columns[0])?;
        Ok(keys.into_iter().collect())
    }

    // Returns true if at least one row matches the given primary key.
    fn contains(&self, key: &str) -> Result<bool> {
        let rows = self.db.select_where(
            self.schema.table, &[self.schema.key_columns[0]], self.schema.key_columns[0], key,
            |_| Ok(())
        )?;
        Ok(!rows.is_empty())
    }

    // Returns the rows matching the given primary key as pairs of secondary
    // key and decoded values. Only valid for schemas with two key columns.
    fn fetch_with_labels(&self, key: &str) -> Result<Vec<(String, Vec<T>)>> {
        let columns = [self.schema.key_columns[1], self.schema.data_column];
        let rows: Vec<(String, Vec<u8>)> = self.db.select_where(
            self.schema.table, &columns, self.schema.key_columns[0], key,
            |row| Ok((row.get(0)?, row.get(1)?))
        )?;
        let mut result = Vec::with_capacity(rows.len());
        for (label, blob) in rows {
            result.push((label, utils::decode_array(&blob)?));
        }
        Ok(result)
    }

    // Returns the decoded values from the rows matching the given primary key.
    fn fetch_values(&self, key: &str) -> Result<Vec<Vec<T>>> {
        let blobs: Vec<Vec<u8>> = self.db.select_where(
            self.schema.table, &[self.schema.data_column], self.schema.key_columns[0], key,
            |row| row.get(0)
        )?;
        let mut result = Vec::with_capacity(blobs.len());
        for blob in blobs {
            result.push(utils::decode_array(&blob)?);
        }
        Ok(result)
    }

    fn close(self) -> Result<()> {
        self.db.close()
    }
}

// Implemented by hand because the progress context has no Debug representation.
impl<T: Element> fmt::Debug for ArrayStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayStore")
            .field("db", &self.db)
            .field("db_type", &self.db_type)
            .field("owner_hash", &self.owner_hash)
            .field("creation_date", &self.creation_date)
            .finish_non_exhaustive()
    }
}

//-----------------------------------------------------------------------------

/// A database of per-base coverage values in the splits of a contigs database.
///
/// Each row stores the coverage values of one split in one sample, as a
/// variable-length array of 16-bit unsigned integers. A split usually has one
/// row per sample. The database is append-only: rows are never updated or
/// deleted, and appending the same split and sample pair again stores a
/// second row.
///
/// Reads address a split by name. Unlike in [`NtPositionBase`], asking for a
/// split the database does not contain is an error.
///
/// # Examples
///
/// ```
/// use aux_base::{CoverageBase, OpenParams};
///
/// let dir = tempfile::tempdir().unwrap();
/// let db_file = dir.path().join("coverage.db");
///
/// // Create a database and store the coverage values of one split.
/// let params = OpenParams::create_new(&db_file, "hash-1");
/// let database = CoverageBase::open(&params).unwrap();
/// database.append("split_A", "sample_1", &[3, 5, 5, 2]).unwrap();
/// database.append("split_A", "sample_2", &[0, 0, 1]).unwrap();
/// database.close().unwrap();
///
/// // Open the database again and read the values back.
/// let params = OpenParams::open_existing(&db_file, "hash-1");
/// let database = CoverageBase::open(&params).unwrap();
/// let coverages = database.get("split_A").unwrap();
/// assert_eq!(coverages.get("sample_1"), Some(&vec![3, 5, 5, 2]));
/// assert_eq!(coverages.get("sample_2"), Some(&vec![0, 0, 1]));
/// database.close().unwrap();
/// ```
#[derive(Debug)]
pub struct CoverageBase {
    store: ArrayStore<u16>,
}

impl CoverageBase {
    /// Database type stored in the metadata.
    pub const DB_TYPE: &'static str = "auxiliary data for coverages";

    /// Opens the database described by the parameters.
    ///
    /// Creates a new database file if [`OpenParams::create_new`] is set and
    /// opens an existing one otherwise. Nothing is reported during batch
    /// reads; use [`CoverageBase::open_with_progress`] for that.
    ///
    /// # Errors
    ///
    /// Fails with [`AuxError::HashMismatch`] if an existing database carries
    /// a hash other than [`OpenParams::owner_hash`] and the check is not
    /// skipped. Fails with [`AuxError::Open`] or [`AuxError::Version`] if the
    /// file cannot be used as a database.
    pub fn open(params: &OpenParams) -> Result<Self> {
        Self::open_with_progress(params, Box::new(SilentProgress))
    }

    /// Opens the database described by the parameters and reports batch reads
    /// to the given progress context.
    ///
    /// Same errors as [`CoverageBase::open`].
    pub fn open_with_progress(params: &OpenParams, progress: Box<dyn Progress>) -> Result<Self> {
        let store = ArrayStore::open(&COVERAGE_SCHEMA, params, progress)?;
        Ok(CoverageBase { store })
    }

    /// Stores the coverage values of the given split in the given sample.
    pub fn append(&self, split_name: &str, sample_name: &str, coverages: &[u16]) -> Result<()> {
        self.store.append(&[split_name, sample_name], coverages)
    }

    /// Returns the names of the splits with stored coverage values.
    pub fn known_splits(&self) -> Result<BTreeSet<String>> {
        self.store.known_keys()
    }

    /// Returns the coverage values of the given split in each sample.
    ///
    /// If the same split and sample pair was appended more than once, the
    /// result contains the values stored last.
    ///
    /// # Errors
    ///
    /// Fails with [`AuxError::UnknownSplit`] if the database does not contain
    /// the split.
    pub fn get(&self, split_name: &str) -> Result<BTreeMap<String, Vec<u16>>> {
        let rows = self.store.fetch_with_labels(split_name)?;
        if rows.is_empty() {
            return Err(AuxError::UnknownSplit(split_name.to_string()));
        }
        let mut result = BTreeMap::new();
        for (sample_name, coverages) in rows {
            result.insert(sample_name, coverages);
        }
        Ok(result)
    }

    /// Returns the coverage values for each of the given splits, as a map
    /// from split name to the result of [`CoverageBase::get`].
    ///
    /// Progress is reported to the context given at open time.
    ///
    /// # Errors
    ///
    /// Fails with [`AuxError::UnknownSplit`] if any of the splits is absent
    /// from the database, even if the others are present.
    pub fn get_many(&mut self, split_names: &[&str]) -> Result<BTreeMap<String, BTreeMap<String, Vec<u16>>>> {
        self.store.progress.start("Recovering split coverages");
        let mut result = BTreeMap::new();
        for split_name in split_names {
            self.store.progress.update(&format!("Processing split {}", split_name));
            match self.get(split_name) {
                Ok(coverages) => {
                    result.insert(split_name.to_string(), coverages);
                },
                Err(x) => {
                    self.store.progress.end();
                    return Err(x);
                },
            }
        }
        self.store.progress.end();
        Ok(result)
    }

    /// Returns the coverage values for every known split, as in
    /// [`CoverageBase::get_many`].
    pub fn get_all(&mut self) -> Result<BTreeMap<String, BTreeMap<String, Vec<u16>>>> {
        let known = self.known_splits()?;
        let names: Vec<&str> = known.iter().map(|name| name.as_str()).collect();
        self.get_many(&names)
    }

    /// Returns the auxiliary data format version of the database.
    pub fn version(&self) -> &str {
        self.store.db.version()
    }

    /// Returns the database type from the metadata.
    pub fn db_type(&self) -> &str {
        &self.store.db_type
    }

    /// Returns the stored hash of the contigs database this database belongs to.
    pub fn owner_hash(&self) -> &str {
        &self.store.owner_hash
    }

    /// Returns the creation time as seconds since the Unix epoch.
    pub fn creation_date(&self) -> &str {
        &self.store.creation_date
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.store.db.filename()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        self.store.db.file_size()
    }

    /// Closes the connection to the database.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}

//-----------------------------------------------------------------------------

/// A database of per-base position info for the contigs of a contigs database.
///
/// Each row stores one variable-length array of 8-bit codes for a contig,
/// with one code per nucleotide position. Readers assume at most one row per
/// contig; if a contig was appended more than once, the values stored first
/// win.
///
/// Unlike in [`CoverageBase`], asking for a contig the database does not
/// contain is not an error. The read returns an empty array instead.
///
/// # Examples
///
/// ```
/// use aux_base::{NtPositionBase, OpenParams};
///
/// let dir = tempfile::tempdir().unwrap();
/// let db_file = dir.path().join("positions.db");
///
/// // Create a database with position info for one contig.
/// let params = OpenParams::create_new(&db_file, "hash-1");
/// let database = NtPositionBase::open(&params).unwrap();
/// database.append("contig_X", &[0, 1, 1, 2, 0]).unwrap();
///
/// // Known contigs return their values and unknown contigs return nothing.
/// assert!(database.is_known_contig("contig_X").unwrap());
/// assert_eq!(database.get("contig_X").unwrap(), vec![0, 1, 1, 2, 0]);
/// assert!(!database.is_known_contig("contig_Y").unwrap());
/// assert!(database.get("contig_Y").unwrap().is_empty());
/// database.close().unwrap();
/// ```
#[derive(Debug)]
pub struct NtPositionBase {
    store: ArrayStore<u8>,
}

impl NtPositionBase {
    /// Database type stored in the metadata.
    pub const DB_TYPE: &'static str = "auxiliary data for nt positions";

    /// Opens the database described by the parameters.
    ///
    /// Creates a new database file if [`OpenParams::create_new`] is set and
    /// opens an existing one otherwise.
    ///
    /// # Errors
    ///
    /// Fails with [`AuxError::HashMismatch`] if an existing database carries
    /// a hash other than [`OpenParams::owner_hash`] and the check is not
    /// skipped. Fails with [`AuxError::Open`] or [`AuxError::Version`] if the
    /// file cannot be used as a database.
    pub fn open(params: &OpenParams) -> Result<Self> {
        Self::open_with_progress(params, Box::new(SilentProgress))
    }

    /// Opens the database described by the parameters with the given progress
    /// context.
    ///
    /// Same errors as [`NtPositionBase::open`].
    pub fn open_with_progress(params: &OpenParams, progress: Box<dyn Progress>) -> Result<Self> {
        let store = ArrayStore::open(&NT_POSITION_SCHEMA, params, progress)?;
        Ok(NtPositionBase { store })
    }

    /// Stores the position info values for the given contig.
    pub fn append(&self, contig_name: &str, position_info: &[u8]) -> Result<()> {
        self.store.append(&[contig_name], position_info)
    }

    /// Returns the names of the contigs with stored position info.
    pub fn known_contigs(&self) -> Result<BTreeSet<String>> {
        self.store.known_keys()
    }

    /// Returns true if the database contains position info for the given contig.
    pub fn is_known_contig(&self, contig_name: &str) -> Result<bool> {
        self.store.contains(contig_name)
    }

    /// Returns the position info values for the given contig.
    ///
    /// Returns an empty array if the database does not contain the contig.
    pub fn get(&self, contig_name: &str) -> Result<Vec<u8>> {
        let rows = self.store.fetch_values(contig_name)?;
        Ok(rows.into_iter().next().unwrap_or_default())
    }

    /// Returns the auxiliary data format version of the database.
    pub fn version(&self) -> &str {
        self.store.db.version()
    }

    /// Returns the database type from the metadata.
    pub fn db_type(&self) -> &str {
        &self.store.db_type
    }

    /// Returns the stored hash of the contigs database this database belongs to.
    pub fn owner_hash(&self) -> &str {
        &self.store.owner_hash
    }

    /// Returns the creation time as seconds since the Unix epoch.
    pub fn creation_date(&self) -> &str {
        &self.store.creation_date
    }

    /// Returns the filename of the database or [`None`] if there is no filename.
    pub fn filename(&self) -> Option<&str> {
        self.store.db.filename()
    }

    /// Returns the size of the database file in a human-readable format.
    pub fn file_size(&self) -> Option<String> {
        self.store.db.file_size()
    }

    /// Closes the connection to the database.
    pub fn close(self) -> Result<()> {
        self.store.close()
    }
}

//-----------------------------------------------------------------------------

// Returns the current time as seconds since the Unix epoch, in the format
// stored under the creation date key.
fn unix_time() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => format!("{}", duration.as_secs_f64()),
        Err(_) => String::from("0"),
    }
}

//-----------------------------------------------------------------------------
