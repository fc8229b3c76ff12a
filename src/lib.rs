//! # Aux-base: per-base auxiliary data for contigs databases, using SQLite.
//!
//! A contigs database describes the contigs of a genome assembly and the
//! splits they are divided into. The data that is too large to keep there is
//! stored next to it in auxiliary databases, one SQLite file per kind of data.
//! Each auxiliary database stores variable-length numeric arrays as binary
//! blobs, addressed by string keys, and it is append-only: arrays are written
//! once and never updated or deleted.
//!
//! There are two kinds of auxiliary databases:
//!
//! * [`CoverageBase`] stores per-base coverage values. Each row in table
//!   `split_coverages` stores the coverage values of one split in one sample
//!   as an array of 16-bit unsigned integers.
//! * [`NtPositionBase`] stores per-base position info codes. Each row in table
//!   `nt_position_info` stores one array of 8-bit codes for a contig.
//!
//! ### Basic concepts
//!
//! An array is encoded as a dense little-endian buffer with no length prefix,
//! so the byte length of the blob divided by the element width recovers the
//! number of values. The encoding is the same in both database variants; only
//! the element width differs.
//!
//! Every database carries a metadata table `self` with the format version,
//! the database type, the creation time, and the hash of the contigs database
//! it was created for. Opening a database with a hash other than the stored
//! one fails, which keeps auxiliary files from being mixed between projects.
//! The check can be skipped explicitly.
//!
//! See [`OpenParams`] for opening and creating databases and [`Progress`] for
//! reporting the progress of batch reads. The underlying record storage is
//! available in the [`db`] module.

pub mod db;
pub mod error;
pub mod progress;
pub mod store;
pub mod utils;

pub use db::{ColumnType, Database, DatabaseFileType};
pub use error::{AuxError, Result};
pub use progress::{Progress, SilentProgress, StderrProgress};
pub use store::{CoverageBase, NtPositionBase, OpenParams, VERSION};
