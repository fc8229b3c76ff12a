use super::*;

use std::path::PathBuf;

use tempfile::TempDir;

//-----------------------------------------------------------------------------

fn temp_dir() -> TempDir {
    let dir = TempDir::new();
    assert!(dir.is_ok(), "Failed to create a temporary directory: {}", dir.unwrap_err());
    dir.unwrap()
}

fn create_database(filename: &PathBuf, version: &str) -> Database {
    let database = Database::create(filename, version);
    assert!(database.is_ok(), "Failed to create database: {}", database.unwrap_err());
    database.unwrap()
}

fn open_database(filename: &PathBuf, version: &str) -> Database {
    let database = Database::open(filename, version);
    assert!(database.is_ok(), "Failed to open database: {}", database.unwrap_err());
    database.unwrap()
}

fn close_database(database: Database) {
    let result = database.close();
    assert!(result.is_ok(), "Failed to close database: {}", result.unwrap_err());
}

//-----------------------------------------------------------------------------

#[test]
fn create_and_open() {
    let dir = temp_dir();
    let db_file = dir.path().join("record.db");

    // Create the database.
    let database = create_database(&db_file, "2");
    assert_eq!(database.version(), "2", "Wrong version in a new database");
    assert!(database.filename().is_some(), "Missing filename in a file-backed database");
    assert!(database.file_size().is_some(), "Missing file size in a file-backed database");
    close_database(database);

    // Open it again.
    let database = open_database(&db_file, "2");
    assert_eq!(database.version(), "2", "Wrong version in an opened database");
    close_database(database);
}

#[test]
fn meta_values() {
    let dir = temp_dir();
    let db_file = dir.path().join("record.db");
    let database = create_database(&db_file, "2");

    // An unset key has no value.
    let value = database.meta_value("name");
    assert!(value.is_ok(), "Failed to read an unset key: {}", value.unwrap_err());
    assert!(value.unwrap().is_none(), "Got a value for an unset key");

    // Setting a key and then replacing the value.
    database.set_meta_value("name", "first").unwrap();
    assert_eq!(database.meta_value("name").unwrap(), Some(String::from("first")), "Wrong value for a new key");
    database.set_meta_value("name", "second").unwrap();
    assert_eq!(database.meta_value("name").unwrap(), Some(String::from("second")), "Wrong value for a replaced key");
    close_database(database);

    // The values persist over a reopen.
    let database = open_database(&db_file, "2");
    assert_eq!(database.meta_value("name").unwrap(), Some(String::from("second")), "Wrong value after reopening");
    close_database(database);
}

#[test]
fn version_mismatch() {
    let dir = temp_dir();
    let db_file = dir.path().join("record.db");
    let database = create_database(&db_file, "1");
    close_database(database);

    let result = Database::open(&db_file, "2");
    match result {
        Err(AuxError::Version { found, expected }) => {
            assert_eq!(found, "1", "Wrong stored version in the error");
            assert_eq!(expected, "2", "Wrong expected version in the error");
        },
        Err(x) => panic!("Wrong error for a version mismatch: {}", x),
        Ok(_) => panic!("Opened a database with the wrong version"),
    }
}

#[test]
fn open_missing_file() {
    let dir = temp_dir();
    let db_file = dir.path().join("no-such-file.db");

    let result = Database::open(&db_file, "2");
    match result {
        Err(AuxError::Open { path, .. }) => {
            assert_eq!(path, db_file, "Wrong path in the error");
        },
        Err(x) => panic!("Wrong error for a missing file: {}", x),
        Ok(_) => panic!("Opened a database in a missing file"),
    }
}

#[test]
fn create_replaces_old_file() {
    let dir = temp_dir();
    let db_file = dir.path().join("record.db");

    // Create a database and leave a table behind.
    let database = create_database(&db_file, "1");
    database.create_table("leftover", &[("value", ColumnType::Text)]).unwrap();
    close_database(database);

    // Creating again starts from an empty file.
    let database = create_database(&db_file, "2");
    assert_eq!(database.version(), "2", "Wrong version after recreating the database");
    let result = database.single_column("leftover", "value");
    assert!(result.is_err(), "The old table survived recreation");
    close_database(database);
}

//-----------------------------------------------------------------------------

#[test]
fn tables_and_rows() {
    let dir = temp_dir();
    let db_file = dir.path().join("record.db");
    let database = create_database(&db_file, "2");

    // One table with two key columns and a blob column.
    database.create_table("arrays", &[
        ("name", ColumnType::Text),
        ("group_name", ColumnType::Text),
        ("data", ColumnType::Blob),
    ]).unwrap();
    let rows: [(&str, &str, Vec<u8>); 3] = [
        ("first", "a", vec![1, 2]),
        ("first", "b", vec![3]),
        ("second", "a", vec![4, 5, 6]),
    ];
    for (name, group, data) in rows.iter() {
        let result = database.insert("arrays", &[name, group, data]);
        assert!(result.is_ok(), "Failed to insert a row: {}", result.unwrap_err());
    }

    // A full-column projection preserves duplicates and storage order.
    let names = database.single_column("arrays", "name").unwrap();
    assert_eq!(names, vec!["first", "first", "second"], "Wrong values in the name column");

    // Filtered reads with and without matching rows.
    let selected = database.select_where(
        "arrays", &["group_name", "data"], "name", "first",
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
    ).unwrap();
    assert_eq!(
        selected,
        vec![(String::from("a"), vec![1, 2]), (String::from("b"), vec![3])],
        "Wrong rows for name first"
    );
    let selected = database.select_where(
        "arrays", &["data"], "name", "third",
        |row| row.get::<_, Vec<u8>>(0)
    ).unwrap();
    assert!(selected.is_empty(), "Got rows for an absent key");

    close_database(database);
}

//-----------------------------------------------------------------------------

#[test]
fn identify_files() {
    let dir = temp_dir();

    // Missing file.
    let missing = dir.path().join("no-such-file.db");
    assert_eq!(identify_database(&missing), DatabaseFileType::Missing, "Wrong type for a missing file");

    // A directory is not a database.
    assert_eq!(identify_database(dir.path()), DatabaseFileType::NotDatabase, "Wrong type for a directory");

    // Arbitrary file contents.
    let text_file = dir.path().join("notes.txt");
    std::fs::write(&text_file, "these are not the records you are looking for\n").unwrap();
    assert_eq!(identify_database(&text_file), DatabaseFileType::NotDatabase, "Wrong type for a text file");

    // An SQLite database without the metadata table.
    let foreign = dir.path().join("foreign.db");
    {
        let connection = Connection::open(&foreign).unwrap();
        connection.execute("CREATE TABLE other (value text)", ()).unwrap();
    }
    assert_eq!(identify_database(&foreign), DatabaseFileType::UnknownDatabase, "Wrong type for a foreign database");

    // A database created by this crate.
    let db_file = dir.path().join("record.db");
    let database = create_database(&db_file, "2");
    close_database(database);
    assert_eq!(
        identify_database(&db_file), DatabaseFileType::Version(String::from("2")),
        "Wrong type for a known database"
    );
}

//-----------------------------------------------------------------------------
