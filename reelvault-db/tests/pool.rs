use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use reelvault_catalog::*;
use reelvault_db::schema::{CURRENT_VERSION, get_schema_version};
use reelvault_db::*;
use tempfile::TempDir;

fn open(dir: &TempDir, pool_size: usize) -> Database {
    Database::open(&dir.path().join("data").join("library.db"), pool_size).unwrap()
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir, 2);
    assert_eq!(db.pool_size(), 2);
    assert!(db.path().unwrap().exists());
    assert!(Database::open_memory().unwrap().path().is_none());
}

#[test]
fn file_databases_use_wal() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir, 1);
    let mode: String = db
        .with_conn(|conn| Ok(conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}

#[test]
fn reopening_keeps_data_and_version() {
    let dir = TempDir::new().unwrap();
    {
        let db = open(&dir, 2);
        ConfigRepository::new(db, Arc::new(NullSink))
            .upsert("apikey", "secret")
            .unwrap();
    }

    let db = open(&dir, 2);
    let version = db.with_conn(|conn| Ok(get_schema_version(conn))).unwrap();
    assert_eq!(version.unwrap(), CURRENT_VERSION);
    let config = ConfigRepository::new(db, Arc::new(NullSink));
    assert_eq!(config.get_value("apikey").unwrap().as_deref(), Some("secret"));
}

#[test]
fn concurrent_writers_share_the_pool() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir, 2);
    let profile_id = ProfileRepository::new(db.clone(), Arc::new(NullSink))
        .insert(QualityProfile::new("HD", &[1, 4, 7], 2))
        .unwrap()
        .id;

    let handles: Vec<_> = (0..6)
        .map(|t| {
            let movies = MovieRepository::new(db.clone(), Arc::new(NullSink));
            thread::spawn(move || {
                for i in 0..10 {
                    let tmdb_id = t * 100 + i;
                    movies
                        .insert(Movie::new(
                            format!("Movie {}", tmdb_id),
                            tmdb_id,
                            profile_id,
                            Utc::now(),
                        ))
                        .unwrap();
                    movies.count().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let movies = MovieRepository::new(db, Arc::new(NullSink));
    assert_eq!(movies.count().unwrap(), 60);
}

#[test]
fn checked_out_connections_return_on_drop() {
    let db = Database::open_memory().unwrap();
    for _ in 0..5 {
        let conn = db.connection().unwrap();
        let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }
    let other = db.clone();
    let handle =
        thread::spawn(move || other.with_conn(|conn| Ok(conn.execute("DELETE FROM logs", [])?)));
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn exhausted_pool_waits_for_a_release() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir, 1);
    let held = db.connection().unwrap();

    let other = db.clone();
    let handle = thread::spawn(move || {
        other.with_conn(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM movies", [], |row| row.get::<_, i64>(0))?)
        })
    });
    thread::sleep(Duration::from_millis(200));
    assert!(!handle.is_finished());

    drop(held);
    assert_eq!(handle.join().unwrap().unwrap(), 0);
}

#[test]
fn memory_database_keeps_one_connection() {
    let db = Database::open_memory().unwrap();
    assert_eq!(db.pool_size(), 1);
    db.with_conn(|conn| Ok(conn.execute("INSERT INTO config (key, value) VALUES ('a', '1')", [])?))
        .unwrap();
    let config = ConfigRepository::new(db, Arc::new(NullSink));
    assert_eq!(config.get_value("a").unwrap().as_deref(), Some("1"));
}

#[test]
fn transactions_roll_back_on_error() {
    let db = Database::open_memory().unwrap();
    let result: Result<(), OperationError> = db.with_transaction(|tx| {
        tx.execute("INSERT INTO config (key, value) VALUES ('a', '1')", [])?;
        tx.execute("INSERT INTO config (key, value) VALUES ('a', '2')", [])?;
        Ok(())
    });
    assert!(matches!(result, Err(OperationError::Sqlite(_))));

    let config = ConfigRepository::new(db, Arc::new(NullSink));
    assert_eq!(config.count().unwrap(), 0);
}
