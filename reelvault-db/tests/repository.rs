use std::sync::Arc;
use std::sync::mpsc;

use chrono::{TimeZone, Utc};
use reelvault_catalog::*;
use reelvault_db::*;

fn setup() -> (Database, QualityProfile) {
    let db = Database::open_memory().unwrap();
    let profiles = ProfileRepository::new(db.clone(), Arc::new(NullSink));
    let profile = profiles
        .insert(QualityProfile::new("HD", &[1, 4, 7], 2))
        .unwrap();
    (db, profile)
}

fn movie(title: &str, tmdb_id: i64, profile_id: i64) -> Movie {
    let added = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut movie = Movie::new(title, tmdb_id, profile_id, added);
    movie.path = format!("/movies/{}", title);
    movie
}

#[test]
fn insert_assigns_id_and_get_reads_it_back() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));

    let inserted = movies.insert(movie("Alien", 348, profile.id)).unwrap();
    assert!(inserted.id > 0);

    let loaded = movies.get(inserted.id).unwrap();
    assert_eq!(loaded.title, "Alien");
    assert_eq!(loaded.added, inserted.added);
    assert_eq!(loaded.profile.as_ref().map(|p| p.name.as_str()), Some("HD"));
    assert!(loaded.movie_file.is_none());
}

#[test]
fn insert_rejects_persisted_entities() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));
    let inserted = movies.insert(movie("Alien", 348, profile.id)).unwrap();

    let err = movies.insert(inserted).unwrap_err();
    assert!(matches!(err, OperationError::AlreadyPersisted { .. }));
}

#[test]
fn get_missing_is_not_found() {
    let (db, _) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));
    assert!(matches!(
        movies.get(42),
        Err(OperationError::NotFound { .. })
    ));
    assert!(movies.find(42).unwrap().is_none());
}

#[test]
fn get_many_skips_missing_ids() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));
    let alien = movies.insert(movie("Alien", 348, profile.id)).unwrap();
    let heat = movies.insert(movie("Heat", 949, profile.id)).unwrap();
    movies.insert(movie("Ronin", 8195, profile.id)).unwrap();

    let mut found: Vec<i64> = movies
        .get_many(&[heat.id, 999, alien.id])
        .unwrap()
        .iter()
        .map(|m| m.id)
        .collect();
    found.sort();
    assert_eq!(found, vec![alien.id, heat.id]);
    assert!(movies.get_many(&[]).unwrap().is_empty());
}

#[test]
fn update_writes_every_column() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));
    let mut alien = movies.insert(movie("Alien", 348, profile.id)).unwrap();

    alien.year = Some(1979);
    alien.monitored = false;
    movies.update(&alien).unwrap();

    let loaded = movies.get(alien.id).unwrap();
    assert_eq!(loaded.year, Some(1979));
    assert!(!loaded.monitored);
}

#[test]
fn update_requires_an_existing_row() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));

    let unsaved = movie("Alien", 348, profile.id);
    assert!(matches!(
        movies.update(&unsaved),
        Err(OperationError::NotPersisted { .. })
    ));

    let mut ghost = unsaved;
    ghost.id = 99;
    assert!(matches!(
        movies.update(&ghost),
        Err(OperationError::NotFound { .. })
    ));
}

#[test]
fn set_fields_leaves_other_columns_alone() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));
    let alien = movies.insert(movie("Alien", 348, profile.id)).unwrap();

    // Two writers holding stale copies each change a different field.
    let mut first = alien.clone();
    first.year = Some(1979);
    let mut second = alien.clone();
    second.monitored = false;

    movies.set_fields(&first, &[MovieFields::YEAR]).unwrap();
    movies.set_fields(&second, &[MovieFields::MONITORED]).unwrap();

    let loaded = movies.get(alien.id).unwrap();
    assert_eq!(loaded.year, Some(1979));
    assert!(!loaded.monitored);
    assert_eq!(loaded.title, "Alien");
}

#[test]
fn upsert_inserts_then_updates() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));

    let mut alien = movies.upsert(movie("Alien", 348, profile.id)).unwrap();
    alien.year = Some(1979);
    let alien = movies.upsert(alien).unwrap();

    assert_eq!(movies.count().unwrap(), 1);
    assert_eq!(movies.get(alien.id).unwrap().year, Some(1979));
}

#[test]
fn delete_variants() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));
    let inserted = movies
        .insert_many(vec![
            movie("Alien", 348, profile.id),
            movie("Aliens", 679, profile.id),
            movie("Alien 3", 8077, profile.id),
            movie("Heat", 949, profile.id),
        ])
        .unwrap();
    assert_eq!(inserted.len(), 4);
    assert!(movies.has_items().unwrap());

    assert!(movies.delete(inserted[0].id).unwrap());
    assert!(!movies.delete(inserted[0].id).unwrap());

    assert_eq!(
        movies
            .delete_many(&[inserted[1].id, inserted[2].id])
            .unwrap(),
        2
    );
    assert_eq!(movies.count().unwrap(), 1);

    assert_eq!(movies.purge().unwrap(), 1);
    assert!(!movies.has_items().unwrap());
}

#[test]
fn insert_many_is_atomic() {
    let (db, profile) = setup();
    let movies = MovieRepository::new(db, Arc::new(NullSink));

    // Same tmdb id twice violates the unique key.
    let result = movies.insert_many(vec![
        movie("Alien", 348, profile.id),
        movie("Alien again", 348, profile.id),
    ]);
    assert!(matches!(result, Err(OperationError::Sqlite(_))));
    assert_eq!(movies.count().unwrap(), 0);
}

#[test]
fn mutations_publish_events() {
    let (db, profile) = setup();
    let (tx, rx) = mpsc::channel();
    let movies = MovieRepository::new(db, Arc::new(tx));

    let mut alien = movies.insert(movie("Alien", 348, profile.id)).unwrap();
    alien.year = Some(1979);
    movies.update(&alien).unwrap();
    movies.set_fields(&alien, &[MovieFields::YEAR]).unwrap();
    movies.delete(alien.id).unwrap();
    movies.purge().unwrap();

    let events: Vec<ModelEvent> = rx.try_iter().collect();
    let actions: Vec<ModelAction> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            ModelAction::Created,
            ModelAction::Updated,
            ModelAction::Updated,
            ModelAction::Deleted,
        ]
    );
    assert!(events.iter().all(|e| e.table == "movies" && e.id == alien.id));
}

#[test]
fn failed_writes_publish_nothing() {
    let (db, _) = setup();
    let (tx, rx) = mpsc::channel();
    let movies = MovieRepository::new(db, Arc::new(tx));

    // Profile 99 does not exist.
    assert!(movies.insert(movie("Alien", 348, 99)).is_err());
    assert!(rx.try_recv().is_err());
}

#[test]
fn config_upsert_is_case_insensitive() {
    let db = Database::open_memory().unwrap();
    let config = ConfigRepository::new(db, Arc::new(NullSink));

    config.upsert("RecycleBin", "/trash").unwrap();
    config.upsert("recyclebin", "/bin").unwrap();

    assert_eq!(config.count().unwrap(), 1);
    assert_eq!(config.get_value("RECYCLEBIN").unwrap().as_deref(), Some("/bin"));
    assert_eq!(config.get_value("missing").unwrap(), None);
}

#[test]
fn connection_is_released_after_errors() {
    let (db, _) = setup();
    let movies = MovieRepository::new(db.clone(), Arc::new(NullSink));

    // The in-memory pool holds one connection; each failure must hand it back.
    for _ in 0..3 {
        assert!(movies.insert(movie("Alien", 348, 99)).is_err());
        let spec = PagingSpec::new(1, 10).sorted_by("bogus", SortDirection::Ascending);
        assert!(movies.list(spec).is_err());
    }
    assert_eq!(movies.count().unwrap(), 0);
}
