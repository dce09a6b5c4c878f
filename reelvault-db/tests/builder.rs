use chrono::Utc;
use reelvault_catalog::{Movie, QualityProfile};
use reelvault_db::builder::{Condition, Param, SqlBuilder};
use reelvault_db::*;
use rusqlite::types::Value;

const NASTY: &str = "Robert'); DROP TABLE movies; --";

#[test]
fn values_are_bound_not_interpolated() {
    let query = SqlBuilder::new::<Movie>()
        .equal(MovieFields::TITLE, NASTY.to_string())
        .unwrap()
        .in_set(MovieFields::CLEAN_TITLE, vec![NASTY.to_string()])
        .unwrap()
        .between(MovieFields::YEAR, 1990, 1999)
        .unwrap()
        .select_count();

    assert!(!query.sql.contains("DROP"));
    assert!(!query.sql.contains("1990"));
    assert_eq!(
        query.param(":p0"),
        Some(&Param::Value(Value::Text(NASTY.to_string())))
    );
    assert_eq!(
        query.param(":p1"),
        Some(&Param::Set(vec![Value::Text(NASTY.to_string())]))
    );
    assert_eq!(query.param(":p2"), Some(&Param::Value(Value::Integer(1990))));
    assert_eq!(query.param(":p3"), Some(&Param::Value(Value::Integer(1999))));
}

#[test]
fn hostile_values_round_trip_through_the_store() {
    let db = Database::open_memory().unwrap();
    let profiles = ProfileRepository::new(db.clone(), std::sync::Arc::new(NullSink));
    let movies = MovieRepository::new(db.clone(), std::sync::Arc::new(NullSink));

    let profile = profiles
        .insert(QualityProfile::new("Any", &[1, 2], 1))
        .unwrap();
    let movie = movies
        .insert(Movie::new(NASTY, 1, profile.id, Utc::now()))
        .unwrap();

    let found = movies
        .query(movies.builder().equal(MovieFields::TITLE, NASTY.to_string()).unwrap())
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, movie.id);
    assert_eq!(movies.count().unwrap(), 1);
}

#[test]
fn unmapped_field_fails_at_build_time() {
    let bogus: Field<Movie> = Field::new("rating");
    assert_eq!(
        bogus.column(),
        Err(BuildError::UnmappedField {
            table: "movies",
            field: "rating"
        })
    );
    assert!(Condition::equal(bogus, 5).is_err());
    assert!(SqlBuilder::new::<Movie>().is_null(bogus).is_err());
}

#[test]
fn predicates_must_reference_tables_in_the_query() {
    let err = SqlBuilder::new::<Movie>()
        .contains(MovieFileFields::QUALITY, "x")
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::TableNotInQuery {
            table: "movie_files",
            ..
        }
    ));

    let joined = MovieProjection.builder();
    assert!(joined.contains(MovieFileFields::QUALITY, "x").is_ok());
}

#[test]
fn parameter_names_never_collide() {
    let mut builder = SqlBuilder::new::<Movie>();
    for i in 0..200 {
        builder = builder.or_in_set(MovieFields::TMDB_ID, [i as i64]).unwrap();
    }
    builder = builder.equal(MovieFields::MONITORED, true).unwrap();

    let query = builder.select_count();
    let mut names: Vec<&str> = query.params.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names.len(), 201);
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 201);

    // Rendering is deterministic.
    assert_eq!(builder.select_count(), query);
}

#[test]
fn or_group_is_one_parenthesized_term() {
    let query = SqlBuilder::new::<Movie>()
        .equal(MovieFields::MONITORED, true)
        .unwrap()
        .or_in_set(MovieFields::CLEAN_TITLE, vec!["alien".to_string()])
        .unwrap()
        .or_in_set(MovieFields::YEAR, [1979])
        .unwrap()
        .select_count();
    assert_eq!(
        query.sql,
        r#"SELECT COUNT(DISTINCT "movies"."id") FROM "movies" WHERE "movies"."monitored" = :p0 AND ("movies"."clean_title" IN rarray(:p1) OR "movies"."year" IN rarray(:p2))"#
    );
}

#[test]
fn empty_set_matches_nothing() {
    let db = Database::open_memory().unwrap();
    let profiles = ProfileRepository::new(db.clone(), std::sync::Arc::new(NullSink));
    profiles
        .insert(QualityProfile::new("Any", &[1], 0))
        .unwrap();

    let none: Vec<i64> = Vec::new();
    let found = profiles
        .query(profiles.builder().in_set(ProfileFields::ID, none).unwrap())
        .unwrap();
    assert!(found.is_empty());

    let query = SqlBuilder::new::<Movie>()
        .and_where(Condition::any(Vec::new()))
        .unwrap()
        .select_count();
    assert!(query.sql.ends_with("WHERE 0"));
}

#[test]
fn sort_keys_resolve_against_query_tables() {
    let builder = MovieProjection.builder();
    assert_eq!(
        builder.resolve_sort_key("sort_title").unwrap().to_string(),
        r#""movies"."sort_title""#
    );
    assert_eq!(
        builder.resolve_sort_key("movie_files.size").unwrap().to_string(),
        r#""movie_files"."size""#
    );
    for bad in ["rating", "history.date", "title; DROP TABLE movies", ""] {
        assert_eq!(
            builder.resolve_sort_key(bad),
            Err(BuildError::UnknownSortKey(bad.to_string()))
        );
    }
}

#[test]
fn joined_queries_cannot_delete() {
    assert_eq!(
        MovieProjection.builder().delete().unwrap_err(),
        BuildError::JoinedWrite("movies")
    );
    let plain = SqlBuilder::new::<Movie>()
        .equal(MovieFields::ID, 3)
        .unwrap()
        .delete()
        .unwrap();
    assert_eq!(plain.sql, r#"DELETE FROM "movies" WHERE "movies"."id" = :p0"#);
}

#[test]
fn trace_lists_parameters() {
    let query = SqlBuilder::new::<Movie>()
        .contains(MovieFields::TITLE, "alien")
        .unwrap()
        .select_count();
    let trace = query.trace();
    assert!(trace.contains("instr(lower("));
    assert!(trace.contains(":p0"));
    assert!(trace.contains("alien"));
}
