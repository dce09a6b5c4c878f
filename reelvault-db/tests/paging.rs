use std::sync::Arc;

use chrono::{TimeZone, Utc};
use reelvault_catalog::*;
use reelvault_db::*;

/// 23 movies named "Movie 00".."Movie 22"; every third one has two
/// alternative titles, so the joined rows outnumber the movies.
fn library() -> (MovieRepository, Vec<Movie>) {
    let db = Database::open_memory().unwrap();
    let profiles = ProfileRepository::new(db.clone(), Arc::new(NullSink));
    let titles = AlternativeTitleRepository::new(db.clone(), Arc::new(NullSink));
    let movies = MovieRepository::new(db, Arc::new(NullSink));

    let profile = profiles
        .insert(QualityProfile::new("HD", &[1, 4, 7], 2))
        .unwrap();
    let added = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

    let mut inserted = Vec::new();
    for i in 0..23 {
        let mut movie = Movie::new(format!("Movie {:02}", i), 1000 + i, profile.id, added);
        movie.year = Some(1980 + (i as i32 % 5));
        movie.monitored = i % 4 != 0;
        let movie = movies.insert(movie).unwrap();
        if i % 3 == 0 {
            for (n, lang) in ["de", "fr"].iter().enumerate() {
                let mut title = AlternativeTitle::new(
                    movie.id,
                    format!("Film {} {}", i, lang),
                    SourceType::Tmdb,
                    i * 10 + n as i64,
                );
                title.language = Some(lang.to_string());
                titles.insert(title).unwrap();
            }
        }
        inserted.push(movie);
    }
    (movies, inserted)
}

fn ids(movies: &[Movie]) -> Vec<i64> {
    movies.iter().map(|m| m.id).collect()
}

#[test]
fn pages_concatenate_to_the_unbounded_listing() {
    let (movies, _) = library();
    let sort = |spec: PagingSpec<Movie>| spec.sorted_by("sort_title", SortDirection::Descending);

    let everything = movies.list(sort(PagingSpec::unbounded())).unwrap();
    assert_eq!(everything.records.len(), 23);
    assert_eq!(everything.total_records, 23);

    let mut paged = Vec::new();
    for page in 1..=4 {
        let spec = movies.list(sort(PagingSpec::new(page, 7))).unwrap();
        assert_eq!(spec.total_records, 23);
        assert_eq!(spec.total_pages(), 4);
        paged.extend(spec.records);
    }
    assert_eq!(ids(&paged), ids(&everything.records));
    assert_eq!(paged.first().unwrap().title, "Movie 22");
    assert_eq!(paged.last().unwrap().title, "Movie 00");
}

#[test]
fn pages_carry_complete_children() {
    let (movies, _) = library();
    let page = movies
        .list(PagingSpec::new(1, 5).sorted_by("title", SortDirection::Ascending))
        .unwrap();

    assert_eq!(page.records.len(), 5);
    let first = &page.records[0];
    assert_eq!(first.title, "Movie 00");
    let mut languages: Vec<_> = first
        .alternative_titles
        .iter()
        .filter_map(|t| t.language.clone())
        .collect();
    languages.sort();
    assert_eq!(languages, vec!["de".to_string(), "fr".to_string()]);
    assert!(page.records[1].alternative_titles.is_empty());
    assert!(page.records.iter().all(|m| m.profile.is_some()));
}

#[test]
fn listing_is_repeatable() {
    let (movies, _) = library();
    let spec = || PagingSpec::new(2, 6).sorted_by("year", SortDirection::Ascending);

    let first = movies.list(spec()).unwrap();
    let second = movies.list(spec()).unwrap();
    assert_eq!(ids(&first.records), ids(&second.records));
    assert_eq!(first.total_records, second.total_records);
}

#[test]
fn ties_are_broken_by_id() {
    let (movies, inserted) = library();
    let spec = movies
        .list(PagingSpec::unbounded().sorted_by("year", SortDirection::Ascending))
        .unwrap();

    let mut expected = inserted.clone();
    expected.sort_by_key(|m| (m.year, m.id));
    assert_eq!(ids(&spec.records), ids(&expected));
}

#[test]
fn unsorted_listing_orders_by_id() {
    let (movies, inserted) = library();
    let spec = movies.list(PagingSpec::new(1, 50)).unwrap();
    assert_eq!(ids(&spec.records), ids(&inserted));
}

#[test]
fn filters_narrow_both_records_and_count() {
    let (movies, _) = library();
    let spec = PagingSpec::new(1, 4)
        .filter_equal(MovieFields::MONITORED, true)
        .unwrap()
        .sorted_by("title", SortDirection::Ascending);

    let spec = movies.list(spec).unwrap();
    // Every fourth movie is unmonitored: 0, 4, 8, 12, 16, 20.
    assert_eq!(spec.total_records, 17);
    assert_eq!(spec.total_pages(), 5);
    assert_eq!(spec.records.len(), 4);
    assert_eq!(spec.records[0].title, "Movie 01");
    assert!(spec.records.iter().all(|m| m.monitored));
}

#[test]
fn filter_on_joined_table_counts_movies_once() {
    let (movies, _) = library();
    let spec = PagingSpec::unbounded().with_filter(
        Condition::is_not_null(AlternativeTitleFields::ID).unwrap(),
    );
    let spec = movies.list(spec).unwrap();
    // Movies 0, 3, 6, .., 21 each have two titles.
    assert_eq!(spec.total_records, 8);
    assert_eq!(spec.records.len(), 8);
}

#[test]
fn page_past_the_end_is_empty() {
    let (movies, _) = library();
    let spec = movies.list(PagingSpec::new(9, 10)).unwrap();
    assert!(spec.records.is_empty());
    assert_eq!(spec.total_records, 23);
}

#[test]
fn unknown_sort_key_is_rejected() {
    let (movies, _) = library();
    let err = movies
        .list(PagingSpec::new(1, 10).sorted_by("popularity", SortDirection::Ascending))
        .unwrap_err();
    assert!(matches!(
        err,
        OperationError::Build(BuildError::UnknownSortKey(ref key)) if key == "popularity"
    ));
}

#[test]
fn sort_by_joined_column() {
    let (movies, _) = library();
    let spec = movies
        .list(PagingSpec::new(1, 3).sorted_by("profiles.name", SortDirection::Descending))
        .unwrap();
    assert_eq!(spec.records.len(), 3);
    assert_eq!(spec.total_records, 23);
}

#[test]
fn sort_by_one_to_many_column_uses_one_value_per_movie() {
    let (movies, inserted) = library();
    let untitled: Vec<i64> = (0..23).filter(|i| i % 3 != 0).map(|i| inserted[i].id).collect();
    let titled = |order: &[usize]| -> Vec<i64> { order.iter().map(|&i| inserted[i].id).collect() };

    // Ascending reads each movie's smallest title; movies without one sort first.
    let mut expected = untitled.clone();
    expected.extend(titled(&[0, 12, 15, 18, 21, 3, 6, 9]));
    let sort = |spec: PagingSpec<Movie>| {
        spec.sorted_by("alternative_titles.title", SortDirection::Ascending)
    };
    let mut paged = Vec::new();
    for page in 1..=5 {
        let spec = movies.list(sort(PagingSpec::new(page, 5))).unwrap();
        assert_eq!(spec.total_records, 23);
        for movie in &spec.records {
            let count = if untitled.contains(&movie.id) { 0 } else { 2 };
            assert_eq!(movie.alternative_titles.len(), count);
        }
        paged.extend(ids(&spec.records));
    }
    assert_eq!(paged, expected);

    // Descending reads the largest; movies without one sort last.
    let spec = movies
        .list(
            PagingSpec::unbounded()
                .sorted_by("alternative_titles.title", SortDirection::Descending),
        )
        .unwrap();
    let mut expected = titled(&[9, 6, 3, 21, 18, 15, 12, 0]);
    expected.extend(untitled);
    assert_eq!(ids(&spec.records), expected);
}

#[test]
fn movies_without_files_pages() {
    let (movies, inserted) = library();
    let db = movies.database().clone();
    let files = MovieFileRepository::new(db, Arc::new(NullSink));

    let file = files
        .insert(MovieFile {
            id: 0,
            movie_id: inserted[0].id,
            relative_path: "Movie 00.mkv".into(),
            size: 1,
            date_added: Utc::now(),
            quality: Some(QualityModel::new(Quality::DVD)),
            media_info: None,
            scene_name: None,
            release_group: None,
            edition: None,
        })
        .unwrap();
    movies.set_file_id(inserted[0].id, Some(file.id)).unwrap();

    let spec = movies.movies_without_files(PagingSpec::new(1, 100)).unwrap();
    assert_eq!(spec.total_records, 22);
    assert!(!ids(&spec.records).contains(&inserted[0].id));
}
