use chrono::Utc;
use reelvault_catalog::*;

#[test]
fn below_cutoff_takes_ranks_before_cutoff() {
    // Ranking [A, B, C, D], cutoff at C.
    let profile = QualityProfile::new("HD", &[1, 4, 7, 19], 2);
    assert_eq!(profile.below_cutoff(), vec![1, 4]);
    assert_eq!(profile.cutoff_quality(), Some(7));
}

#[test]
fn cutoff_at_lowest_rank_leaves_nothing_below() {
    let profile = QualityProfile::new("Any", &[1, 4, 7], 0);
    assert!(profile.below_cutoff().is_empty());
}

#[test]
fn cutoff_past_end_clamps() {
    let profile = QualityProfile::new("Odd", &[1, 4], 9);
    assert_eq!(profile.below_cutoff(), vec![1, 4]);
    assert_eq!(profile.cutoff_quality(), None);
}

#[test]
fn log_level_at_least() {
    assert_eq!(
        LogLevel::Warn.at_least(),
        vec![LogLevel::Warn, LogLevel::Error, LogLevel::Fatal]
    );
    assert_eq!(LogLevel::Trace.at_least().len(), 6);
    assert_eq!(LogLevel::from_str_loose("WARNING"), Some(LogLevel::Warn));
    assert_eq!(LogLevel::from_str_loose("loud"), None);
}

#[test]
fn new_movie_derives_title_keys() {
    let movie = Movie::new("The Matrix", 603, 1, Utc::now());
    assert_eq!(movie.clean_title, "matrix");
    assert_eq!(movie.title_slug, "matrix-603");
    assert!(movie.monitored);
    assert!(!movie.has_file());
}

#[test]
fn clean_title_variants() {
    assert_eq!(clean_title("A"), "a");
    assert_eq!(clean_title("The  Lord of the Rings: The Two Towers"), "lordoftheringsthetwotowers");
    assert_eq!(clean_title("Se7en"), "se7en");
}

#[test]
fn imdb_normalization() {
    assert_eq!(normalize_imdb_id("tt12345").as_deref(), Some("tt0012345"));
    assert_eq!(normalize_imdb_id("tt10872600").as_deref(), Some("tt10872600"));
    assert_eq!(normalize_imdb_id(""), None);
    assert_eq!(normalize_imdb_id("tt"), None);
}
