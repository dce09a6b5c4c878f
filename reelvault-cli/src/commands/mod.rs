pub(crate) mod config;
pub(crate) mod init;
pub(crate) mod logs;
pub(crate) mod tasks;
pub(crate) mod wanted;

use std::path::PathBuf;

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use reelvault_lib::{Library, PagingSpec, Settings, SortDirection};

use crate::CliError;
use crate::cli_types::PageArgs;

/// Open the library for a read or maintenance command.
///
/// Returns `None` (after telling the user) when the database does not exist
/// yet; only `init` creates one.
pub(crate) fn open_existing(
    settings: &Settings,
    db: Option<PathBuf>,
) -> Result<Option<Library>, CliError> {
    let path = settings.resolve_db_path(db);
    if !path.exists() {
        log::warn!("No library database found at {}", path.display());
        log::info!("Run 'reelvault init' to create one.");
        return Ok(None);
    }
    let library = Library::open(&path, settings.database.pool_size).map_err(|e| {
        CliError::database(format!("Failed to open {}: {}", path.display(), e))
    })?;
    Ok(Some(library))
}

/// Paging spec from CLI flags, falling back to `default_sort` in `default_direction`.
pub(crate) fn page_spec<T>(
    args: &PageArgs,
    settings: &Settings,
    default_sort: &str,
    default_direction: SortDirection,
) -> PagingSpec<T> {
    let page_size = args
        .page_size
        .unwrap_or(settings.paging.default_page_size);
    let (key, direction) = match &args.sort_key {
        Some(key) if args.descending => (key.clone(), SortDirection::Descending),
        Some(key) => (key.clone(), SortDirection::Ascending),
        None if args.descending => (default_sort.to_string(), SortDirection::Descending),
        None => (default_sort.to_string(), default_direction),
    };
    PagingSpec::new(args.page, page_size).sorted_by(key, direction)
}

/// "Page 2 of 5 (43 records)".
pub(crate) fn log_page_footer<T>(spec: &PagingSpec<T>) {
    crate::log_blank();
    if spec.records.is_empty() && spec.total_records > 0 {
        log::info!(
            "Page {} is past the end ({} records on {} page(s))",
            spec.page,
            spec.total_records,
            spec.total_pages()
        );
        return;
    }
    log::info!(
        "{}",
        format!(
            "Page {} of {} ({} records)",
            spec.page.max(1),
            spec.total_pages().max(1),
            spec.total_records
        )
        .if_supports_color(Stdout, |t| t.dimmed()),
    );
}

/// Truncate a string to a maximum width, appending "..." if needed.
pub(crate) fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max).collect()
    }
}

pub(crate) fn format_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(sort_key: Option<&str>, descending: bool) -> PageArgs {
        PageArgs {
            page: 2,
            page_size: None,
            sort_key: sort_key.map(str::to_string),
            descending,
        }
    }

    #[test]
    fn page_spec_defaults() {
        let settings = Settings::default();
        let spec: PagingSpec<()> =
            page_spec(&args(None, false), &settings, "time", SortDirection::Descending);
        assert_eq!(spec.page, 2);
        assert_eq!(spec.page_size, settings.paging.default_page_size);
        assert_eq!(spec.sort_key.as_deref(), Some("time"));
        assert_eq!(spec.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn explicit_sort_key_is_ascending_unless_asked() {
        let settings = Settings::default();
        let spec: PagingSpec<()> =
            page_spec(&args(Some("year"), false), &settings, "title", SortDirection::Descending);
        assert_eq!(spec.sort_key.as_deref(), Some("year"));
        assert_eq!(spec.sort_direction, SortDirection::Ascending);

        let spec: PagingSpec<()> =
            page_spec(&args(Some("year"), true), &settings, "title", SortDirection::Ascending);
        assert_eq!(spec.sort_direction, SortDirection::Descending);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_str("Amélie", 10), "Amélie");
        assert_eq!(truncate_str("The Good, the Bad and the Ugly", 12), "The Good,...");
        assert_eq!(truncate_str("Heat", 2), "He");
    }
}
