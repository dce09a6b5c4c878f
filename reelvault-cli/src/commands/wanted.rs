use std::path::PathBuf;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use reelvault_lib::{Movie, PagingSpec, Quality, Settings, SortDirection, monitored_filter};

use crate::CliError;
use crate::cli_types::PageArgs;

use super::{log_page_footer, open_existing, page_spec, truncate_str};

pub(crate) fn run_wanted_cutoff(
    settings: &Settings,
    db: Option<PathBuf>,
    page: &PageArgs,
    unmonitored: bool,
) -> Result<(), CliError> {
    let Some(library) = open_existing(settings, db)? else {
        return Ok(());
    };
    let spec = wanted_spec(page, settings, unmonitored)?;
    let spec = library
        .cutoff()
        .movies_where_cutoff_unmet(spec)
        .map_err(|e| CliError::database(format!("Failed to list cutoff unmet movies: {}", e)))?;

    log_movies("Cutoff Unmet", &spec, unmonitored);
    Ok(())
}

pub(crate) fn run_wanted_missing(
    settings: &Settings,
    db: Option<PathBuf>,
    page: &PageArgs,
    unmonitored: bool,
) -> Result<(), CliError> {
    let Some(library) = open_existing(settings, db)? else {
        return Ok(());
    };
    let spec = wanted_spec(page, settings, unmonitored)?;
    let spec = library
        .movies()
        .movies_without_files(spec)
        .map_err(|e| CliError::database(format!("Failed to list missing movies: {}", e)))?;

    log_movies("Missing", &spec, unmonitored);
    Ok(())
}

fn wanted_spec(
    page: &PageArgs,
    settings: &Settings,
    unmonitored: bool,
) -> Result<PagingSpec<Movie>, CliError> {
    let filter = monitored_filter(Some(!unmonitored))
        .map_err(|e| CliError::invalid_argument(e.to_string()))?;
    Ok(page_spec(page, settings, "title", SortDirection::Ascending).with_filter(filter))
}

fn log_movies(heading: &str, spec: &PagingSpec<Movie>, unmonitored: bool) {
    let scope = if unmonitored { "unmonitored" } else { "monitored" };
    log::info!(
        "{} {}",
        heading.if_supports_color(Stdout, |t| t.bold()),
        format!("({})", scope).if_supports_color(Stdout, |t| t.dimmed()),
    );
    crate::log_blank();

    if spec.records.is_empty() && spec.total_records == 0 {
        log::info!("  Nothing wanted.");
        return;
    }

    log::info!(
        "  {:<40} {:>4}  {:<14} {:<14} {}",
        "Title",
        "Year",
        "Profile",
        "Current",
        "Cutoff"
    );
    for movie in &spec.records {
        let year = movie
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "-".to_string());
        let profile = movie
            .profile
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("?");
        let cutoff = movie
            .profile
            .as_ref()
            .and_then(|p| p.cutoff_quality())
            .map(Quality::name_of)
            .unwrap_or("-");
        let current = movie
            .movie_file
            .as_ref()
            .map(|f| f.quality.as_ref().map(|q| q.name()).unwrap_or("Unknown"));

        let current = match current {
            Some(name) => format!("{:<14}", name)
                .if_supports_color(Stdout, |t| t.yellow())
                .to_string(),
            None => format!("{:<14}", "missing")
                .if_supports_color(Stdout, |t| t.red())
                .to_string(),
        };
        log::info!(
            "  {:<40} {:>4}  {:<14} {} {}",
            truncate_str(&movie.title, 40),
            year,
            truncate_str(profile, 14),
            current,
            cutoff
        );
    }
    log_page_footer(spec);
}
