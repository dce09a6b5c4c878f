//! Which movies are still eligible for a quality upgrade.
//!
//! A movie is "cutoff unmet" when it has no file at all, or when its file's
//! quality ranks below the cutoff of the movie's profile. File quality lives
//! in a serialized blob, so the query matches the blob text against
//! [`quality_fragment`] instead of decoding it. Every profile is covered by
//! one condition and the whole listing runs as one query:
//!
//! ```text
//! movie_file_id IS NULL
//!   OR (profile_id = P1 AND (blob has q1 OR blob has q2))
//!   OR (profile_id = P2 AND blob has q5)
//! ```

use reelvault_catalog::{Movie, QualityProfile, quality_fragment};

use crate::builder::Condition;
use crate::error::{BuildError, OperationError};
use crate::media::ProfileRepository;
use crate::movies::MovieRepository;
use crate::paging::PagingSpec;
use crate::tables::{MovieFields, MovieFileFields};

/// The below-cutoff qualities of one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualitiesBelowCutoff {
    pub profile_id: i64,
    pub quality_ids: Vec<i32>,
}

/// Below-cutoff sets for `profiles`, skipping profiles where every quality
/// already meets the cutoff.
pub fn qualities_below_cutoff(profiles: &[QualityProfile]) -> Vec<QualitiesBelowCutoff> {
    profiles
        .iter()
        .map(|profile| QualitiesBelowCutoff {
            profile_id: profile.id,
            quality_ids: profile.below_cutoff(),
        })
        .filter(|below| !below.quality_ids.is_empty())
        .collect()
}

/// The cutoff-unmet condition over the movie projection.
pub fn cutoff_unmet_condition(below: &[QualitiesBelowCutoff]) -> Result<Condition, BuildError> {
    let mut any = vec![Condition::is_null(MovieFields::MOVIE_FILE_ID)?];
    for profile in below {
        let mut matches = Vec::with_capacity(profile.quality_ids.len());
        for &quality in &profile.quality_ids {
            matches.push(Condition::contains(
                MovieFileFields::QUALITY,
                quality_fragment(quality),
            )?);
        }
        any.push(Condition::all([
            Condition::equal(MovieFields::PROFILE_ID, profile.profile_id)?,
            Condition::any(matches),
        ]));
    }
    Ok(Condition::any(any))
}

/// Monitored movies only, unless the caller asked for unmonitored ones.
pub fn monitored_filter(monitored: Option<bool>) -> Result<Condition, BuildError> {
    Condition::equal(MovieFields::MONITORED, monitored.unwrap_or(true))
}

/// Cutoff-unmet listings over the movie repository.
#[derive(Clone)]
pub struct CutoffDecisionEngine {
    movies: MovieRepository,
    profiles: ProfileRepository,
}

impl CutoffDecisionEngine {
    pub fn new(movies: MovieRepository, profiles: ProfileRepository) -> Self {
        Self { movies, profiles }
    }

    /// One page of movies that are cutoff unmet under `profiles`. Filters
    /// already on `spec`, such as [`monitored_filter`], still apply.
    pub fn find_unmet_for_profiles(
        &self,
        profiles: &[QualityProfile],
        spec: PagingSpec<Movie>,
    ) -> Result<PagingSpec<Movie>, OperationError> {
        let below = qualities_below_cutoff(profiles);
        log::debug!(
            "Cutoff listing over {} profile(s) with qualities below cutoff",
            below.len()
        );
        let base = self
            .movies
            .paged_builder()
            .and_where(cutoff_unmet_condition(&below)?)?;
        self.movies.list_with(spec, base)
    }

    /// Like [`Self::find_unmet_for_profiles`] over every stored profile.
    pub fn movies_where_cutoff_unmet(
        &self,
        spec: PagingSpec<Movie>,
    ) -> Result<PagingSpec<Movie>, OperationError> {
        let profiles = self.profiles.all()?;
        self.find_unmet_for_profiles(&profiles, spec)
    }
}
