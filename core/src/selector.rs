/*
    pixel-jumble | Guess the album from your own Spotify listening history.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::library::{ListeningHistory, UpstreamError};
use crate::metadata::BirthDateSource;
use crate::models::{
    birth_date_hint, genre_hint, is_displayable_name, play_count_hint, popularity_hint,
    AvailableHints, Puzzle, TimeRange, Track,
};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Spotify's maximum page size for top tracks.
pub const TOP_TRACKS_LIMIT: u32 = 50;

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Spotify rejected the access token")]
    UpstreamAuth,
    #[error("Spotify API unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("No top tracks found to generate a game.")]
    EmptyHistory,
    #[error("None of your top albums can be turned into a puzzle.")]
    NoSuitablePuzzle,
}

impl From<UpstreamError> for SelectionError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unauthorized => SelectionError::UpstreamAuth,
            other => SelectionError::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// A puzzle plus whether the client must forget its guessed albums for this mode.
#[derive(Debug, Clone)]
pub struct Selection {
    pub puzzle: Puzzle,
    pub reset_history: bool,
}

/// Candidate tracks for the next puzzle.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    pub tracks: Vec<Track>,
    /// Set when every displayable album was already guessed and the pool was refilled.
    pub reset_history: bool,
}

impl Pool {
    /// Drops guessed and undisplayable albums. When nothing is left but the user
    /// has history, guessed albums are allowed back in and `reset_history` is set.
    pub fn build(tracks: Vec<Track>, exclude: &HashSet<String>) -> Self {
        let unguessed: Vec<Track> = tracks
            .iter()
            .filter(|track| {
                !exclude.contains(&track.album.id) && is_displayable_name(&track.album.name)
            })
            .cloned()
            .collect();

        if !unguessed.is_empty() || tracks.is_empty() {
            return Self {
                tracks: unguessed,
                reset_history: false,
            };
        }

        Self {
            tracks: tracks
                .into_iter()
                .filter(|track| is_displayable_name(&track.album.name))
                .collect(),
            reset_history: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Track> {
        self.tracks.choose(rng)
    }

    pub fn count_album(&self, album_id: &str) -> usize {
        self.tracks
            .iter()
            .filter(|track| track.album.id == album_id)
            .count()
    }
}

pub struct PuzzleSelector {
    history: Arc<dyn ListeningHistory>,
    birth_dates: Arc<dyn BirthDateSource>,
}

impl PuzzleSelector {
    pub fn new(history: Arc<dyn ListeningHistory>, birth_dates: Arc<dyn BirthDateSource>) -> Self {
        Self {
            history,
            birth_dates,
        }
    }

    /// Picks a random unguessed album from the user's top tracks and gathers its hints.
    pub async fn select(
        &self,
        access_token: &str,
        range: TimeRange,
        exclude: &HashSet<String>,
    ) -> Result<Selection, SelectionError> {
        let mut rng = StdRng::from_os_rng();
        self.select_with_rng(access_token, range, exclude, &mut rng)
            .await
    }

    /// Same as [`select`](Self::select), drawing the album from `rng`.
    pub async fn select_with_rng<R: Rng + Send + ?Sized>(
        &self,
        access_token: &str,
        range: TimeRange,
        exclude: &HashSet<String>,
        rng: &mut R,
    ) -> Result<Selection, SelectionError> {
        let pool = self.load_pool(access_token, range, exclude).await?;
        let chosen = pool
            .choose(rng)
            .cloned()
            .ok_or(SelectionError::NoSuitablePuzzle)?;

        self.assemble(access_token, &pool, chosen).await
    }

    pub async fn load_pool(
        &self,
        access_token: &str,
        range: TimeRange,
        exclude: &HashSet<String>,
    ) -> Result<Pool, SelectionError> {
        let tracks = self
            .history
            .top_tracks(access_token, range, TOP_TRACKS_LIMIT)
            .await?;

        if tracks.is_empty() {
            return Err(SelectionError::EmptyHistory);
        }

        let total = tracks.len();
        let pool = Pool::build(tracks, exclude);
        if pool.is_empty() {
            return Err(SelectionError::NoSuitablePuzzle);
        }

        if pool.reset_history {
            info!(
                "All {} {} albums were already guessed, replaying from the full pool",
                total, range
            );
        } else {
            debug!("{} of {} top tracks are eligible", pool.tracks.len(), total);
        }

        Ok(pool)
    }

    /// Builds the puzzle for `chosen`. Hint lookups never fail the request.
    pub async fn assemble(
        &self,
        access_token: &str,
        pool: &Pool,
        chosen: Track,
    ) -> Result<Selection, SelectionError> {
        let mut hints = AvailableHints {
            play_count: Some(play_count_hint(pool.count_album(&chosen.album.id))),
            ..Default::default()
        };

        let artist = chosen.primary_artist();

        if let Some(artist_id) = artist.and_then(|a| a.id.as_deref()) {
            match self.history.artist_profile(access_token, artist_id).await {
                Ok(profile) => {
                    hints.artist_popularity = Some(popularity_hint(profile.popularity));
                    hints.primary_genre = profile.primary_genre().map(genre_hint);
                }
                Err(e) => warn!("Could not fetch artist {}: {}", artist_id, e),
            }
        }

        if let Some(artist) = artist {
            hints.artist_birth_date = self
                .birth_dates
                .birth_date(&artist.name, artist.profile_url.as_deref())
                .await
                .map(|date| birth_date_hint(&date));
        }

        let album = &chosen.album;
        let puzzle = Puzzle {
            album_id: album.id.clone(),
            album_name: album.name.clone(),
            simplified_album_name: album.simplified_name(),
            artist_name: artist.map(|a| a.name.clone()).unwrap_or_default(),
            cover_url: album.cover_url().map(|url| url.to_string()),
            release_date: album.release_date.clone(),
            available_hints: hints,
        };

        Ok(Selection {
            puzzle,
            reset_history: pool.reset_history,
        })
    }
}
