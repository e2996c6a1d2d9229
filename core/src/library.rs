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

use crate::models::{Album, ArtistProfile, ArtistRef, CoverImage, TimeRange, Track};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use rspotify::{
    http::HttpError,
    model::{ArtistId, FullTrack, TimeRange as SpotifyTimeRange},
    prelude::*,
    AuthCodeSpotify, ClientError, Token,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Spotify rejected the access token")]
    Unauthorized,
    #[error("Spotify API unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid Artist ID: {0}")]
    InvalidArtistId(String),
}

impl From<ClientError> for UpstreamError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(http) => match *http {
                HttpError::StatusCode(response)
                    if matches!(response.status().as_u16(), 401 | 403) =>
                {
                    UpstreamError::Unauthorized
                }
                other => UpstreamError::Unavailable(other.to_string()),
            },
            other => UpstreamError::Unavailable(other.to_string()),
        }
    }
}

/// Read access to a user's listening history, authorized per call by their bearer token.
#[async_trait]
pub trait ListeningHistory: Send + Sync {
    async fn top_tracks(
        &self,
        access_token: &str,
        range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Track>, UpstreamError>;

    async fn artist_profile(
        &self,
        access_token: &str,
        artist_id: &str,
    ) -> Result<ArtistProfile, UpstreamError>;
}

/// `ListeningHistory` backed by the Spotify Web API.
///
/// The server never stores tokens, so a short-lived client is built for every call.
#[derive(Debug, Default, Clone)]
pub struct SpotifyLibrary;

impl SpotifyLibrary {
    pub fn new() -> Self {
        Self
    }

    fn client(&self, access_token: &str) -> AuthCodeSpotify {
        // Spotify tokens live for an hour; marking it fresh keeps rspotify from
        // trying to refresh a token it has no refresh secret for.
        let token = Token {
            access_token: access_token.to_string(),
            expires_in: Duration::hours(1),
            expires_at: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        };
        AuthCodeSpotify::from_token(token)
    }
}

#[async_trait]
impl ListeningHistory for SpotifyLibrary {
    async fn top_tracks(
        &self,
        access_token: &str,
        range: TimeRange,
        limit: u32,
    ) -> Result<Vec<Track>, UpstreamError> {
        let page = self
            .client(access_token)
            .current_user_top_tracks_manual(Some(range.into()), Some(limit), None)
            .await?;

        debug!("Spotify returned {} top tracks for {}", page.items.len(), range);

        Ok(page.items.into_iter().filter_map(convert_track).collect())
    }

    async fn artist_profile(
        &self,
        access_token: &str,
        artist_id: &str,
    ) -> Result<ArtistProfile, UpstreamError> {
        let id = ArtistId::from_id(artist_id)
            .map_err(|_| UpstreamError::InvalidArtistId(artist_id.to_string()))?;

        let artist = self.client(access_token).artist(id).await?;

        Ok(ArtistProfile {
            popularity: artist.popularity,
            genres: artist.genres,
        })
    }
}

impl From<TimeRange> for SpotifyTimeRange {
    fn from(range: TimeRange) -> Self {
        match range {
            TimeRange::ShortTerm => SpotifyTimeRange::ShortTerm,
            TimeRange::MediumTerm => SpotifyTimeRange::MediumTerm,
            TimeRange::LongTerm => SpotifyTimeRange::LongTerm,
        }
    }
}

/// Tracks without an album ID (local files) cannot become puzzles and are dropped.
fn convert_track(track: FullTrack) -> Option<Track> {
    let album = track.album;
    let album_id = album.id?.id().to_string();

    let artists = track
        .artists
        .into_iter()
        .map(|artist| ArtistRef {
            id: artist.id.map(|id| id.id().to_string()),
            profile_url: artist.external_urls.get("spotify").cloned(),
            name: artist.name,
        })
        .collect();

    Some(Track {
        album: Album {
            id: album_id,
            name: album.name,
            release_date: album.release_date,
            images: album
                .images
                .into_iter()
                .map(|image| CoverImage {
                    url: image.url,
                    width: image.width,
                })
                .collect(),
        },
        artists,
    })
}
