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

use jumble_core::models::RESET_HEADER;
use jumble_core::{Puzzle, TimeRange};
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request to the puzzle server failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Puzzle server answered {status}: {message}")]
    Server { status: StatusCode, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// A puzzle plus the server's request to forget the guessed albums of its mode.
#[derive(Debug, Clone)]
pub struct FetchedPuzzle {
    pub puzzle: Puzzle,
    pub reset_history: bool,
}

/// Talks to the puzzle server over HTTP.
pub struct PuzzleClient {
    http: Client,
    base_url: String,
}

impl PuzzleClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("pixel-jumble/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The page that starts the Spotify login flow.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url)
    }

    pub async fn fetch_puzzle(
        &self,
        access_token: &str,
        time_range: TimeRange,
        exclude: &[String],
    ) -> Result<FetchedPuzzle, ApiError> {
        let exclude = exclude.join(",");
        debug!(
            "Requesting a {} puzzle excluding [{}]",
            time_range.as_str(),
            exclude
        );

        let response = self
            .http
            .get(format!("{}/game-data", self.base_url))
            .query(&[
                ("access_token", access_token),
                ("exclude", exclude.as_str()),
                ("time_range", time_range.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(ApiError::Server { status, message });
        }

        let reset_history = reset_requested(response.headers());
        let puzzle = response.json::<Puzzle>().await?;
        Ok(FetchedPuzzle {
            puzzle,
            reset_history,
        })
    }

    /// Raw bytes of a cover image.
    pub async fn fetch_cover(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}

fn reset_requested(headers: &HeaderMap) -> bool {
    headers
        .get(RESET_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}
