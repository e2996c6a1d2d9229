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

use jumble_core::auth::AuthError;
use jumble_core::models::UnknownTimeRange;
use jumble_core::selector::SelectionError;
use serde::Serialize;
use thiserror::Error;
use warp::reject;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Access token not provided")]
    MissingToken,
    #[error("{0}")]
    InvalidTimeRange(#[from] UnknownTimeRange),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Authorization(#[from] AuthError),
    #[error("Invalid redirect target: {0}")]
    InvalidRedirect(String),
}

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: ServerError,
}

impl Rejection {
    pub fn new(context: Context, error: ServerError) -> Self {
        Rejection { context, error }
    }
}

impl reject::Reject for Rejection {}

/// Body of every error response: `{"error": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub(crate) error: String,
}

/// Which route failed, for the logs.
#[derive(Clone, Debug)]
pub enum Context {
    Login,
    Callback,
    GameData {
        time_range: Option<String>,
        excluded: usize,
    },
}

impl Context {
    pub fn login() -> Context {
        Context::Login
    }

    pub fn callback() -> Context {
        Context::Callback
    }

    pub fn game_data(time_range: Option<String>, excluded: usize) -> Context {
        Context::GameData {
            time_range,
            excluded,
        }
    }
}
