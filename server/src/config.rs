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

use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_FRONTEND_URI: &str = "http://localhost:3000";
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:5000/callback";
pub const DEFAULT_METADATA_DELAY_MS: u64 = 1000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("must define {0} environment variable")]
    Missing(&'static str),
    #[error("could not parse {name}={value}")]
    Invalid { name: &'static str, value: String },
}

/// Server settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub frontend_uri: String,
    pub port: u16,
    pub metadata_delay: Duration,
    pub musicbrainz_user_agent: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let delay_ms = match get("METADATA_DELAY_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "METADATA_DELAY_MS",
                value,
            })?,
            None => DEFAULT_METADATA_DELAY_MS,
        };

        Ok(Self {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            redirect_uri: get("REDIRECT_URI").unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string()),
            frontend_uri: get("FRONTEND_URI")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URI.to_string())
                .trim_end_matches('/')
                .to_string(),
            port,
            metadata_delay: Duration::from_millis(delay_ms),
            musicbrainz_user_agent: get("MUSICBRAINZ_USER_AGENT").unwrap_or_else(|| {
                format!("pixel-jumble/{}", env!("CARGO_PKG_VERSION"))
            }),
        })
    }
}
