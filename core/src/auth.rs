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

use async_trait::async_trait;
use rspotify::{prelude::*, scopes, AuthCodeSpotify, Config, Credentials, OAuth};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authorization code not provided")]
    MissingCode,
    #[error("Spotify authentication failed: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Spotify did not return an access token")]
    NoToken,
}

/// The redirect half of the Authorization Code Flow, as seen by the puzzle server.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// URL of Spotify's consent page.
    fn authorize_url(&self) -> Result<String, AuthError>;

    /// Trades the `code` from the callback for a bearer token.
    async fn exchange_code(&self, code: &str) -> Result<String, AuthError>;
}

pub struct SpotifyAuthorizer {
    credentials: Credentials,
    oauth: OAuth,
}

impl SpotifyAuthorizer {
    /// The game only ever reads top tracks, so `user-top-read` is the sole scope requested.
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        let oauth = OAuth {
            redirect_uri: redirect_uri.to_string(),
            scopes: scopes!("user-top-read"),
            ..Default::default()
        };

        Self {
            credentials: Credentials::new(client_id, client_secret),
            oauth,
        }
    }

    fn client(&self) -> AuthCodeSpotify {
        // Tokens are handed to the browser, never cached server side.
        let config = Config {
            token_cached: false,
            token_refreshing: false,
            ..Default::default()
        };
        AuthCodeSpotify::with_config(self.credentials.clone(), self.oauth.clone(), config)
    }
}

#[async_trait]
impl Authorizer for SpotifyAuthorizer {
    fn authorize_url(&self) -> Result<String, AuthError> {
        Ok(self.client().get_authorize_url(false)?)
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::MissingCode);
        }

        let spotify = self.client();
        spotify.request_token(code).await?;

        let token = spotify.token.lock().await.map_err(|_| AuthError::NoToken)?;
        match &*token {
            Some(token) => Ok(token.access_token.clone()),
            None => Err(AuthError::NoToken),
        }
    }
}
