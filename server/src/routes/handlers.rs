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

use std::time::Instant;

use log::{error, info};
use url::Url;
use warp::http::Uri;
use warp::reject;
use warp::reply::{json, with_header, Reply};

use jumble_core::TimeRange;

use super::query::{CallbackQuery, GameDataQuery};
use super::rejection::{Context, Rejection, ServerError};
use super::RESET_HEADER;
use crate::environment::Environment;

type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

pub async fn login(environment: Environment) -> RouteResult {
    let url = environment
        .authorizer
        .authorize_url()
        .map_err(|e| Rejection::new(Context::login(), e.into()))?;

    redirect(&url).map_err(|e| Rejection::new(Context::login(), e).into())
}

/// Finishes the OAuth dance and bounces the browser back to the game with the
/// token, or with `error=auth_failed`.
pub async fn callback(environment: Environment, query: CallbackQuery) -> RouteResult {
    if let Some(denied) = &query.error {
        error!("Spotify authorization was denied: {}", denied);
    }

    let code = query.code.unwrap_or_default();
    let target = match environment.authorizer.exchange_code(&code).await {
        Ok(token) => frontend_url(&environment.frontend_uri, "access_token", &token),
        Err(e) => {
            error!("Error in /callback: {}", e);
            frontend_url(&environment.frontend_uri, "error", "auth_failed")
        }
    };

    target
        .and_then(|url| redirect(&url))
        .map_err(|e| Rejection::new(Context::callback(), e).into())
}

pub async fn game_data(environment: Environment, query: GameDataQuery) -> RouteResult {
    let start = Instant::now();
    let excluded = query.excluded_albums();
    let context = Context::game_data(query.time_range.clone(), excluded.len());
    let reject =
        |e: ServerError| -> reject::Rejection { Rejection::new(context.clone(), e).into() };

    let token = query.token().ok_or_else(|| reject(ServerError::MissingToken))?;

    let range = match query.time_range.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => raw
            .parse::<TimeRange>()
            .map_err(|e| reject(e.into()))?,
        _ => TimeRange::default(),
    };

    let selection = environment
        .selector
        .select(token, range, &excluded)
        .await
        .map_err(|e| reject(e.into()))?;

    info!(
        "Served {} puzzle for album {} in {:?} (reset: {})",
        range,
        selection.puzzle.album_id,
        start.elapsed(),
        selection.reset_history
    );

    let reply = json(&selection.puzzle);
    if selection.reset_history {
        Ok(Box::new(with_header(reply, RESET_HEADER, "true")))
    } else {
        Ok(Box::new(reply))
    }
}

/// `{frontend}/?{key}={value}`.
fn frontend_url(frontend_uri: &str, key: &str, value: &str) -> Result<String, ServerError> {
    let mut url =
        Url::parse(frontend_uri).map_err(|e| ServerError::InvalidRedirect(e.to_string()))?;
    url.query_pairs_mut().clear().append_pair(key, value);
    Ok(url.to_string())
}

fn redirect(target: &str) -> Result<Box<dyn Reply>, ServerError> {
    let uri: Uri = target
        .parse()
        .map_err(|_| ServerError::InvalidRedirect(target.to_string()))?;
    Ok(Box::new(warp::redirect::found(uri)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_url_appends_query() {
        assert_eq!(
            frontend_url("http://localhost:3000", "access_token", "abc").unwrap(),
            "http://localhost:3000/?access_token=abc"
        );
        assert_eq!(
            frontend_url("https://jumble.example/app", "error", "auth_failed").unwrap(),
            "https://jumble.example/app?error=auth_failed"
        );
        assert!(frontend_url("not a url", "error", "auth_failed").is_err());
    }
}
