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

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use warp::http::StatusCode;

use jumble_core::library::{ListeningHistory, UpstreamError};
use jumble_core::metadata::BirthDateSource;
use jumble_core::models::{Album, ArtistProfile, ArtistRef, CoverImage, TimeRange, Track};
use jumble_core::{AuthError, Authorizer, Puzzle, PuzzleSelector};
use jumble_server::environment::Environment;
use jumble_server::routes::{make_routes, RESET_HEADER};

const FRONTEND: &str = "http://localhost:3000";

fn track(album_id: &str, album_name: &str) -> Track {
    Track {
        album: Album {
            id: album_id.to_string(),
            name: album_name.to_string(),
            release_date: Some("1969-09-26".to_string()),
            images: vec![CoverImage {
                url: format!("https://i.scdn.co/image/{}", album_id),
                width: Some(640),
            }],
        },
        artists: vec![ArtistRef {
            id: Some("3WrFJ7ztbogyGnTHbHJFl2".to_string()),
            name: "The Beatles".to_string(),
            profile_url: Some("https://open.spotify.com/artist/3WrFJ7ztbogyGnTHbHJFl2".to_string()),
        }],
    }
}

#[derive(Default)]
struct FakeHistory {
    tracks: Vec<Track>,
    unauthorized: bool,
    last_range: Mutex<Option<TimeRange>>,
}

#[async_trait]
impl ListeningHistory for FakeHistory {
    async fn top_tracks(
        &self,
        access_token: &str,
        range: TimeRange,
        _limit: u32,
    ) -> Result<Vec<Track>, UpstreamError> {
        *self.last_range.lock().unwrap() = Some(range);
        if self.unauthorized || access_token == "expired" {
            return Err(UpstreamError::Unauthorized);
        }
        Ok(self.tracks.clone())
    }

    async fn artist_profile(
        &self,
        _access_token: &str,
        _artist_id: &str,
    ) -> Result<ArtistProfile, UpstreamError> {
        Err(UpstreamError::Unavailable("artist endpoint down".to_string()))
    }
}

struct NoBirthDate;

#[async_trait]
impl BirthDateSource for NoBirthDate {
    async fn birth_date(&self, _artist_name: &str, _profile_url: Option<&str>) -> Option<String> {
        None
    }
}

struct FakeAuthorizer;

#[async_trait]
impl Authorizer for FakeAuthorizer {
    fn authorize_url(&self) -> Result<String, AuthError> {
        Ok(
            "https://accounts.spotify.com/authorize?response_type=code&scope=user-top-read"
                .to_string(),
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        match code {
            "good-code" => Ok("fresh-token".to_string()),
            "" => Err(AuthError::MissingCode),
            _ => Err(AuthError::NoToken),
        }
    }
}

fn environment(history: Arc<FakeHistory>) -> Environment {
    let selector = PuzzleSelector::new(history, Arc::new(NoBirthDate));
    Environment::new(Arc::new(selector), Arc::new(FakeAuthorizer), FRONTEND)
}

fn body_json(body: &[u8]) -> Value {
    serde_json::from_slice(body).expect("response body is JSON")
}

#[tokio::test]
async fn game_data_without_token_is_bad_request() {
    let routes = make_routes(environment(Arc::new(FakeHistory::default())));

    let response = warp::test::request()
        .method("GET")
        .path("/game-data?time_range=long_term")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response.body())["error"], "Access token not provided");
}

#[tokio::test]
async fn game_data_with_unknown_time_range_is_bad_request() {
    let routes = make_routes(environment(Arc::new(FakeHistory::default())));

    let response = warp::test::request()
        .path("/game-data?access_token=t&time_range=forever")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response.body())["error"]
        .as_str()
        .unwrap()
        .contains("forever"));
}

#[tokio::test]
async fn empty_history_is_not_found() {
    let routes = make_routes(environment(Arc::new(FakeHistory::default())));

    let response = warp::test::request()
        .path("/game-data?access_token=t&time_range=short_term")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response.body())["error"],
        "No top tracks found to generate a game."
    );
}

#[tokio::test]
async fn unsuitable_names_are_not_found() {
    let history = FakeHistory {
        tracks: vec![track("x", "★★★")],
        ..Default::default()
    };
    let routes = make_routes(environment(Arc::new(history)));

    let response = warp::test::request()
        .path("/game-data?access_token=t")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn albums_with_empty_simplified_name_are_never_served() {
    let history = FakeHistory {
        tracks: vec![track("oasis", "(What's The Story) Morning Glory?")],
        ..Default::default()
    };
    let routes = make_routes(environment(Arc::new(history)));

    let response = warp::test::request()
        .path("/game-data?access_token=t")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let history = FakeHistory {
        tracks: vec![
            track("oasis", "(What's The Story) Morning Glory?"),
            track("definitely", "Definitely Maybe"),
        ],
        ..Default::default()
    };
    let routes = make_routes(environment(Arc::new(history)));

    let response = warp::test::request()
        .path("/game-data?access_token=t")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.body());
    assert_eq!(body["albumId"], "definitely");
    assert_eq!(body["simplifiedAlbumName"], "definitely maybe");
}

#[tokio::test]
async fn rejected_token_is_generic_server_error() {
    let history = FakeHistory {
        tracks: vec![track("abbey", "Abbey Road")],
        ..Default::default()
    };
    let routes = make_routes(environment(Arc::new(history)));

    let response = warp::test::request()
        .path("/game-data?access_token=expired")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response.body())["error"],
        "Failed to generate game data."
    );
}

#[tokio::test]
async fn abbey_road_play_count_hint() {
    let history = Arc::new(FakeHistory {
        tracks: vec![
            track("abbey", "Abbey Road"),
            track("abbey", "Abbey Road"),
            track("abbey", "Abbey Road"),
        ],
        ..Default::default()
    });
    let routes = make_routes(environment(history.clone()));

    let response = warp::test::request()
        .path("/game-data?access_token=t&exclude=&time_range=long_term")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(RESET_HEADER).is_none());
    assert_eq!(*history.last_range.lock().unwrap(), Some(TimeRange::LongTerm));

    let body = body_json(response.body());
    assert_eq!(
        body["availableHints"]["playCount"],
        "You have 3 song(s) from this album in your top tracks for this period."
    );
    assert_eq!(body["albumName"], "Abbey Road");
    assert_eq!(body["simplifiedAlbumName"], "abbey road");
    assert!(body["availableHints"]["artistPopularity"].is_null());
    assert!(body["availableHints"]["artistBirthDate"].is_null());
}

#[tokio::test]
async fn exhausted_pool_sets_reset_header() {
    let history = FakeHistory {
        tracks: vec![
            track("abbey", "Abbey Road (Remastered)"),
            track("revolver", "Revolver"),
        ],
        ..Default::default()
    };
    let routes = make_routes(environment(Arc::new(history)));

    let response = warp::test::request()
        .path("/game-data?access_token=t&exclude=abbey,revolver&time_range=medium_term")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[RESET_HEADER], "true");

    let puzzle: Puzzle = serde_json::from_slice(response.body()).unwrap();
    assert!(["abbey", "revolver"].contains(&puzzle.album_id.as_str()));
    assert_eq!(
        puzzle.simplified_album_name,
        jumble_core::simplify_album_name(&puzzle.album_name)
    );
}

#[tokio::test]
async fn missing_time_range_defaults_to_medium_term() {
    let history = Arc::new(FakeHistory {
        tracks: vec![track("abbey", "Abbey Road")],
        ..Default::default()
    });
    let routes = make_routes(environment(history.clone()));

    let response = warp::test::request()
        .path("/game-data?access_token=t")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(*history.last_range.lock().unwrap(), Some(TimeRange::MediumTerm));
}

#[tokio::test]
async fn login_redirects_to_spotify() {
    let routes = make_routes(environment(Arc::new(FakeHistory::default())));

    let response = warp::test::request().path("/login").reply(&routes).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://accounts.spotify.com/authorize"));
    assert!(location.contains("scope=user-top-read"));
}

#[tokio::test]
async fn callback_hands_token_to_frontend() {
    let routes = make_routes(environment(Arc::new(FakeHistory::default())));

    let response = warp::test::request()
        .path("/callback?code=good-code")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()["location"],
        "http://localhost:3000/?access_token=fresh-token"
    );
}

#[tokio::test]
async fn failed_callback_redirects_with_error() {
    let routes = make_routes(environment(Arc::new(FakeHistory::default())));

    for path in ["/callback?code=bad-code", "/callback?error=access_denied", "/callback"] {
        let response = warp::test::request().path(path).reply(&routes).await;

        assert_eq!(response.status(), StatusCode::FOUND, "{}", path);
        assert_eq!(
            response.headers()["location"],
            "http://localhost:3000/?error=auth_failed"
        );
    }
}

#[tokio::test]
async fn cors_exposes_reset_header() {
    let history = FakeHistory {
        tracks: vec![track("abbey", "Abbey Road")],
        ..Default::default()
    };
    let routes = make_routes(environment(Arc::new(history)));

    let response = warp::test::request()
        .path("/game-data?access_token=t&exclude=abbey")
        .header("origin", "http://localhost:3000")
        .reply(&routes)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
    assert_eq!(response.headers()[RESET_HEADER], "true");
}
