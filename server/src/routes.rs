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

use log::error;
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, WithStatus};

use jumble_core::SelectionError;

mod handlers;
mod query;
pub mod rejection;

pub use internal::*;
use rejection::{ErrorBody, ServerError};

pub use jumble_core::models::RESET_HEADER;

const GENERIC_FAILURE: &str = "Failed to generate game data.";

pub async fn format_rejection(
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let status = status_code_for(&r.error);
        error!(
            "Request failed: context={:?} status={} error={}",
            r.context, status, r.error
        );

        let body = ErrorBody {
            error: public_message(&r.error),
        };
        return Ok(with_status(json(&body), status));
    }

    Err(rej)
}

fn status_code_for(e: &ServerError) -> StatusCode {
    use ServerError::*;

    match e {
        MissingToken | InvalidTimeRange(..) => StatusCode::BAD_REQUEST,
        Selection(SelectionError::EmptyHistory | SelectionError::NoSuitablePuzzle) => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Upstream failures are logged in full but reported with a generic message.
fn public_message(e: &ServerError) -> String {
    match e {
        ServerError::Selection(
            SelectionError::UpstreamAuth | SelectionError::UpstreamUnavailable(..),
        ) => GENERIC_FAILURE.to_string(),
        ServerError::Authorization(..) | ServerError::InvalidRedirect(..) => {
            "Failed to start Spotify login.".to_string()
        }
        other => other.to_string(),
    }
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::path::end;
    use warp::reject::Rejection;
    use warp::Filter;
    use warp::Reply;
    use warp::{get as g, path as p, query};

    use super::{format_rejection, handlers, query as q, RESET_HEADER};
    use crate::environment::Environment;

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route {
        ($name:ident => $handler:ident; $($filters:expr),+) => (
            pub fn $name(environment: Environment) -> Route {
                warp::any()
                    .map(move || environment.clone())
                    $(.and($filters))+
                    .and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    route!(make_login_route => login; p("login"), end(), g());
    route!(make_callback_route => callback; p("callback"), end(), g(), query::<q::CallbackQuery>());
    route!(make_game_data_route => game_data; p("game-data"), end(), g(), query::<q::GameDataQuery>());

    /// Every route, with JSON error bodies and permissive CORS for the browser client.
    pub fn make_routes(
        environment: Environment,
    ) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let cors = warp::cors()
            .allow_any_origin()
            .allow_methods(vec!["GET"])
            .expose_headers(vec![RESET_HEADER]);

        make_login_route(environment.clone())
            .or(make_callback_route(environment.clone()))
            .unify()
            .or(make_game_data_route(environment))
            .unify()
            .recover(format_rejection)
            .with(cors)
    }
}
