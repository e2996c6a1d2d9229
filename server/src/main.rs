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

use std::process;
use std::sync::Arc;

use dotenvy::dotenv;
use log::{error, info};

use jumble_core::{MusicBrainzLookup, PuzzleSelector, SpotifyAuthorizer, SpotifyLibrary};
use jumble_server::config::ServerConfig;
use jumble_server::environment::Environment;
use jumble_server::routes;

#[tokio::main]
async fn main() {
    if dotenv().is_err() {
        // No .env file; rely on the real environment.
    }

    env_logger::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };

    let birth_dates =
        match MusicBrainzLookup::new(&config.musicbrainz_user_agent, config.metadata_delay) {
            Ok(lookup) => lookup,
            Err(e) => {
                eprintln!("Error initializing MusicBrainz client: {}", e);
                process::exit(1);
            }
        };

    let selector = PuzzleSelector::new(Arc::new(SpotifyLibrary::new()), Arc::new(birth_dates));
    let authorizer = SpotifyAuthorizer::new(
        &config.client_id,
        &config.client_secret,
        &config.redirect_uri,
    );
    let environment = Environment::new(
        Arc::new(selector),
        Arc::new(authorizer),
        &config.frontend_uri,
    );

    let (address, server) = warp::serve(routes::make_routes(environment))
        .bind_with_graceful_shutdown(([0, 0, 0, 0], config.port), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        });

    info!(
        "Backend server listening on {} (frontend: {})",
        address, config.frontend_uri
    );
    server.await;
    info!("Exiting gracefully...");
}
