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

use std::sync::Arc;

use jumble_core::{Authorizer, PuzzleSelector};

/// Shared, read-only collaborators handed to every route.
#[derive(Clone)]
pub struct Environment {
    pub selector: Arc<PuzzleSelector>,
    pub authorizer: Arc<dyn Authorizer>,
    pub frontend_uri: Arc<str>,
}

impl Environment {
    pub fn new(
        selector: Arc<PuzzleSelector>,
        authorizer: Arc<dyn Authorizer>,
        frontend_uri: &str,
    ) -> Self {
        Environment {
            selector,
            authorizer,
            frontend_uri: Arc::from(frontend_uri.trim_end_matches('/')),
        }
    }
}
