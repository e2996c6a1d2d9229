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

pub mod auth;
pub mod library;
pub mod metadata;
pub mod models;
pub mod selector;

// Re-export key items for convenience
pub use auth::{AuthError, Authorizer, SpotifyAuthorizer};
pub use library::{ListeningHistory, SpotifyLibrary, UpstreamError};
pub use metadata::{BirthDateSource, MusicBrainzLookup};
pub use models::{simplify_album_name, AvailableHints, Puzzle, TimeRange};
pub use selector::{PuzzleSelector, Selection, SelectionError};
