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

use std::collections::HashSet;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GameDataQuery {
    pub access_token: Option<String>,
    pub exclude: Option<String>,
    pub time_range: Option<String>,
}

impl GameDataQuery {
    pub fn token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Album IDs from the comma-separated `exclude` parameter.
    pub fn excluded_albums(&self) -> HashSet<String> {
        self.exclude
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_albums_skip_blanks() {
        let query = GameDataQuery {
            exclude: Some("a, b,,c ,".to_string()),
            ..Default::default()
        };
        let excluded = query.excluded_albums();
        assert_eq!(excluded.len(), 3);
        assert!(excluded.contains("b"));
        assert!(excluded.contains("c"));
    }

    #[test]
    fn test_blank_token_is_missing() {
        let query = GameDataQuery {
            access_token: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.token(), None);
        assert!(GameDataQuery::default().excluded_albums().is_empty());
    }
}
