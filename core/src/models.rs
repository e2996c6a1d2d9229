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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Response header telling the client to forget its guessed albums for the requested mode.
pub const RESET_HEADER: &str = "x-reset-guessed-list";

/// Punctuation allowed in album names on top of ASCII alphanumerics and whitespace.
const ALLOWED_PUNCTUATION: &str = "'.,&!?-():";

/// The window over which Spotify computes a user's top tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// Roughly the last four weeks.
    ShortTerm,
    /// Roughly the last six months.
    #[default]
    MediumTerm,
    /// All-time history.
    LongTerm,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [
        TimeRange::ShortTerm,
        TimeRange::MediumTerm,
        TimeRange::LongTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }

    /// Human label used by the game's mode picker.
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "Recent Hits (4 Weeks)",
            TimeRange::MediumTerm => "Favorites (6 Months)",
            TimeRange::LongTerm => "All-Time Classics",
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTimeRange(pub String);

impl fmt::Display for UnknownTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown time range '{}' (expected short_term, medium_term or long_term)",
            self.0
        )
    }
}

impl std::error::Error for UnknownTimeRange {}

impl FromStr for TimeRange {
    type Err = UnknownTimeRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "short_term" => Ok(TimeRange::ShortTerm),
            "medium_term" => Ok(TimeRange::MediumTerm),
            "long_term" => Ok(TimeRange::LongTerm),
            other => Err(UnknownTimeRange(other.to_string())),
        }
    }
}

/// One cover rendition of an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub url: String,
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub release_date: Option<String>,
    pub images: Vec<CoverImage>,
}

impl Album {
    pub fn simplified_name(&self) -> String {
        simplify_album_name(&self.name)
    }

    /// URL of the widest cover. Falls back to the first image when Spotify omits sizes.
    pub fn cover_url(&self) -> Option<&str> {
        self.images
            .iter()
            .filter(|image| image.width.is_some())
            .max_by_key(|image| image.width)
            .or_else(|| self.images.first())
            .map(|image| image.url.as_str())
    }
}

/// Artist as referenced from a track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistRef {
    pub id: Option<String>,
    pub name: String,
    /// Canonical Spotify profile, e.g. `https://open.spotify.com/artist/...`.
    pub profile_url: Option<String>,
}

/// One entry of the user's top tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub album: Album,
    pub artists: Vec<ArtistRef>,
}

impl Track {
    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }
}

/// Details fetched with a second Spotify call for the chosen artist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistProfile {
    pub popularity: u32,
    pub genres: Vec<String>,
}

impl ArtistProfile {
    pub fn primary_genre(&self) -> Option<&str> {
        self.genres
            .iter()
            .map(|genre| genre.trim())
            .find(|genre| !genre.is_empty())
    }
}

/// Optional clues. `None` serializes as `null` and means the hint is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableHints {
    pub play_count: Option<String>,
    pub artist_popularity: Option<String>,
    pub primary_genre: Option<String>,
    pub artist_birth_date: Option<String>,
}

impl AvailableHints {
    /// Hints in the order the game reveals them, skipping unavailable ones.
    pub fn in_reveal_order(&self) -> Vec<String> {
        [
            &self.play_count,
            &self.artist_popularity,
            &self.primary_genre,
            &self.artist_birth_date,
        ]
        .into_iter()
        .flatten()
        .cloned()
        .collect()
    }
}

/// Payload served by `/game-data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub album_id: String,
    pub album_name: String,
    pub simplified_album_name: String,
    pub artist_name: String,
    pub cover_url: Option<String>,
    pub release_date: Option<String>,
    pub available_hints: AvailableHints,
}

/// Lowercases the name, cuts it at the first `(` or `:` and trims the rest.
///
/// `"Abbey Road (Remastered)"` becomes `"abbey road"`, so edition suffixes never
/// have to be typed by the player.
pub fn simplify_album_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let cut = lowered
        .find(|c: char| c == '(' || c == ':')
        .unwrap_or(lowered.len());
    lowered[..cut].trim().to_string()
}

/// Whether an album name only uses characters the game can display and compare.
///
/// Names that simplify to nothing, like `"(What's The Story) Morning Glory?"`,
/// could never be guessed and are rejected too.
pub fn is_displayable_name(name: &str) -> bool {
    name.chars().all(|c| {
        c.is_ascii_alphanumeric() || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(c)
    }) && !simplify_album_name(name).is_empty()
}

pub fn play_count_hint(count: usize) -> String {
    format!(
        "You have {} song(s) from this album in your top tracks for this period.",
        count
    )
}

pub fn popularity_hint(popularity: u32) -> String {
    format!("The artist's popularity score is {}/100.", popularity)
}

pub fn genre_hint(genre: &str) -> String {
    format!("The artist's primary genre is {}.", genre)
}

pub fn birth_date_hint(date: &str) -> String {
    format!("The artist was born on {}.", date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(url: &str, width: Option<u32>) -> CoverImage {
        CoverImage {
            url: url.to_string(),
            width,
        }
    }

    #[test]
    fn test_simplify_cuts_at_parenthesis_and_colon() {
        assert_eq!(simplify_album_name("Abbey Road (Remastered)"), "abbey road");
        assert_eq!(
            simplify_album_name("Star Wars: A New Hope"),
            "star wars"
        );
        assert_eq!(
            simplify_album_name("  The Dark Side Of The Moon  "),
            "the dark side of the moon"
        );
    }

    #[test]
    fn test_simplify_uses_first_separator() {
        assert_eq!(simplify_album_name("Live: At Leeds (Deluxe)"), "live");
        assert_eq!(simplify_album_name("(What's The Story)"), "");
    }

    #[test]
    fn test_displayable_name_allow_list() {
        assert!(is_displayable_name("Abbey Road"));
        assert!(is_displayable_name("Rock 'n' Roll, Vol. 2 - Live! (Deluxe): Side A"));
        assert!(!is_displayable_name("÷"));
        assert!(!is_displayable_name("Björk"));
        assert!(!is_displayable_name("AC/DC"));
        assert!(!is_displayable_name("   "));
    }

    #[test]
    fn test_names_that_simplify_to_nothing_are_not_displayable() {
        assert!(!is_displayable_name("(What's The Story) Morning Glory?"));
        assert!(!is_displayable_name(": Side B"));
        assert!(is_displayable_name("Morning Glory (Remastered)"));
    }

    #[test]
    fn test_time_range_round_trip_through_str() {
        for range in TimeRange::ALL {
            assert_eq!(range.as_str().parse::<TimeRange>(), Ok(range));
        }
        assert!("forever".parse::<TimeRange>().is_err());
        assert_eq!(TimeRange::default(), TimeRange::MediumTerm);
    }

    #[test]
    fn test_cover_url_prefers_widest_image() {
        let album = Album {
            id: "a".to_string(),
            name: "Abbey Road".to_string(),
            release_date: None,
            images: vec![
                image("small", Some(64)),
                image("large", Some(640)),
                image("medium", Some(300)),
            ],
        };
        assert_eq!(album.cover_url(), Some("large"));
    }

    #[test]
    fn test_cover_url_without_sizes_uses_first() {
        let album = Album {
            id: "a".to_string(),
            name: "Abbey Road".to_string(),
            release_date: None,
            images: vec![image("first", None), image("second", None)],
        };
        assert_eq!(album.cover_url(), Some("first"));
    }

    #[test]
    fn test_play_count_hint_text() {
        assert_eq!(
            play_count_hint(3),
            "You have 3 song(s) from this album in your top tracks for this period."
        );
    }

    #[test]
    fn test_hints_reveal_order_skips_missing() {
        let hints = AvailableHints {
            play_count: Some("plays".to_string()),
            artist_popularity: None,
            primary_genre: Some("genre".to_string()),
            artist_birth_date: None,
        };
        assert_eq!(hints.in_reveal_order(), vec!["plays", "genre"]);
    }

    #[test]
    fn test_puzzle_serializes_camel_case_with_nulls() {
        let puzzle = Puzzle {
            album_id: "1".to_string(),
            album_name: "Abbey Road".to_string(),
            simplified_album_name: "abbey road".to_string(),
            artist_name: "The Beatles".to_string(),
            cover_url: Some("http://cover".to_string()),
            release_date: Some("1969-09-26".to_string()),
            available_hints: AvailableHints::default(),
        };

        let value = serde_json::to_value(&puzzle).unwrap();
        assert_eq!(value["simplifiedAlbumName"], "abbey road");
        assert!(value["availableHints"]["artistBirthDate"].is_null());
    }
}
