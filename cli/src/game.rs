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

use crate::hints::{HintLadder, NO_MORE_HINTS};
use crate::storage::{GuessedAlbums, KeyValueStore, StoreError};
use jumble_core::{Puzzle, TimeRange};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Pixelation level of a fresh puzzle; higher is blurrier.
pub const START_PIXELATION: u32 = 24;
/// How much sharper the cover gets after each wrong guess.
pub const PIXELATION_STEP: u32 = 4;
/// The sharpest the cover gets before the answer is known.
pub const MIN_PIXELATION: u32 = 4;

pub const LOAD_FAILURE: &str =
    "Could not load a new puzzle. Try a different time range or log in again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Login,
    ModeSelect,
    Loading,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Blank input; nothing changed.
    Ignored,
    Correct,
    Incorrect,
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Cannot {action} while {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: GameState,
    },
    #[error("Access token is empty")]
    EmptyToken,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Lowercased, trimmed form of what the player typed.
pub fn normalize_guess(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn is_correct_guess(input: &str, simplified_name: &str) -> bool {
    normalize_guess(input) == simplified_name
}

/// Next pixelation level after a miss.
pub fn sharpen(level: u32) -> u32 {
    level.saturating_sub(PIXELATION_STEP).max(MIN_PIXELATION)
}

/// The album name with its letters shuffled.
pub fn jumble_name<R: Rng + ?Sized>(name: &str, rng: &mut R) -> String {
    let mut letters: Vec<char> = name.chars().collect();
    letters.shuffle(rng);
    letters.into_iter().collect()
}

/// One player's session: the current screen, the puzzle in play and their progress.
pub struct Game<S> {
    state: GameState,
    access_token: Option<String>,
    mode: TimeRange,
    puzzle: Option<Puzzle>,
    pixelation: u32,
    message: String,
    hints: HintLadder,
    jumbled: Option<String>,
    guessed: GuessedAlbums<S>,
}

impl<S: KeyValueStore> Game<S> {
    pub fn new(store: S) -> Self {
        Self {
            state: GameState::Login,
            access_token: None,
            mode: TimeRange::default(),
            puzzle: None,
            pixelation: START_PIXELATION,
            message: String::new(),
            hints: HintLadder::default(),
            jumbled: None,
            guessed: GuessedAlbums::new(store),
        }
    }

    fn require_state(&self, action: &'static str, allowed: &[GameState]) -> Result<(), GameError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn reset_round(&mut self) {
        self.puzzle = None;
        self.pixelation = START_PIXELATION;
        self.message.clear();
        self.hints = HintLadder::default();
        self.jumbled = None;
    }

    pub fn authenticate(&mut self, access_token: &str) -> Result<(), GameError> {
        self.require_state("log in", &[GameState::Login])?;
        let token = access_token.trim();
        if token.is_empty() {
            return Err(GameError::EmptyToken);
        }
        self.access_token = Some(token.to_string());
        self.state = GameState::ModeSelect;
        Ok(())
    }

    /// Starts loading a puzzle for `mode`.
    pub fn choose_mode(&mut self, mode: TimeRange) -> Result<(), GameError> {
        self.require_state("choose a mode", &[GameState::ModeSelect, GameState::Finished])?;
        self.mode = mode;
        self.reset_round();
        self.state = GameState::Loading;
        Ok(())
    }

    /// Album IDs to send as `exclude` with the next fetch.
    pub fn excluded_albums(&self) -> Vec<String> {
        self.guessed.list(self.mode)
    }

    pub fn puzzle_loaded(&mut self, puzzle: Puzzle, reset_history: bool) -> Result<(), GameError> {
        self.require_state("show a puzzle", &[GameState::Loading])?;
        if reset_history {
            self.guessed.clear(self.mode)?;
        }
        self.hints = HintLadder::new(&puzzle);
        self.puzzle = Some(puzzle);
        self.pixelation = START_PIXELATION;
        self.state = GameState::Playing;
        Ok(())
    }

    /// Back to the mode picker; guessed albums are left untouched.
    pub fn puzzle_failed(&mut self) {
        self.reset_round();
        self.message = LOAD_FAILURE.to_string();
        self.state = GameState::ModeSelect;
    }

    pub fn guess(&mut self, input: &str) -> Result<GuessOutcome, GameError> {
        self.require_state("guess", &[GameState::Playing])?;
        if input.trim().is_empty() {
            return Ok(GuessOutcome::Ignored);
        }

        let Some(puzzle) = &self.puzzle else {
            return Ok(GuessOutcome::Ignored);
        };

        if is_correct_guess(input, &puzzle.simplified_album_name) {
            self.message = format!(
                "Correct! It's {} by {}.",
                puzzle.album_name, puzzle.artist_name
            );
            self.finish()?;
            Ok(GuessOutcome::Correct)
        } else {
            self.message = "Incorrect. Try again!".to_string();
            self.pixelation = sharpen(self.pixelation);
            Ok(GuessOutcome::Incorrect)
        }
    }

    pub fn give_up(&mut self) -> Result<(), GameError> {
        self.require_state("give up", &[GameState::Playing])?;
        if let Some(puzzle) = &self.puzzle {
            self.message = format!(
                "The album was {} by {}.",
                puzzle.album_name, puzzle.artist_name
            );
        }
        self.finish()
    }

    fn finish(&mut self) -> Result<(), GameError> {
        if let Some(puzzle) = &self.puzzle {
            self.guessed.add(self.mode, &puzzle.album_id)?;
        }
        self.state = GameState::Finished;
        Ok(())
    }

    /// Reveals the next hint, or explains that none are left.
    pub fn reveal_hint(&mut self) -> Result<&str, GameError> {
        self.require_state("reveal a hint", &[GameState::Playing])?;
        if self.hints.reveal().is_none() {
            self.message = NO_MORE_HINTS.to_string();
            return Ok(NO_MORE_HINTS);
        }
        Ok(self
            .hints
            .revealed()
            .last()
            .map(String::as_str)
            .unwrap_or(NO_MORE_HINTS))
    }

    pub fn jumble<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<&str, GameError> {
        self.require_state("jumble the name", &[GameState::Playing])?;
        let name = self
            .puzzle
            .as_ref()
            .map(|p| p.simplified_album_name.as_str())
            .unwrap_or_default();
        let jumbled = jumble_name(name, rng);
        Ok(self.jumbled.insert(jumbled).as_str())
    }

    /// Another puzzle in the same mode.
    pub fn play_again(&mut self) -> Result<(), GameError> {
        self.require_state("play again", &[GameState::Finished])?;
        self.reset_round();
        self.state = GameState::Loading;
        Ok(())
    }

    pub fn change_mode(&mut self) -> Result<(), GameError> {
        self.require_state("change mode", &[GameState::Finished, GameState::ModeSelect])?;
        self.reset_round();
        self.state = GameState::ModeSelect;
        Ok(())
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn mode(&self) -> TimeRange {
        self.mode
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn pixelation(&self) -> u32 {
        self.pixelation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn revealed_hints(&self) -> &[String] {
        self.hints.revealed()
    }

    pub fn jumbled(&self) -> Option<&str> {
        self.jumbled.as_deref()
    }

    pub fn guessed(&self) -> &GuessedAlbums<S> {
        &self.guessed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use jumble_core::AvailableHints;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn puzzle(album_id: &str) -> Puzzle {
        Puzzle {
            album_id: album_id.to_string(),
            album_name: "The Dark Side Of The Moon".to_string(),
            simplified_album_name: "the dark side of the moon".to_string(),
            artist_name: "Pink Floyd".to_string(),
            cover_url: Some("https://i.scdn.co/image/dsotm".to_string()),
            release_date: Some("1973-03-01".to_string()),
            available_hints: AvailableHints {
                play_count: Some("plays".to_string()),
                ..Default::default()
            },
        }
    }

    fn playing_game() -> Game<MemoryStore> {
        let mut game = Game::new(MemoryStore::default());
        game.authenticate("token").unwrap();
        game.choose_mode(TimeRange::MediumTerm).unwrap();
        game.puzzle_loaded(puzzle("dsotm"), false).unwrap();
        game
    }

    #[test]
    fn test_guess_is_case_and_whitespace_insensitive() {
        assert!(is_correct_guess(
            " The Dark Side Of The Moon ",
            "the dark side of the moon"
        ));
        assert!(!is_correct_guess("dark side", "the dark side of the moon"));
    }

    #[test]
    fn test_sharpen_decreases_until_floor() {
        let mut level = START_PIXELATION;
        let mut seen = vec![level];
        while level > MIN_PIXELATION {
            let next = sharpen(level);
            assert!(next < level);
            level = next;
            seen.push(level);
        }
        assert_eq!(seen, vec![24, 20, 16, 12, 8, 4]);
        assert_eq!(sharpen(MIN_PIXELATION), MIN_PIXELATION);
    }

    #[test]
    fn test_happy_path_records_guessed_album() {
        let mut game = playing_game();
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.access_token(), Some("token"));

        let outcome = game.guess("  THE DARK SIDE OF THE MOON").unwrap();

        assert_eq!(outcome, GuessOutcome::Correct);
        assert_eq!(game.state(), GameState::Finished);
        assert_eq!(
            game.message(),
            "Correct! It's The Dark Side Of The Moon by Pink Floyd."
        );
        assert_eq!(game.guessed().list(TimeRange::MediumTerm), vec!["dsotm"]);
    }

    #[test]
    fn test_wrong_guesses_sharpen_and_play_again_resets() {
        let mut game = playing_game();

        assert_eq!(game.guess("wish you were here").unwrap(), GuessOutcome::Incorrect);
        assert_eq!(game.pixelation(), 20);
        assert_eq!(game.message(), "Incorrect. Try again!");
        for _ in 0..10 {
            game.guess("animals").unwrap();
        }
        assert_eq!(game.pixelation(), MIN_PIXELATION);
        assert_eq!(game.state(), GameState::Playing);

        game.give_up().unwrap();
        assert_eq!(
            game.message(),
            "The album was The Dark Side Of The Moon by Pink Floyd."
        );
        game.play_again().unwrap();

        assert_eq!(game.state(), GameState::Loading);
        assert_eq!(game.pixelation(), START_PIXELATION);
        assert_eq!(game.mode(), TimeRange::MediumTerm);
        assert_eq!(game.excluded_albums(), vec!["dsotm"]);
    }

    #[test]
    fn test_blank_guess_is_ignored() {
        let mut game = playing_game();
        assert_eq!(game.guess("   ").unwrap(), GuessOutcome::Ignored);
        assert_eq!(game.pixelation(), START_PIXELATION);
    }

    #[test]
    fn test_reset_signal_clears_history_for_mode_only() {
        let mut game = Game::new(MemoryStore::default());
        game.authenticate("token").unwrap();

        game.choose_mode(TimeRange::ShortTerm).unwrap();
        game.puzzle_loaded(puzzle("a"), false).unwrap();
        game.give_up().unwrap();
        game.choose_mode(TimeRange::LongTerm).unwrap();
        game.puzzle_loaded(puzzle("b"), false).unwrap();
        game.give_up().unwrap();

        game.play_again().unwrap();
        game.puzzle_loaded(puzzle("b"), true).unwrap();

        assert!(game.guessed().list(TimeRange::LongTerm).is_empty());
        assert_eq!(game.guessed().list(TimeRange::ShortTerm), vec!["a"]);
    }

    #[test]
    fn test_failed_load_keeps_history() {
        let mut game = playing_game();
        game.give_up().unwrap();
        game.play_again().unwrap();

        game.puzzle_failed();

        assert_eq!(game.state(), GameState::ModeSelect);
        assert_eq!(game.message(), LOAD_FAILURE);
        assert_eq!(game.excluded_albums(), vec!["dsotm"]);
    }

    #[test]
    fn test_hint_ladder_runs_dry() {
        let mut game = playing_game();
        assert_eq!(
            game.revealed_hints(),
            ["Album was released on 1973-03-01"]
        );
        assert_eq!(game.reveal_hint().unwrap(), "plays");
        assert_eq!(game.reveal_hint().unwrap(), NO_MORE_HINTS);
        assert_eq!(game.message(), NO_MORE_HINTS);
    }

    #[test]
    fn test_jumble_keeps_letters() {
        let mut game = playing_game();
        let mut rng = StdRng::seed_from_u64(42);

        let mut jumbled: Vec<char> = game.jumble(&mut rng).unwrap().chars().collect();
        let mut expected: Vec<char> = "the dark side of the moon".chars().collect();
        jumbled.sort_unstable();
        expected.sort_unstable();

        assert_eq!(jumbled, expected);
        assert!(game.jumbled().is_some());
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut game = Game::new(MemoryStore::default());
        assert!(matches!(
            game.guess("anything"),
            Err(GameError::InvalidTransition { .. })
        ));
        assert!(matches!(game.authenticate("  "), Err(GameError::EmptyToken)));
        assert!(game.choose_mode(TimeRange::ShortTerm).is_err());

        game.authenticate("token").unwrap();
        assert!(game.play_again().is_err());
    }
}
