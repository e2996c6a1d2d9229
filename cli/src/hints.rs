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

use jumble_core::Puzzle;
use std::collections::VecDeque;

pub const NO_MORE_HINTS: &str = "No more hints available!";

pub fn release_date_hint(date: &str) -> String {
    format!("Album was released on {}", date)
}

/// Hints shown so far plus the ones still to come, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintLadder {
    revealed: Vec<String>,
    pending: VecDeque<String>,
}

impl HintLadder {
    /// The release date is revealed up front; the server's optional hints queue behind it.
    pub fn new(puzzle: &Puzzle) -> Self {
        Self {
            revealed: puzzle
                .release_date
                .as_deref()
                .map(release_date_hint)
                .into_iter()
                .collect(),
            pending: puzzle.available_hints.in_reveal_order().into(),
        }
    }

    /// Moves the next hint to the revealed list. `None` once the ladder is exhausted.
    pub fn reveal(&mut self) -> Option<&str> {
        let next = self.pending.pop_front()?;
        self.revealed.push(next);
        self.revealed.last().map(String::as_str)
    }

    pub fn revealed(&self) -> &[String] {
        &self.revealed
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}
