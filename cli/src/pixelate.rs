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

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use log::warn;
use std::io::{self, Write};

/// Width of the drawing surface in pixels; height follows the cover's aspect ratio.
pub const CANVAS_WIDTH: u32 = 300;
pub const MISSING_LABEL: &str = "Image not found";

const PLACEHOLDER: Rgba<u8> = Rgba([34, 34, 34, 255]);

/// Canvas dimensions for a source of `width` x `height`.
pub fn canvas_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (CANVAS_WIDTH, CANVAS_WIDTH);
    }
    let scaled = u64::from(height) * u64::from(CANVAS_WIDTH) / u64::from(width);
    (CANVAS_WIDTH, scaled.clamp(1, u64::from(u32::MAX)) as u32)
}

/// Fits `source` to the canvas, then shrinks it by `level` and blows it back up
/// with nearest-neighbour sampling so every block is a flat colour.
pub fn pixelate(source: &DynamicImage, level: u32) -> RgbaImage {
    let (width, height) = canvas_size(source.width(), source.height());
    let canvas = imageops::resize(source, width, height, FilterType::Triangle);

    let level = level.max(1);
    let small = imageops::resize(
        &canvas,
        (width / level).max(1),
        (height / level).max(1),
        FilterType::Nearest,
    );
    imageops::resize(&small, width, height, FilterType::Nearest)
}

/// A decoded cover, or the placeholder drawn when it could not be loaded.
#[derive(Debug, Clone)]
pub enum Cover {
    Art(DynamicImage),
    Missing,
}

impl Cover {
    pub fn load(bytes: &[u8]) -> Self {
        match image::load_from_memory(bytes) {
            Ok(img) => Cover::Art(img),
            Err(e) => {
                warn!("Could not decode album cover: {}", e);
                Cover::Missing
            }
        }
    }

    pub fn render(&self, level: u32) -> RgbaImage {
        match self {
            Cover::Art(img) => pixelate(img, level),
            Cover::Missing => RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_WIDTH, PLACEHOLDER),
        }
    }
}

/// Draws `cover` at `level` into `columns` terminal cells, two pixel rows per
/// line using upper-half blocks.
pub fn paint<W: Write>(out: &mut W, cover: &Cover, level: u32, columns: u16) -> io::Result<()> {
    let frame = cover.render(level);
    let columns = u32::from(columns.max(1));
    let rows = (u64::from(frame.height()) * u64::from(columns) / u64::from(frame.width()))
        .max(2) as u32;
    let cells = imageops::resize(&frame, columns, rows + rows % 2, FilterType::Nearest);

    for y in (0..cells.height()).step_by(2) {
        for x in 0..cells.width() {
            let top = cells.get_pixel(x, y);
            let bottom = cells.get_pixel(x, y + 1);
            queue!(
                out,
                SetForegroundColor(rgb(top)),
                SetBackgroundColor(rgb(bottom)),
                Print('▀')
            )?;
        }
        queue!(out, ResetColor, Print('\n'))?;
    }

    if matches!(cover, Cover::Missing) {
        queue!(out, Print(MISSING_LABEL), Print('\n'))?;
    }
    out.flush()
}

fn rgb(pixel: &Rgba<u8>) -> Color {
    let [r, g, b, _] = pixel.0;
    Color::Rgb { r, g, b }
}
