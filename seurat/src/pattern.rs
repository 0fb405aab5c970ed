// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Repeating image paints.

use kurbo::{Affine, Point};

use crate::color::Color;
use crate::pixmap::{bilinear_mix, Pixmap};

/// How a pattern tiles beyond its source image.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Repeat {
    /// Clamp to the nearest edge pixel on both axes.
    NoRepeat,
    /// Tile horizontally, clamp vertically.
    RepeatX,
    /// Tile vertically, clamp horizontally.
    RepeatY,
    /// Tile on both axes.
    RepeatXy,
}

/// An image paint: a deep copy of a source pixmap plus a repeat mode.
#[derive(Clone, Debug)]
pub struct Pattern {
    image: Pixmap,
    repeat: Repeat,
}

impl Pattern {
    /// Create a pattern from a copy of `image`.
    pub fn new(image: &Pixmap, repeat: Repeat) -> Pattern {
        Pattern {
            image: image.clone(),
            repeat,
        }
    }

    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    pub fn image(&self) -> &Pixmap {
        &self.image
    }

    /// Evaluate the pattern at device position (`x`, `y`).
    ///
    /// The inverse transform maps back into pattern space; the position is
    /// folded per the repeat mode and sampled bilinearly. Neighbors that
    /// fall off the pattern reuse the on-pattern sample, so edges do not
    /// bleed.
    pub fn evaluate_at(&self, x: f64, y: f64, inverse: Affine) -> Color {
        let mut p = inverse * Point::new(x, y);
        let w = self.image.width() as f64;
        let h = self.image.height() as f64;
        match self.repeat {
            Repeat::NoRepeat => {
                p.x = p.x.clamp(0.0, w - 1.0);
                p.y = p.y.clamp(0.0, h - 1.0);
            }
            Repeat::RepeatX => {
                p.x -= w * (p.x / w).floor();
                p.y = p.y.clamp(0.0, h - 1.0);
            }
            Repeat::RepeatY => {
                p.x = p.x.clamp(0.0, w - 1.0);
                p.y -= h * (p.y / h).floor();
            }
            Repeat::RepeatXy => {
                p.x -= w * (p.x / w).floor();
                p.y -= h * (p.y / h).floor();
            }
        }

        let pt_x = p.x as i32;
        let pt_y = p.y as i32;
        let dec_x = p.x - pt_x as f64;
        let dec_y = p.y - pt_y as f64;

        let at = |x: i32, y: i32| self.image.data()[(y * self.image.width() + x) as usize];
        let col11 = at(pt_x, pt_y);
        let col21 = if pt_x + 1 < self.image.width() {
            at(pt_x + 1, pt_y)
        } else {
            col11
        };
        let col12 = if pt_y + 1 < self.image.height() {
            at(pt_x, pt_y + 1)
        } else {
            col11
        };
        let col22 = if pt_x + 1 < self.image.width() && pt_y + 1 < self.image.height() {
            at(pt_x + 1, pt_y + 1)
        } else {
            col11
        };

        bilinear_mix(col11, col12, col21, col22, dec_x, dec_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Pixmap {
        // 2x2: red, green / blue, white
        Pixmap::from_data(
            2,
            2,
            vec![
                Color::rgb8(255, 0, 0),
                Color::rgb8(0, 255, 0),
                Color::rgb8(0, 0, 255),
                Color::WHITE,
            ],
        )
        .unwrap()
    }

    #[test]
    fn clamps_when_not_repeating() {
        let p = Pattern::new(&checker(), Repeat::NoRepeat);
        // Far off to the right, clamps to column 1, row 0.
        let c = p.evaluate_at(25.0, 0.0, Affine::IDENTITY);
        assert_eq!(c, Color::rgb8(0, 255, 0));
    }

    #[test]
    fn wraps_when_repeating() {
        let p = Pattern::new(&checker(), Repeat::RepeatXy);
        // x = 4 folds back to x = 0.
        let c = p.evaluate_at(4.0, 0.0, Affine::IDENTITY);
        assert_eq!(c, Color::rgb8(255, 0, 0));
    }

    #[test]
    fn integer_positions_sample_exactly() {
        let p = Pattern::new(&checker(), Repeat::NoRepeat);
        assert_eq!(p.evaluate_at(0.0, 1.0, Affine::IDENTITY), Color::rgb8(0, 0, 255));
        assert_eq!(p.evaluate_at(1.0, 1.0, Affine::IDENTITY), Color::WHITE);
    }

    #[test]
    fn fractional_positions_interpolate() {
        let p = Pattern::new(&checker(), Repeat::NoRepeat);
        let c = p.evaluate_at(0.5, 0.0, Affine::IDENTITY);
        // Halfway between red and green.
        assert!(c.r > 100 && c.r < 155);
        assert!(c.g > 100 && c.g < 155);
        assert_eq!(c.b, 0);
    }
}
