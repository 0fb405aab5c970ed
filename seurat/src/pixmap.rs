// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned BGRA pixel buffers.

use crate::color::Color;
use crate::error::Error;

/// A row-major 32-bit BGRA pixel buffer.
///
/// The element at row `i`, column `j` is `data()[i * width + j]`; alpha sits
/// in the high-order byte of each little-endian 32-bit word.
#[derive(Clone, Debug)]
pub struct Pixmap {
    width: i32,
    height: i32,
    data: Vec<Color>,
}

impl Pixmap {
    /// Create a transparent pixmap of the given size.
    ///
    /// Returns [`Error::InvalidInput`] for non-positive dimensions.
    pub fn new(width: i32, height: i32) -> Result<Pixmap, Error> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidInput);
        }
        Ok(Pixmap {
            width,
            height,
            data: vec![Color::TRANSPARENT; (width * height) as usize],
        })
    }

    /// Wrap an existing pixel buffer.
    ///
    /// `data` must hold exactly `width * height` pixels.
    pub fn from_data(width: i32, height: i32, data: Vec<Color>) -> Result<Pixmap, Error> {
        if width <= 0 || height <= 0 || data.len() != (width * height) as usize {
            return Err(Error::InvalidInput);
        }
        Ok(Pixmap {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The pixel buffer, row-major.
    pub fn data(&self) -> &[Color] {
        &self.data
    }

    /// The pixel buffer, row-major and mutable.
    pub fn data_mut(&mut self) -> &mut [Color] {
        &mut self.data
    }

    /// The pixel at row `i`, column `j`. Callers must stay in bounds.
    #[inline]
    pub(crate) fn at(&self, i: i32, j: i32) -> Color {
        self.data[(i * self.width + j) as usize]
    }

    #[inline]
    pub(crate) fn at_mut(&mut self, i: i32, j: i32) -> &mut Color {
        &mut self.data[(i * self.width + j) as usize]
    }

    /// Copy a `width` × `height` block from `src` at (`sx`, `sy`) to
    /// (`dx`, `dy`) in `self`, clipping the block against both pixmaps.
    pub fn blit(
        &mut self,
        dx: i32,
        dy: i32,
        src: &Pixmap,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        let Some(b) = BlitRegion::clip(
            self.width,
            self.height,
            dx,
            dy,
            src.width,
            src.height,
            sx,
            sy,
            width,
            height,
        ) else {
            return;
        };
        for i in 0..b.height {
            let d = ((b.dy + i) * self.width + b.dx) as usize;
            let s = ((b.sy + i) * src.width + b.sx) as usize;
            self.data[d..d + b.width as usize]
                .copy_from_slice(&src.data[s..s + b.width as usize]);
        }
    }

}

/// Weigh four neighbor samples by the fractional position between them.
pub(crate) fn bilinear_mix(
    col11: Color,
    col12: Color,
    col21: Color,
    col22: Color,
    dec_x: f64,
    dec_y: f64,
) -> Color {
    let w11 = (1.0 - dec_x) * (1.0 - dec_y);
    let w12 = (1.0 - dec_x) - w11;
    let w21 = dec_x * (1.0 - dec_y);
    let w22 = dec_x - w21;
    let mix = |f: fn(Color) -> u8| {
        (f(col11) as f64 * w11
            + f(col12) as f64 * w12
            + f(col21) as f64 * w21
            + f(col22) as f64 * w22) as u8
    };
    Color {
        b: mix(|c| c.b),
        g: mix(|c| c.g),
        r: mix(|c| c.r),
        a: mix(|c| c.a),
    }
}

struct BlitRegion {
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    width: i32,
    height: i32,
}

impl BlitRegion {
    /// Clip a blit rectangle against both the source and destination
    /// dimensions. Negative destination coordinates shift the source origin.
    #[allow(clippy::too_many_arguments)]
    fn clip(
        dw: i32,
        dh: i32,
        mut dx: i32,
        mut dy: i32,
        sw: i32,
        sh: i32,
        mut sx: i32,
        mut sy: i32,
        mut width: i32,
        mut height: i32,
    ) -> Option<BlitRegion> {
        if dx < 0 {
            sx -= dx;
            width += dx;
            dx = 0;
        }
        if dy < 0 {
            sy -= dy;
            height += dy;
            dy = 0;
        }
        if sx < 0 {
            dx -= sx;
            width += sx;
            sx = 0;
        }
        if sy < 0 {
            dy -= sy;
            height += sy;
            sy = 0;
        }
        width = width.min(dw - dx).min(sw - sx);
        height = height.min(dh - dy).min(sh - sy);
        if width <= 0 || height <= 0 {
            return None;
        }
        Some(BlitRegion {
            dx,
            dy,
            sx,
            sy,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(w: i32, h: i32, c: Color) -> Pixmap {
        Pixmap::from_data(w, h, vec![c; (w * h) as usize]).unwrap()
    }

    #[test]
    fn rejects_empty() {
        assert!(Pixmap::new(0, 4).is_err());
        assert!(Pixmap::new(4, -1).is_err());
    }

    #[test]
    fn blit_clips_both_ways() {
        let mut dst = Pixmap::new(4, 4).unwrap();
        let src = filled(4, 4, Color::WHITE);
        dst.blit(-2, -2, &src, 0, 0, 4, 4);
        assert_eq!(dst.at(0, 0), Color::WHITE);
        assert_eq!(dst.at(1, 1), Color::WHITE);
        assert_eq!(dst.at(2, 2), Color::TRANSPARENT);

        let mut dst = Pixmap::new(4, 4).unwrap();
        dst.blit(3, 3, &src, 2, 2, 4, 4);
        assert_eq!(dst.at(3, 3), Color::WHITE);
        assert_eq!(dst.at(2, 3), Color::TRANSPARENT);
    }

    #[test]
    fn blit_fully_outside_is_noop() {
        let mut dst = filled(2, 2, Color::BLACK);
        let src = filled(2, 2, Color::WHITE);
        dst.blit(5, 5, &src, 0, 0, 2, 2);
        assert!(dst.data().iter().all(|&c| c == Color::BLACK));
    }
}
