// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing context: destination pixmap plus cached clip mask.

use kurbo::{Affine, Rect};

use crate::color::Color;
use crate::compose::{compose, CompositeOp};
use crate::error::Error;
use crate::flatten::EMPTY_BBOX;
use crate::pixmap::Pixmap;
use crate::polygon::Polygon;
use crate::raster::{self, fastround};
use crate::state::{ClipFill, Shadow};
use crate::style::DrawStyle;

/// Owns the pixels drawing operations write to.
///
/// The clip mask is an inverse coverage mask the size of the surface:
/// alpha 0 lets a pixel through, alpha 255 blocks it. It is regenerated
/// from the state's clip list only when marked dirty.
pub struct DrawContext {
    pixmap: Pixmap,
    clip_mask: Option<Pixmap>,
}

impl DrawContext {
    pub fn new(width: i32, height: i32) -> Result<DrawContext, Error> {
        Ok(DrawContext {
            pixmap: Pixmap::new(width, height)?,
            clip_mask: None,
        })
    }

    /// Wrap an existing pixmap, taking ownership of its pixels.
    pub fn from_pixmap(pixmap: Pixmap) -> DrawContext {
        DrawContext {
            pixmap,
            clip_mask: None,
        }
    }

    pub fn width(&self) -> i32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> i32 {
        self.pixmap.height()
    }

    /// The rendered surface; hosts read this to present a frame.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Replace the surface with a fresh transparent pixmap of a new size.
    pub fn resize(&mut self, width: i32, height: i32) -> Result<(), Error> {
        self.pixmap = Pixmap::new(width, height)?;
        self.clip_mask = None;
        Ok(())
    }

    /// Present the surface. Offscreen surfaces have nothing to flip, so
    /// this is a no-op; window hosts react to it instead.
    pub fn present(&mut self) {}

    /// Drop the cached clip mask, forcing regeneration on the next draw.
    pub fn clear_clip(&mut self) {
        self.clip_mask = None;
    }

    /// Rebuild the clip mask from the accumulated clip polygons.
    ///
    /// Each polygon is rasterized over the mask with the one-minus-source
    /// operator: covered samples keep the mask as it was, uncovered ones
    /// become fully blocking. Composing in sequence intersects the regions;
    /// an empty polygon therefore blocks everything.
    pub(crate) fn regenerate_clip(&mut self, clips: &[ClipFill]) {
        if clips.is_empty() {
            self.clip_mask = None;
            return;
        }
        let Ok(mut mask) = Pixmap::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        for instr in clips {
            let bbox = polygon_bbox(&instr.poly);
            raster::render(
                &mut mask,
                &instr.poly,
                bbox,
                &DrawStyle::Solid(Color::WHITE),
                1.0,
                Shadow::NONE,
                CompositeOp::OneMinusSrc,
                None,
                instr.rule,
                Affine::IDENTITY,
            );
        }
        self.clip_mask = Some(mask);
    }

    /// Rasterize a polygon onto the surface with the full drawing state.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn render_polygon(
        &mut self,
        poly: &Polygon,
        bbox: Rect,
        style: &DrawStyle,
        global_alpha: f64,
        shadow: Shadow,
        op: CompositeOp,
        rule: crate::state::FillRule,
        transform: Affine,
    ) {
        raster::render(
            &mut self.pixmap,
            poly,
            bbox,
            style,
            global_alpha,
            shadow,
            op,
            self.clip_mask.as_ref(),
            rule,
            transform,
        );
    }

    /// The pixel at (`x`, `y`), transparent black outside the surface.
    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        if x < 0 || y < 0 || x >= self.pixmap.width() || y >= self.pixmap.height() {
            return Color::TRANSPARENT;
        }
        self.pixmap.at(y, x)
    }

    /// Set the pixel at (`x`, `y`); out-of-surface writes are dropped.
    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        if x < 0 || y < 0 || x >= self.pixmap.width() || y >= self.pixmap.height() {
            return;
        }
        *self.pixmap.at_mut(y, x) = color;
    }

    /// Copy out a region as a new pixmap; areas outside the surface stay
    /// transparent.
    pub fn get_pixmap(&self, sx: i32, sy: i32, width: i32, height: i32) -> Result<Pixmap, Error> {
        let mut out = Pixmap::new(width, height)?;
        out.blit(0, 0, &self.pixmap, sx, sy, width, height);
        Ok(out)
    }

    /// Copy a region of `src` into the surface, byte for byte.
    #[allow(clippy::too_many_arguments)]
    pub fn put_pixmap(
        &mut self,
        dx: i32,
        dy: i32,
        src: &Pixmap,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        self.pixmap.blit(dx, dy, src, sx, sy, width, height);
    }

    /// Composite a region of another context onto this one, honoring the
    /// composite operation, global alpha, and clip mask.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn blit_compose(
        &mut self,
        dx: i32,
        dy: i32,
        src: &DrawContext,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
        global_alpha: f64,
        op: CompositeOp,
    ) {
        let ga256 = fastround(global_alpha * 256.0);
        for i in 0..height {
            for j in 0..width {
                let (dj, di) = (dx + j, dy + i);
                let (sj, si) = (sx + j, sy + i);
                if dj < 0
                    || di < 0
                    || dj >= self.pixmap.width()
                    || di >= self.pixmap.height()
                    || sj < 0
                    || si < 0
                    || sj >= src.pixmap.width()
                    || si >= src.pixmap.height()
                {
                    continue;
                }
                let color = src.pixmap.at(si, sj);
                let mut draw_alpha = color.a as i32 * ga256 / 256;
                if let Some(mask) = &self.clip_mask {
                    draw_alpha = draw_alpha * (255 - mask.at(di, dj).a as i32) / 255;
                }
                let dst = self.pixmap.at(di, dj);
                *self.pixmap.at_mut(di, dj) = compose(color, dst, draw_alpha, op);
            }
        }
    }
}

fn polygon_bbox(poly: &Polygon) -> Rect {
    let mut bbox = EMPTY_BBOX;
    for pt in poly.points() {
        bbox = bbox.union_pt(*pt);
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use std::rc::Rc;

    use crate::state::FillRule;

    #[test]
    fn pixel_access_clips() {
        let mut ctx = DrawContext::new(4, 4).unwrap();
        ctx.put_pixel(2, 1, Color::WHITE);
        assert_eq!(ctx.get_pixel(2, 1), Color::WHITE);
        assert_eq!(ctx.get_pixel(-1, 0), Color::TRANSPARENT);
        ctx.put_pixel(100, 100, Color::WHITE);
        assert_eq!(ctx.get_pixel(100, 100), Color::TRANSPARENT);
    }

    #[test]
    fn empty_clip_polygon_blocks_everything() {
        let mut ctx = DrawContext::new(4, 4).unwrap();
        ctx.regenerate_clip(&[ClipFill {
            poly: Rc::new(Polygon::new()),
            rule: FillRule::NonZero,
        }]);
        let mask = ctx.clip_mask.as_ref().unwrap();
        assert!(mask.data().iter().all(|c| c.a == 255));
    }

    #[test]
    fn clip_mask_is_open_inside_the_polygon() {
        let mut poly = Polygon::new();
        poly.add_point(Point::new(0.0, 0.0));
        poly.add_point(Point::new(2.0, 0.0));
        poly.add_point(Point::new(2.0, 2.0));
        poly.add_point(Point::new(0.0, 2.0));
        poly.end_subpoly(true);
        let mut ctx = DrawContext::new(4, 4).unwrap();
        ctx.regenerate_clip(&[ClipFill {
            poly: Rc::new(poly),
            rule: FillRule::NonZero,
        }]);
        let mask = ctx.clip_mask.as_ref().unwrap();
        assert_eq!(mask.at(1, 1).a, 0);
        assert_eq!(mask.at(3, 3).a, 255);
    }
}
