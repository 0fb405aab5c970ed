// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immediate-mode drawing surface.

use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use kurbo::{Affine, Point, Rect};

use crate::color::Color;
use crate::compose::CompositeOp;
use crate::context::DrawContext;
use crate::error::Error;
use crate::flatten::polygonize;
use crate::font::{FontDesc, FontEngine};
use crate::gradient::Gradient;
use crate::path2d::Path2D;
use crate::pattern::Pattern;
use crate::pixmap::Pixmap;
use crate::polygon::Polygon;
use crate::state::{ClipFill, DrawState, FillRule, LineCap, LineJoin};
use crate::stroke::{self, transform_bbox};
use crate::style::DrawStyle;
use crate::transform::linear_norm;

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// A canvas: a drawing context, a graphics state with its save stack, and
/// the current path.
///
/// Drawing calls are immediate and silent-best-effort: geometry that
/// produces nothing (empty paths, zero-length strokes) simply leaves the
/// surface untouched.
pub struct Canvas {
    context: DrawContext,
    state: DrawState,
    state_stack: Vec<DrawState>,
    path: Path2D,
    font_engine: Option<Box<dyn FontEngine>>,
    clip_dirty: bool,
    width: i32,
    height: i32,
    id: u32,
}

impl Canvas {
    /// Create a transparent canvas. Non-positive dimensions are clamped
    /// to 1.
    pub fn new(width: i32, height: i32) -> Canvas {
        let width = width.max(1);
        let height = height.max(1);
        Canvas {
            // The clamped dimensions are always valid.
            context: DrawContext::new(width, height).unwrap(),
            state: DrawState::new(),
            state_stack: Vec::new(),
            path: Path2D::new(),
            font_engine: None,
            clip_dirty: false,
            width,
            height,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Create a canvas over an existing pixmap, taking ownership of it.
    pub fn from_pixmap(pixmap: Pixmap) -> Canvas {
        let (width, height) = (pixmap.width(), pixmap.height());
        Canvas {
            context: DrawContext::from_pixmap(pixmap),
            state: DrawState::new(),
            state_stack: Vec::new(),
            path: Path2D::new(),
            font_engine: None,
            clip_dirty: false,
            width,
            height,
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// The rendered surface, for hosts to present.
    pub fn pixmap(&self) -> &Pixmap {
        self.context.pixmap()
    }

    /// Present the surface; a no-op for offscreen canvases.
    pub fn present(&mut self) {
        self.context.present();
    }

    /// Resize the surface, discarding pixels and resetting all state.
    pub fn set_size(&mut self, width: i32, height: i32) {
        let width = width.max(1);
        let height = height.max(1);
        self.state.reset();
        self.state_stack.clear();
        self.path.reset();
        self.clip_dirty = false;
        if self.context.resize(width, height).is_ok() {
            self.width = width;
            self.height = height;
        }
    }

    /// Install the glyph supplier used by the text calls.
    pub fn set_font_engine(&mut self, engine: Box<dyn FontEngine>) {
        self.font_engine = Some(engine);
    }

    /* State */

    /// Push a deep copy of the drawing state.
    pub fn save(&mut self) {
        self.state_stack.push(self.state.clone());
    }

    /// Pop and adopt the most recently saved state; a no-op on an empty
    /// stack.
    pub fn restore(&mut self) {
        if let Some(s) = self.state_stack.pop() {
            self.state = s;
            self.context.clear_clip();
            self.clip_dirty = !self.state.clip_path.is_empty();
        }
    }

    /* Transform */

    pub fn current_transform(&self) -> Affine {
        self.state.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.state.transform = transform;
    }

    /// Multiply the current transform by `m` (applied before it).
    pub fn transform(&mut self, m: Affine) {
        self.state.transform = self.state.transform * m;
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform * Affine::translate((x, y));
    }

    pub fn scale(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform * Affine::scale_non_uniform(x, y);
    }

    pub fn shear(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform * Affine::skew(x, y);
    }

    pub fn rotate(&mut self, angle: f64) {
        self.state.transform = self.state.transform * Affine::rotate(angle);
    }

    /* Style */

    pub fn line_width(&self) -> f64 {
        self.state.line_width
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    pub fn line_join(&self) -> LineJoin {
        self.state.line_join
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    pub fn line_cap(&self) -> LineCap {
        self.state.line_cap
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    pub fn miter_limit(&self) -> f64 {
        self.state.miter_limit
    }

    /// Set the miter limit; non-positive values leave it unchanged.
    pub fn set_miter_limit(&mut self, limit: f64) {
        if limit > 0.0 {
            self.state.miter_limit = limit;
        }
    }

    pub fn line_dash(&self) -> &[f64] {
        &self.state.line_dash
    }

    /// Set the dash pattern. An odd number of lengths is doubled so the
    /// stored pattern is always even; an empty slice disables dashing.
    pub fn set_line_dash(&mut self, dash: &[f64]) {
        if dash.is_empty() {
            self.state.line_dash.clear();
        } else if dash.len() % 2 == 0 {
            self.state.line_dash = dash.to_vec();
        } else {
            self.state.line_dash = dash.iter().chain(dash).copied().collect();
        }
    }

    pub fn line_dash_offset(&self) -> f64 {
        self.state.line_dash_offset
    }

    pub fn set_line_dash_offset(&mut self, offset: f64) {
        self.state.line_dash_offset = offset;
    }

    pub fn global_alpha(&self) -> f64 {
        self.state.global_alpha
    }

    /// Set the global alpha; values outside `[0, 1]` are rejected.
    pub fn set_global_alpha(&mut self, alpha: f64) {
        if (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn composite_op(&self) -> CompositeOp {
        self.state.composite_op
    }

    pub fn set_composite_op(&mut self, op: CompositeOp) {
        self.state.composite_op = op;
    }

    pub fn fill_style(&self) -> &DrawStyle {
        &self.state.fill_style
    }

    /// The fill color if the style is solid, transparent black otherwise.
    pub fn fill_color(&self) -> Color {
        self.state.fill_style.as_color()
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.state.fill_style = DrawStyle::Solid(color);
    }

    pub fn set_fill_gradient(&mut self, gradient: Rc<Gradient>) {
        self.state.fill_style = DrawStyle::Gradient(gradient);
    }

    pub fn set_fill_pattern(&mut self, pattern: Rc<Pattern>) {
        self.state.fill_style = DrawStyle::Pattern(pattern);
    }

    pub fn stroke_style(&self) -> &DrawStyle {
        &self.state.stroke_style
    }

    pub fn stroke_color(&self) -> Color {
        self.state.stroke_style.as_color()
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.state.stroke_style = DrawStyle::Solid(color);
    }

    pub fn set_stroke_gradient(&mut self, gradient: Rc<Gradient>) {
        self.state.stroke_style = DrawStyle::Gradient(gradient);
    }

    pub fn set_stroke_pattern(&mut self, pattern: Rc<Pattern>) {
        self.state.stroke_style = DrawStyle::Pattern(pattern);
    }

    pub fn shadow_color(&self) -> Color {
        self.state.shadow.color
    }

    pub fn set_shadow_color(&mut self, color: Color) {
        self.state.shadow.color = color;
    }

    pub fn shadow_blur(&self) -> f64 {
        self.state.shadow.blur
    }

    pub fn set_shadow_blur(&mut self, blur: f64) {
        self.state.shadow.blur = blur;
    }

    pub fn shadow_offset(&self) -> (f64, f64) {
        (self.state.shadow.offset_x, self.state.shadow.offset_y)
    }

    pub fn set_shadow_offset(&mut self, x: f64, y: f64) {
        self.state.shadow.offset_x = x;
        self.state.shadow.offset_y = y;
    }

    pub fn font(&self) -> &FontDesc {
        &self.state.font
    }

    pub fn set_font(&mut self, font: FontDesc) {
        self.state.font = font;
    }

    /* Path building */

    /// Discard the current path.
    pub fn clear_path(&mut self) {
        self.path.reset();
    }

    pub fn close_path(&mut self) {
        self.path.close();
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y, self.state.transform);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y, self.state.transform);
    }

    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.path
            .quadratic_curve_to(cpx, cpy, x, y, self.state.transform);
    }

    pub fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.path
            .bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y, self.state.transform);
    }

    pub fn arc(&mut self, x: f64, y: f64, r: f64, a1: f64, a2: f64, ccw: bool) {
        self.path.arc(x, y, r, a1, a2, ccw, self.state.transform);
    }

    pub fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64) {
        self.path.arc_to(x1, y1, x2, y2, r, self.state.transform);
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.path.rect(x, y, width, height, self.state.transform);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ellipse(
        &mut self,
        x: f64,
        y: f64,
        rx: f64,
        ry: f64,
        rotation: f64,
        a1: f64,
        a2: f64,
        ccw: bool,
    ) {
        self.path
            .ellipse(x, y, rx, ry, rotation, a1, a2, ccw, self.state.transform);
    }

    /* Filling, stroking, clipping */

    fn ensure_clip(&mut self) {
        if self.clip_dirty {
            self.context.regenerate_clip(&self.state.clip_path);
            self.clip_dirty = false;
        }
    }

    /// Fill the current path.
    pub fn fill(&mut self, rule: FillRule) {
        self.ensure_clip();
        let mut poly = Polygon::new();
        let bbox = polygonize(self.path.path(), &mut poly);
        self.context.render_polygon(
            &poly,
            bbox,
            &self.state.fill_style,
            self.state.global_alpha,
            self.state.shadow,
            self.state.composite_op,
            rule,
            self.state.transform,
        );
    }

    /// Fill an external path, transforming it at draw time.
    pub fn fill_path(&mut self, path: &Path2D, rule: FillRule) {
        self.ensure_clip();
        let mut poly = Polygon::new();
        let mut bbox = polygonize(path.path(), &mut poly);
        for pt in poly.points_mut() {
            *pt = self.state.transform * *pt;
        }
        bbox = transform_bbox(bbox, self.state.transform);
        self.context.render_polygon(
            &poly,
            bbox,
            &self.state.fill_style,
            self.state.global_alpha,
            self.state.shadow,
            self.state.composite_op,
            rule,
            self.state.transform,
        );
    }

    /// Stroke the current path.
    pub fn stroke(&mut self) {
        if self.state.line_width <= 0.0 {
            return;
        }
        self.ensure_clip();
        let (poly, bbox) = stroke::outline(
            self.path.path(),
            self.state.line_width,
            self.state.line_join,
            self.state.line_cap,
            self.state.miter_limit,
            self.state.transform,
            true,
            &self.state.line_dash,
            self.state.line_dash_offset,
        );
        self.context.render_polygon(
            &poly,
            bbox,
            &self.state.stroke_style,
            self.state.global_alpha,
            self.state.shadow,
            self.state.composite_op,
            FillRule::NonZero,
            self.state.transform,
        );
    }

    /// Stroke an external path, transforming it at draw time.
    pub fn stroke_path(&mut self, path: &Path2D) {
        if self.state.line_width <= 0.0 {
            return;
        }
        self.ensure_clip();
        let (poly, bbox) = stroke::outline(
            path.path(),
            self.state.line_width,
            self.state.line_join,
            self.state.line_cap,
            self.state.miter_limit,
            self.state.transform,
            false,
            &self.state.line_dash,
            self.state.line_dash_offset,
        );
        self.context.render_polygon(
            &poly,
            bbox,
            &self.state.stroke_style,
            self.state.global_alpha,
            self.state.shadow,
            self.state.composite_op,
            FillRule::NonZero,
            self.state.transform,
        );
    }

    /// Intersect the clip region with the current path.
    pub fn clip(&mut self, rule: FillRule) {
        let mut poly = Polygon::new();
        polygonize(self.path.path(), &mut poly);
        self.state.clip_path.push(ClipFill {
            poly: Rc::new(poly),
            rule,
        });
        self.clip_dirty = true;
    }

    /// Intersect the clip region with an external path.
    pub fn clip_path(&mut self, path: &Path2D, rule: FillRule) {
        let mut poly = Polygon::new();
        polygonize(path.path(), &mut poly);
        for pt in poly.points_mut() {
            *pt = self.state.transform * *pt;
        }
        self.state.clip_path.push(ClipFill {
            poly: Rc::new(poly),
            rule,
        });
        self.clip_dirty = true;
    }

    /* Immediate drawing */

    fn build_rect(&self, x: f64, y: f64, width: f64, height: f64) -> (Polygon, Rect) {
        let t = self.state.transform;
        let p1 = t * Point::new(x, y);
        let p2 = t * Point::new(x + width, y);
        let p3 = t * Point::new(x + width, y + height);
        let p4 = t * Point::new(x, y + height);

        let mut poly = Polygon::new();
        poly.add_point(p1);
        poly.add_point(p2);
        poly.add_point(p3);
        poly.add_point(p4);
        poly.end_subpoly(true);

        let mut bbox = Rect::new(p1.x, p1.y, p1.x, p1.y);
        for p in [p2, p3, p4] {
            bbox = bbox.union_pt(p);
        }
        (poly, bbox)
    }

    /// Fill an axis-aligned rectangle directly.
    pub fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ensure_clip();
        let (poly, bbox) = self.build_rect(x, y, width, height);
        self.context.render_polygon(
            &poly,
            bbox,
            &self.state.fill_style,
            self.state.global_alpha,
            self.state.shadow,
            self.state.composite_op,
            FillRule::EvenOdd,
            self.state.transform,
        );
    }

    /// Stroke the outline of an axis-aligned rectangle directly.
    pub fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if self.state.line_width <= 0.0 {
            return;
        }
        self.ensure_clip();
        let (poly, mut bbox) = self.build_rect(x, y, width, height);
        let d = self.state.line_width;
        bbox = Rect::new(bbox.x0 - d, bbox.y0 - d, bbox.x1 + d, bbox.y1 + d);

        let mut outline = Polygon::new();
        stroke::offset_polygon(
            &poly,
            &mut outline,
            self.state.line_width,
            self.state.line_join,
            self.state.line_cap,
            self.state.miter_limit,
            self.state.transform,
        );
        self.context.render_polygon(
            &outline,
            bbox,
            &self.state.stroke_style,
            self.state.global_alpha,
            self.state.shadow,
            self.state.composite_op,
            FillRule::NonZero,
            self.state.transform,
        );
    }

    /* Text */

    /// Fill `text` starting at the pen position (`x`, `y`).
    ///
    /// Each code point's outline comes from the font engine and renders
    /// like any other polygon; missing glyphs draw nothing and do not
    /// advance. Without a font engine the call is a no-op.
    pub fn fill_text(&mut self, text: &str, x: f64, y: f64) {
        self.ensure_clip();
        let Some(mut engine) = self.font_engine.take() else {
            return;
        };
        let mut pen = Point::new(x, y);
        for ch in text.chars() {
            if let Some(glyph) = engine.glyph(&self.state.font, self.state.transform, ch, pen) {
                self.context.render_polygon(
                    &glyph.polygon,
                    glyph.bbox,
                    &self.state.fill_style,
                    self.state.global_alpha,
                    self.state.shadow,
                    self.state.composite_op,
                    FillRule::NonZero,
                    self.state.transform,
                );
                pen += glyph.advance;
            }
        }
        self.font_engine = Some(engine);
    }

    /// Stroke `text` starting at the pen position (`x`, `y`).
    pub fn stroke_text(&mut self, text: &str, x: f64, y: f64) {
        if self.state.line_width <= 0.0 {
            return;
        }
        self.ensure_clip();
        let Some(mut engine) = self.font_engine.take() else {
            return;
        };
        let mut pen = Point::new(x, y);
        for ch in text.chars() {
            if let Some(glyph) = engine.glyph(&self.state.font, self.state.transform, ch, pen) {
                let mut outline = Polygon::new();
                stroke::offset_polygon(
                    &glyph.polygon,
                    &mut outline,
                    self.state.line_width,
                    self.state.line_join,
                    self.state.line_cap,
                    self.state.miter_limit,
                    self.state.transform,
                );
                let d = linear_norm(self.state.transform) * self.state.line_width;
                let bbox = Rect::new(
                    glyph.bbox.x0 - d,
                    glyph.bbox.y0 - d,
                    glyph.bbox.x1 + d,
                    glyph.bbox.y1 + d,
                );
                self.context.render_polygon(
                    &outline,
                    bbox,
                    &self.state.stroke_style,
                    self.state.global_alpha,
                    self.state.shadow,
                    self.state.composite_op,
                    FillRule::NonZero,
                    self.state.transform,
                );
                pen += glyph.advance;
            }
        }
        self.font_engine = Some(engine);
    }

    /* Pixel access */

    pub fn get_pixel(&self, x: i32, y: i32) -> Color {
        self.context.get_pixel(x, y)
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: Color) {
        self.context.put_pixel(x, y, color);
    }

    /// Copy out a region of the surface.
    pub fn get_pixmap(&self, sx: i32, sy: i32, width: i32, height: i32) -> Result<Pixmap, Error> {
        self.context.get_pixmap(sx, sy, width, height)
    }

    /// Copy a pixmap region into the surface, byte for byte.
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
        self.context.put_pixmap(dx, dy, src, sx, sy, width, height);
    }

    /// Composite a region of another canvas onto this one with the current
    /// composite operation and global alpha.
    #[allow(clippy::too_many_arguments)]
    pub fn blit(
        &mut self,
        dx: i32,
        dy: i32,
        src: &Canvas,
        sx: i32,
        sy: i32,
        width: i32,
        height: i32,
    ) {
        self.ensure_clip();
        self.context.blit_compose(
            dx,
            dy,
            &src.context,
            sx,
            sy,
            width,
            height,
            self.state.global_alpha,
            self.state.composite_op,
        );
    }

    /* Import / export */

    /// Create a canvas from a PNG file.
    #[cfg(feature = "png")]
    pub fn from_png(path: &std::path::Path) -> Result<Canvas, Error> {
        Ok(Canvas::from_pixmap(crate::io::import_png(path)?))
    }

    /// Decode a PNG file into the surface at (`x`, `y`), clipping against
    /// the surface.
    #[cfg(feature = "png")]
    pub fn import_png(&mut self, x: i32, y: i32, path: &std::path::Path) -> Result<(), Error> {
        let src = crate::io::import_png(path)?;
        self.context
            .put_pixmap(x, y, &src, 0, 0, src.width(), src.height());
        Ok(())
    }

    /// Encode the surface to a PNG file.
    #[cfg(feature = "png")]
    pub fn export_png(&self, path: &std::path::Path) -> Result<(), Error> {
        crate::io::export_png(self.context.pixmap(), path)
    }
}
