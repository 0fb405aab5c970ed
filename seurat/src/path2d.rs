// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The user-facing path builder.

use kurbo::{Affine, Point};

use crate::arc::{arc_to_between, arc_to_cubics, ArcTo, CubicSeg, LoweredArc};
use crate::path::{Path, Verb};

/// A path under construction.
///
/// Every mutating call takes the transform to apply to its input points
/// before storage; the wrapped [`Path`] holds post-transform coordinates.
/// The builder additionally tracks the last *untransformed* point (needed by
/// [`arc_to`](Path2D::arc_to), whose tangent construction works on the
/// geometric input) and the first point of the current subpath (needed by
/// [`close`](Path2D::close) to return to the subpath origin).
#[derive(Clone, Debug, Default)]
pub struct Path2D {
    path: Path,
    first_t: Point,
    first: Point,
    last: Point,
}

impl Path2D {
    pub fn new() -> Path2D {
        Path2D::default()
    }

    /// The stored, post-transform path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clear the path, keeping allocations.
    pub fn reset(&mut self) {
        self.path.reset();
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    fn update_first_last(&mut self, ft: Point, f: Point, l: Point, is_move: bool) {
        if is_move || self.path.is_empty() {
            self.first_t = ft;
            self.first = f;
        }
        self.last = l;
    }

    /// Close the current subpath.
    ///
    /// After the close, a `MoveTo` back to the subpath origin is appended so
    /// primitives following the close behave as if the subpath had been
    /// restarted there. The move uses the origin as it was *transformed at
    /// the time it was recorded*, because the untransformed origin is what
    /// `arc_to` must see as the last point.
    pub fn close(&mut self) {
        self.path.close();
        self.last = self.first;
        self.path.move_to(self.first_t);
    }

    pub fn move_to(&mut self, x: f64, y: f64, transform: Affine) {
        let p = transform * Point::new(x, y);
        self.update_first_last(p, Point::new(x, y), Point::new(x, y), true);
        self.path.move_to(p);
    }

    pub fn line_to(&mut self, x: f64, y: f64, transform: Affine) {
        let p = transform * Point::new(x, y);
        self.update_first_last(p, Point::new(x, y), Point::new(x, y), false);
        self.path.line_to(p);
    }

    pub fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64, transform: Affine) {
        let cp = transform * Point::new(cpx, cpy);
        let p = transform * Point::new(x, y);
        self.update_first_last(cp, Point::new(cpx, cpy), Point::new(x, y), false);
        self.path.quad_to(cp, p);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn bezier_curve_to(
        &mut self,
        cp1x: f64,
        cp1y: f64,
        cp2x: f64,
        cp2y: f64,
        x: f64,
        y: f64,
        transform: Affine,
    ) {
        let cp1 = transform * Point::new(cp1x, cp1y);
        let cp2 = transform * Point::new(cp2x, cp2y);
        let p = transform * Point::new(x, y);
        self.update_first_last(cp1, Point::new(cp1x, cp1y), Point::new(x, y), false);
        self.path.cubic_to(cp1, cp2, p);
    }

    /// Append an axis-aligned rectangle as a closed subpath.
    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, transform: Affine) {
        self.move_to(x, y, transform);
        self.line_to(x + width, y, transform);
        self.line_to(x + width, y + height, transform);
        self.line_to(x, y + height, transform);
        self.close();
    }

    fn append_cubics(&mut self, start: Point, cubics: &[CubicSeg], transform: Affine) {
        self.line_to(start.x, start.y, transform);
        for seg in cubics {
            self.bezier_curve_to(
                seg[0].x, seg[0].y, seg[1].x, seg[1].y, seg[2].x, seg[2].y, transform,
            );
        }
    }

    /// Append a circular arc around (`x`, `y`) from angle `a1` to `a2`.
    #[allow(clippy::too_many_arguments)]
    pub fn arc(&mut self, x: f64, y: f64, r: f64, a1: f64, a2: f64, ccw: bool, transform: Affine) {
        let LoweredArc { start, cubics } = arc_to_cubics(x, y, r, r, a1, a2, ccw);
        self.append_cubics(start, &cubics, transform);
    }

    /// Append an arc of radius `r` tangent to the lines from the current
    /// point to (`x1`, `y1`) and from there to (`x2`, `y2`).
    pub fn arc_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, r: f64, transform: Affine) {
        // An empty path has no tangent line to work with; a path holding a
        // single move is considered non-empty here.
        if self.path.is_empty() {
            self.move_to(x1, y1, transform);
            return;
        }
        match arc_to_between(self.last, Point::new(x1, y1), Point::new(x2, y2), r) {
            ArcTo::Line(p) => self.line_to(p.x, p.y, transform),
            ArcTo::Arc(LoweredArc { start, cubics }) => {
                self.append_cubics(start, &cubics, transform)
            }
        }
    }

    /// Append an elliptic arc with radii (`rx`, `ry`) rotated by `rotation`.
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
        transform: Affine,
    ) {
        let LoweredArc { start, cubics } = arc_to_cubics(x, y, rx, ry, a1, a2, ccw);
        let rot = |p: Point| {
            let (sin_r, cos_r) = (-rotation).sin_cos();
            Point::new(p.x * cos_r + p.y * sin_r, p.y * cos_r - p.x * sin_r)
        };
        let cubics: Vec<CubicSeg> = cubics
            .iter()
            .map(|seg| [rot(seg[0]), rot(seg[1]), rot(seg[2])])
            .collect();
        self.append_cubics(rot(start), &cubics, transform);
    }

    /// Append every primitive of `src`, running its points through
    /// `transform`.
    pub fn add(&mut self, src: &Path2D, transform: Affine) {
        for (verb, pts) in src.path.elements() {
            match verb {
                Verb::Close => self.close(),
                Verb::MoveTo => self.move_to(pts[0].x, pts[0].y, transform),
                Verb::LineTo => self.line_to(pts[0].x, pts[0].y, transform),
                Verb::QuadTo => {
                    self.quadratic_curve_to(pts[0].x, pts[0].y, pts[1].x, pts[1].y, transform)
                }
                Verb::CubicTo => self.bezier_curve_to(
                    pts[0].x, pts[0].y, pts[1].x, pts[1].y, pts[2].x, pts[2].y, transform,
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_returns_to_subpath_origin() {
        let mut p = Path2D::new();
        p.move_to(3.0, 4.0, Affine::IDENTITY);
        p.line_to(8.0, 4.0, Affine::IDENTITY);
        p.close();
        // The close appends a move back to the origin, so the next line
        // starts a fresh subpath there.
        p.line_to(3.0, 9.0, Affine::IDENTITY);
        let els: Vec<_> = p.path().elements().map(|(v, _)| v).collect();
        assert_eq!(
            els,
            vec![Verb::MoveTo, Verb::LineTo, Verb::Close, Verb::MoveTo, Verb::LineTo]
        );
        assert_eq!(p.last, Point::new(3.0, 9.0));
    }

    #[test]
    fn arc_to_on_empty_path_moves() {
        let mut p = Path2D::new();
        p.arc_to(5.0, 5.0, 10.0, 5.0, 2.0, Affine::IDENTITY);
        let els: Vec<_> = p.path().elements().map(|(v, _)| v).collect();
        assert_eq!(els, vec![Verb::MoveTo]);
    }

    #[test]
    fn arc_to_consults_untransformed_last_point() {
        // Under a translation, the tangent construction must still see the
        // geometric (0, 0) as the current point.
        let t = Affine::translate((100.0, 0.0));
        let mut p = Path2D::new();
        p.move_to(0.0, 0.0, t);
        p.arc_to(10.0, 0.0, 10.0, 10.0, 2.0, t);
        // The arc starts on the segment (0,0)→(10,0); transformed x must be
        // within [100, 110].
        let start = p.path().elements().nth(1).unwrap().1[0];
        assert!(start.x > 100.0 && start.x < 110.0);
        assert!(start.y.abs() < 1e-9);
    }

    #[test]
    fn transform_applies_before_storage() {
        let t = Affine::scale(2.0);
        let mut p = Path2D::new();
        p.move_to(1.0, 1.0, t);
        assert_eq!(p.path().last_point(), Some(Point::new(2.0, 2.0)));
        assert_eq!(p.last, Point::new(1.0, 1.0));
    }
}
