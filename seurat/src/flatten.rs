// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flattening paths into polygons.

use kurbo::{Point, Rect};

use crate::path::{Path, Verb};
use crate::polygon::Polygon;

/// Recursion depth for curve subdivision; each level halves the parameter
/// range, so curves flatten to `2^FLATTEN_DEPTH` spans.
const FLATTEN_DEPTH: u32 = 5;

/// A bounding box that any point expands.
pub(crate) const EMPTY_BBOX: Rect = Rect::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);

fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
}

fn quad_to_poly(p1: Point, p2: Point, p3: Point, poly: &mut Polygon, n: u32) {
    if n == 0 {
        if poly.points().is_empty() {
            poly.add_point(p1);
        }
        poly.add_point(p2);
        poly.add_point(p3);
    } else {
        let l2 = midpoint(p1, p2);
        let r2 = midpoint(p2, p3);
        let m = midpoint(l2, r2);
        quad_to_poly(p1, l2, m, poly, n - 1);
        quad_to_poly(m, r2, p3, poly, n - 1);
    }
}

fn cubic_to_poly(p1: Point, p2: Point, p3: Point, p4: Point, poly: &mut Polygon, n: u32) {
    if n == 0 {
        if poly.points().is_empty() {
            poly.add_point(p1);
        }
        poly.add_point(p2);
        poly.add_point(p3);
        poly.add_point(p4);
    } else {
        let l2 = midpoint(p1, p2);
        let h = midpoint(p2, p3);
        let r3 = midpoint(p3, p4);
        let l3 = midpoint(l2, h);
        let r2 = midpoint(h, r3);
        let m = midpoint(l3, r2);
        cubic_to_poly(p1, l2, l3, m, poly, n - 1);
        cubic_to_poly(m, r2, r3, p4, poly, n - 1);
    }
}

/// Flatten `path` into `poly`, returning the bounding box of all anchor and
/// control points.
pub(crate) fn polygonize(path: &Path, poly: &mut Polygon) -> Rect {
    let mut bbox = EMPTY_BBOX;

    for (verb, pts) in path.elements() {
        // The current pen position: the last vertex of the open subpolygon,
        // or this primitive's first point when there is none.
        let last = if poly.points().is_empty() || open_subpoly_is_empty(poly) {
            pts.first().copied().unwrap_or(Point::ZERO)
        } else {
            *poly.points().last().unwrap()
        };

        for pt in pts {
            bbox = bbox.union_pt(*pt);
        }

        match verb {
            Verb::Close => poly.end_subpoly(true),
            Verb::MoveTo => {
                poly.end_subpoly(false);
                poly.add_point(pts[0]);
            }
            Verb::LineTo => poly.add_point(pts[0]),
            Verb::QuadTo => quad_to_poly(last, pts[0], pts[1], poly, FLATTEN_DEPTH),
            Verb::CubicTo => cubic_to_poly(last, pts[0], pts[1], pts[2], poly, FLATTEN_DEPTH),
        }
    }

    poly.end_subpoly(false);

    bbox
}

fn open_subpoly_is_empty(poly: &Polygon) -> bool {
    match poly.subpoly_count() {
        0 => false,
        k => poly.subpoly_range(k - 1).1 == poly.points().len() - 1,
    }
}
