// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stroke outline construction.
//!
//! A stroke is rendered by offsetting the flattened polygon to both sides of
//! each subpolygon, inserting joins at outward turns and caps at open ends,
//! and filling the resulting rings with the non-zero rule. Offsets are
//! computed in the pre-transform frame and mapped back through the linear
//! part of the CTM, so strokes deform correctly under non-uniform scale.

use kurbo::{Affine, Point, Rect};

use crate::flatten::polygonize;
use crate::path::Path;
use crate::polygon::Polygon;
use crate::state::{LineCap, LineJoin};
use crate::transform::{
    extract_linear, linear_norm, point_angle, point_offset_ortho_transform, point_position,
};

/// Segment count for round joins and caps.
const ROUND_STEPS: usize = 5;

/// Offset both endpoints of the edge p1→p2 by `o` orthogonally.
fn line_offset(p1: Point, p2: Point, o: f64, lin: Affine, inv_lin: Affine) -> (Point, Point) {
    (
        point_offset_ortho_transform(p1, p2, o, lin, inv_lin),
        point_offset_ortho_transform(p2, p1, -o, lin, inv_lin),
    )
}

/// Emit the arc between `pa` and `pb` around `center`, both assumed at equal
/// pre-transform distance from it.
fn arc_around_center(
    center: Point,
    pa: Point,
    pb: Point,
    out: &mut Polygon,
    lin: Affine,
    inv_lin: Affine,
) {
    let dp1 = inv_lin * (pa - center).to_point();
    let dp2 = inv_lin * (pb - center).to_point();
    let mut angle = dp2.y.atan2(dp2.x) - dp1.y.atan2(dp1.x);
    let tau = 2.0 * std::f64::consts::PI;
    angle -= tau * (angle / tau).floor();
    for i in 0..=ROUND_STEPS {
        let a = -(i as f64) * angle / ROUND_STEPS as f64;
        let (ss, cs) = a.sin_cos();
        let p = lin * Point::new(cs * dp1.x + ss * dp1.y, -ss * dp1.x + cs * dp1.y);
        out.add_point(Point::new(p.x + center.x, p.y + center.y));
    }
}

/// Emit the semicircle between `p1` and `p2`, assumed on opposite sides of
/// the stroked endpoint halfway between them.
fn arc_between(p1: Point, p2: Point, out: &mut Polygon, lin: Affine, inv_lin: Affine) {
    let center = Point::new((p1.x + p2.x) * 0.5, (p1.y + p2.y) * 0.5);
    let dp = inv_lin * Point::new((p1.x - p2.x) * 0.5, (p1.y - p2.y) * 0.5);
    for i in 1..ROUND_STEPS {
        let a = -(i as f64) * std::f64::consts::PI / ROUND_STEPS as f64;
        let (ss, cs) = a.sin_cos();
        let p = lin * Point::new(cs * dp.x + ss * dp.y, -ss * dp.x + cs * dp.y);
        out.add_point(Point::new(p.x + center.x, p.y + center.y));
    }
}

/// Emit the miter intersection of the offset edges (p1o, p2o) and
/// (p1n, p2n), or nothing (a bevel) when the miter length would exceed the
/// limit or the edges are parallel.
#[allow(clippy::too_many_arguments)]
fn miter_join(
    vertex: Point,
    prev: Point,
    next: Point,
    p1o: Point,
    p2o: Point,
    p1n: Point,
    p2n: Point,
    miter_limit: f64,
    inv_lin: Affine,
    out: &mut Polygon,
) {
    // The miter-to-width ratio is 1/sin(θ/2); measure θ in the
    // pre-transform frame so the clamp is independent of the CTM.
    let a = inv_lin * (prev - vertex).to_point();
    let b = inv_lin * (next - vertex).to_point();
    let theta = point_angle(a, Point::ZERO, b);
    let half_sin = (theta / 2.0).sin();
    if half_sin <= 0.0 || 1.0 / half_sin > miter_limit {
        return;
    }

    let a11 = p2o.x - p1o.x;
    let a21 = p2o.y - p1o.y;
    let a12 = p1n.x - p2n.x;
    let a22 = p1n.y - p2n.y;
    let det = a11 * a22 - a21 * a12;
    if det == 0.0 {
        return;
    }
    let c1 = p1n.x - p1o.x;
    let c2 = p1n.y - p1o.y;
    let ans = (c1 * a22 - c2 * a12) / det;
    out.add_point(Point::new(p1o.x + ans * a11, p1o.y + ans * a21));
}

#[allow(clippy::too_many_arguments)]
fn add_join(
    join: LineJoin,
    miter_limit: f64,
    vertex: Point,
    prev: Point,
    next: Point,
    p1o: Point,
    p2o: Point,
    p1n: Point,
    p2n: Point,
    lin: Affine,
    inv_lin: Affine,
    out: &mut Polygon,
) {
    match join {
        LineJoin::Round => arc_around_center(vertex, p2o, p1n, out, lin, inv_lin),
        LineJoin::Miter => miter_join(
            vertex,
            prev,
            next,
            p1o,
            p2o,
            p1n,
            p2n,
            miter_limit,
            inv_lin,
            out,
        ),
        LineJoin::Bevel => {}
    }
}

/// Construct the stroke outline of `src` into `out`.
///
/// `src` must already be in device space; `transform` supplies the
/// linearized frame the offsets are computed in.
pub(crate) fn offset_polygon(
    src: &Polygon,
    out: &mut Polygon,
    width: f64,
    join: LineJoin,
    cap: LineCap,
    miter_limit: f64,
    transform: Affine,
) {
    let lin = extract_linear(transform);
    let inv_lin = lin.inverse();
    let o = width / 2.0;
    let pts = src.points();

    for k in 0..src.subpoly_count() {
        let (first, last) = src.subpoly_range(k);
        if first == last {
            continue;
        }
        let closed = src.is_closed(k);

        // One side, walking forward.
        let (mut p1o, mut p2o) = line_offset(pts[first], pts[first + 1], -o, lin, inv_lin);
        out.add_point(p1o);
        out.add_point(p2o);

        for i in first + 1..last {
            let (p1n, p2n) = line_offset(pts[i], pts[i + 1], -o, lin, inv_lin);
            // Join only at outward turns; the inner side overlaps naturally.
            if point_position(pts[i - 1], pts[i + 1], pts[i]) > 0.0 {
                add_join(
                    join,
                    miter_limit,
                    pts[i],
                    pts[i - 1],
                    pts[i + 1],
                    p1o,
                    p2o,
                    p1n,
                    p2n,
                    lin,
                    inv_lin,
                    out,
                );
            }
            out.add_point(p1n);
            out.add_point(p2n);
            p1o = p1n;
            p2o = p2n;
        }

        if closed {
            // The ring repeats its first point, so join across the seam.
            let (p1n, p2n) = line_offset(pts[first], pts[first + 1], -o, lin, inv_lin);
            if point_position(pts[last - 1], pts[first + 1], pts[first]) > 0.0 {
                add_join(
                    join,
                    miter_limit,
                    pts[first],
                    pts[last - 1],
                    pts[first + 1],
                    p1o,
                    p2o,
                    p1n,
                    p2n,
                    lin,
                    inv_lin,
                    out,
                );
            } else {
                out.add_point(p1n);
            }
            out.end_subpoly(true);
        } else {
            match cap {
                LineCap::Butt => {}
                LineCap::Square => {
                    let dist = (pts[last] - pts[last - 1]).hypot();
                    let new_p1 = Point::new(
                        p2o.x + (p2o.x - p1o.x) / dist * o,
                        p2o.y + (p2o.y - p1o.y) / dist * o,
                    );
                    let (p1n, p2n) = line_offset(pts[last - 1], pts[last], o, lin, inv_lin);
                    let new_p2 = Point::new(
                        p2n.x + (p2n.x - p1n.x) / dist * o,
                        p2n.y + (p2n.y - p1n.y) / dist * o,
                    );
                    out.add_point(new_p1);
                    out.add_point(new_p2);
                }
                LineCap::Round => {
                    let new_p1 = p2o;
                    let (_, p2n) = line_offset(pts[last - 1], pts[last], o, lin, inv_lin);
                    arc_between(new_p1, p2n, out, lin, inv_lin);
                }
            }
        }

        // The other side, walking backward.
        let (mut p1o, mut p2o) = line_offset(pts[last], pts[last - 1], -o, lin, inv_lin);
        out.add_point(p1o);
        out.add_point(p2o);

        for i in (first + 1..last).rev() {
            let (p1n, p2n) = line_offset(pts[i], pts[i - 1], -o, lin, inv_lin);
            if point_position(pts[i + 1], pts[i - 1], pts[i]) > 0.0 {
                add_join(
                    join,
                    miter_limit,
                    pts[i],
                    pts[i + 1],
                    pts[i - 1],
                    p1o,
                    p2o,
                    p1n,
                    p2n,
                    lin,
                    inv_lin,
                    out,
                );
            }
            out.add_point(p1n);
            out.add_point(p2n);
            p1o = p1n;
            p2o = p2n;
        }

        if closed {
            let (p1n, p2n) = line_offset(pts[last], pts[last - 1], -o, lin, inv_lin);
            if point_position(pts[first + 1], pts[last - 1], pts[first]) > 0.0 {
                add_join(
                    join,
                    miter_limit,
                    pts[first],
                    pts[first + 1],
                    pts[last - 1],
                    p1o,
                    p2o,
                    p1n,
                    p2n,
                    lin,
                    inv_lin,
                    out,
                );
            } else {
                out.add_point(p1n);
            }
        } else {
            match cap {
                LineCap::Butt => {}
                LineCap::Square => {
                    let dist = (p2o - p1o).hypot();
                    let new_p1 = Point::new(
                        p2o.x + (p2o.x - p1o.x) / dist * o,
                        p2o.y + (p2o.y - p1o.y) / dist * o,
                    );
                    let (p1n, p2n) = line_offset(pts[first + 1], pts[first], o, lin, inv_lin);
                    let new_p2 = Point::new(
                        p2n.x + (p2n.x - p1n.x) / dist * o,
                        p2n.y + (p2n.y - p1n.y) / dist * o,
                    );
                    out.add_point(new_p1);
                    out.add_point(new_p2);
                }
                LineCap::Round => {
                    let new_p1 = p2o;
                    let (_, p2n) = line_offset(pts[first + 1], pts[first], o, lin, inv_lin);
                    arc_between(new_p1, p2n, out, lin, inv_lin);
                }
            }
        }

        out.end_subpoly(true);
    }
}

/// Split `src` into the on-runs of the dash pattern.
///
/// Distances are measured in the pre-transform frame (via `inv_lin`), so a
/// scaled canvas dashes in user units. The pattern starts `dash_offset` in;
/// every run comes out as an open subpolygon, picking up caps from the
/// stroker.
pub(crate) fn dash_split(src: &Polygon, dash: &[f64], dash_offset: f64, inv_lin: Affine) -> Polygon {
    let total: f64 = dash.iter().sum();
    let mut out = Polygon::new();
    if !(total > 0.0) {
        return src.clone();
    }

    for k in 0..src.subpoly_count() {
        let (first, last) = src.subpoly_range(k);

        let mut off = dash_offset % total;
        if off < 0.0 {
            off += total;
        }
        let mut idx = 0usize;
        while off >= dash[idx] && (off > 0.0 || dash[idx] > 0.0) {
            off -= dash[idx];
            idx = (idx + 1) % dash.len();
        }
        let mut rem = dash[idx] - off;
        let mut on = idx % 2 == 0;

        if on {
            out.add_point(src.points()[first]);
        }
        for i in first..last {
            let p1 = src.points()[i];
            let p2 = src.points()[i + 1];
            let len = (inv_lin * (p2 - p1).to_point()).to_vec2().hypot();
            if len <= 0.0 {
                continue;
            }
            let mut pos = 0.0;
            while len - pos > rem {
                pos += rem;
                let t = pos / len;
                let cut = Point::new(p1.x + (p2.x - p1.x) * t, p1.y + (p2.y - p1.y) * t);
                out.add_point(cut);
                if on {
                    out.end_subpoly(false);
                }
                on = !on;
                idx = (idx + 1) % dash.len();
                rem = dash[idx];
            }
            rem -= len - pos;
            if on {
                out.add_point(p2);
            }
        }
        if on {
            out.end_subpoly(false);
        }
    }
    out
}

/// Build the stroke outline of a whole path.
///
/// With `only_linear` the path's points are taken as already transformed
/// (the canvas stores its current path in device space); otherwise the full
/// transform is applied here first. The returned box is the transformed
/// path box inflated by `linear_norm(transform) * width` on every side.
#[allow(clippy::too_many_arguments)]
pub(crate) fn outline(
    path: &Path,
    width: f64,
    join: LineJoin,
    cap: LineCap,
    miter_limit: f64,
    transform: Affine,
    only_linear: bool,
    dash: &[f64],
    dash_offset: f64,
) -> (Polygon, Rect) {
    let mut flat = Polygon::new();
    let mut bbox = polygonize(path, &mut flat);

    if !only_linear {
        for pt in flat.points_mut() {
            *pt = transform * *pt;
        }
        bbox = transform_bbox(bbox, transform);
    }

    let dashed = if dash.is_empty() {
        flat
    } else {
        dash_split(&flat, dash, dash_offset, extract_linear(transform).inverse())
    };

    let mut out = Polygon::new();
    offset_polygon(&dashed, &mut out, width, join, cap, miter_limit, transform);

    let inf_norm = linear_norm(transform);
    bbox = Rect::new(
        bbox.x0 - inf_norm * width,
        bbox.y0 - inf_norm * width,
        bbox.x1 + inf_norm * width,
        bbox.y1 + inf_norm * width,
    );

    (out, bbox)
}

/// Map a box through a transform by taking the hull of its four corners.
pub(crate) fn transform_bbox(bbox: Rect, transform: Affine) -> Rect {
    let pts = [
        transform * Point::new(bbox.x0, bbox.y0),
        transform * Point::new(bbox.x1, bbox.y1),
        transform * Point::new(bbox.x1, bbox.y0),
        transform * Point::new(bbox.x0, bbox.y1),
    ];
    let mut r = Rect::new(pts[0].x, pts[0].y, pts[0].x, pts[0].y);
    for p in &pts[1..] {
        r = r.union_pt(*p);
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Affine;

    fn line_polygon(p1: Point, p2: Point) -> Polygon {
        let mut poly = Polygon::new();
        poly.add_point(p1);
        poly.add_point(p2);
        poly.end_subpoly(false);
        poly
    }

    #[test]
    fn horizontal_segment_offsets_to_band() {
        let poly = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let mut out = Polygon::new();
        offset_polygon(
            &poly,
            &mut out,
            2.0,
            LineJoin::Miter,
            LineCap::Butt,
            10.0,
            Affine::IDENTITY,
        );
        assert_eq!(out.subpoly_count(), 1);
        for pt in out.points() {
            assert!((pt.y.abs() - 1.0).abs() < 1e-9);
            assert!(pt.x >= -1e-9 && pt.x <= 10.0 + 1e-9);
        }
    }

    #[test]
    fn square_cap_extends_past_the_end() {
        let poly = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let mut out = Polygon::new();
        offset_polygon(
            &poly,
            &mut out,
            2.0,
            LineJoin::Miter,
            LineCap::Square,
            10.0,
            Affine::IDENTITY,
        );
        let max_x = out.points().iter().fold(f64::MIN, |m, p| m.max(p.x));
        let min_x = out.points().iter().fold(f64::MAX, |m, p| m.min(p.x));
        assert!((max_x - 11.0).abs() < 1e-9);
        assert!((min_x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn round_cap_bulges_outward() {
        let poly = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let mut out = Polygon::new();
        offset_polygon(
            &poly,
            &mut out,
            2.0,
            LineJoin::Miter,
            LineCap::Round,
            10.0,
            Affine::IDENTITY,
        );
        let max_x = out.points().iter().fold(f64::MIN, |m, p| m.max(p.x));
        assert!(max_x > 10.5 && max_x <= 11.0 + 1e-9);
    }

    #[test]
    fn sharp_miter_falls_back_to_bevel() {
        // A 2-degree spike would produce a miter dozens of widths long;
        // with the default limit of 10 no outline point may stray far.
        let mut poly = Polygon::new();
        poly.add_point(Point::new(0.0, 0.0));
        poly.add_point(Point::new(100.0, 0.0));
        poly.add_point(Point::new(0.0, 3.5));
        poly.end_subpoly(false);
        let mut out = Polygon::new();
        offset_polygon(
            &poly,
            &mut out,
            2.0,
            LineJoin::Miter,
            LineCap::Butt,
            10.0,
            Affine::IDENTITY,
        );
        let max_x = out.points().iter().fold(f64::MIN, |m, p| m.max(p.x));
        assert!(max_x < 110.0, "miter was not clamped: {max_x}");
    }

    #[test]
    fn dash_splits_into_runs() {
        let poly = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let dashed = dash_split(&poly, &[2.0, 3.0], 0.0, Affine::IDENTITY);
        // on [0,2], off (2,5), on [5,7], off (7,10)
        assert_eq!(dashed.subpoly_count(), 2);
        let (f0, l0) = dashed.subpoly_range(0);
        assert_eq!(dashed.points()[f0], Point::new(0.0, 0.0));
        assert_eq!(dashed.points()[l0], Point::new(2.0, 0.0));
        let (f1, l1) = dashed.subpoly_range(1);
        assert_eq!(dashed.points()[f1], Point::new(5.0, 0.0));
        assert_eq!(dashed.points()[l1], Point::new(7.0, 0.0));
    }

    #[test]
    fn dash_offset_shifts_the_pattern() {
        let poly = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let dashed = dash_split(&poly, &[2.0, 2.0], 1.0, Affine::IDENTITY);
        // pattern phase starts 1 into the first on-segment
        let (f0, l0) = dashed.subpoly_range(0);
        assert_eq!(dashed.points()[f0], Point::new(0.0, 0.0));
        assert_eq!(dashed.points()[l0], Point::new(1.0, 0.0));
    }

    #[test]
    fn empty_dash_is_identity() {
        let poly = line_polygon(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let dashed = dash_split(&poly, &[0.0, 0.0], 5.0, Affine::IDENTITY);
        assert_eq!(dashed.subpoly_count(), 1);
    }
}
