// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lowering of circular and elliptic arcs to cubic Beziers.

use kurbo::Point;

use crate::transform::{normalize_angle, point_angle, point_offset_ortho, point_position};

/// One cubic segment: two control points and the end point.
pub(crate) type CubicSeg = [Point; 3];

/// An arc lowered to at most four cubic segments, preceded by its start
/// point.
pub(crate) struct LoweredArc {
    pub start: Point,
    pub cubics: Vec<CubicSeg>,
}

// Requires |a2 - a1| < π; a1 < a2 draws clockwise, a2 < a1 counter-clockwise.
fn arc_segment(x: f64, y: f64, rx: f64, ry: f64, a1: f64, a2: f64) -> CubicSeg {
    let (sin_a1, cos_a1) = a1.sin_cos();
    let (sin_a2, cos_a2) = a2.sin_cos();
    let k = 4.0 / 3.0 * ((a2 - a1) / 4.0).tan();
    [
        Point::new(x + rx * (cos_a1 - k * sin_a1), y + ry * (sin_a1 + k * cos_a1)),
        Point::new(x + rx * (cos_a2 + k * sin_a2), y + ry * (sin_a2 - k * cos_a2)),
        Point::new(x + rx * cos_a2, y + ry * sin_a2),
    ]
}

/// Lower an axis-aligned elliptic arc to cubics.
///
/// The angular span is split in four for spans of at least π, in two for
/// spans of at least π/2, and kept whole otherwise.
pub(crate) fn arc_to_cubics(
    x: f64,
    y: f64,
    rx: f64,
    ry: f64,
    mut a1: f64,
    mut a2: f64,
    ccw: bool,
) -> LoweredArc {
    let tau = 2.0 * std::f64::consts::PI;
    let mut d = 0.0;
    if !ccw {
        if a1 < a2 {
            d = (a2 - a1).min(tau);
        } else if a1 > a2 {
            d = normalize_angle(a2 - a1);
        }
        a1 = normalize_angle(a1);
        a2 = a1 + d;
    } else {
        if a1 > a2 {
            d = (a1 - a2).min(tau);
        } else if a1 < a2 {
            d = normalize_angle(a1 - a2);
        }
        a2 = normalize_angle(a2);
        a1 = a2 + d;
    }

    let start = Point::new(x + rx * a1.cos(), y + ry * a1.sin());
    let span = a2 - a1;
    let cubics = if d < std::f64::consts::FRAC_PI_2 {
        vec![arc_segment(x, y, rx, ry, a1, a2)]
    } else if d < std::f64::consts::PI {
        vec![
            arc_segment(x, y, rx, ry, a1, a1 + span * 0.5),
            arc_segment(x, y, rx, ry, a1 + span * 0.5, a2),
        ]
    } else {
        vec![
            arc_segment(x, y, rx, ry, a1, a1 + span * 0.25),
            arc_segment(x, y, rx, ry, a1 + span * 0.25, a1 + span * 0.5),
            arc_segment(x, y, rx, ry, a1 + span * 0.5, a1 + span * 0.75),
            arc_segment(x, y, rx, ry, a1 + span * 0.75, a2),
        ]
    };
    LoweredArc { start, cubics }
}

/// Lower the circular arc around `c` from `p1` to `p2`, picking the shorter
/// sweep direction.
fn arc_between_points(c: Point, r: f64, p1: Point, p2: Point) -> LoweredArc {
    let tau = 2.0 * std::f64::consts::PI;
    let east = Point::new(c.x + 1.0, c.y);
    let mut a1 = point_angle(east, c, p1);
    let mut a2 = point_angle(east, c, p2);
    if p1.y < c.y {
        a1 = tau - a1;
    }
    if p2.y < c.y {
        a2 = tau - a2;
    }
    let mut da = a2 - a1;
    if da < 0.0 {
        da += tau;
    }
    arc_to_cubics(c.x, c.y, r, r, a1, a2, da > std::f64::consts::PI)
}

/// The result of lowering an arc-to: either a bare line to the corner point
/// (the degenerate cases) or a line to the arc start followed by cubics.
pub(crate) enum ArcTo {
    Line(Point),
    Arc(LoweredArc),
}

/// Lower a Canvas `arc_to(p1, p2, r)` with current point `p0`.
///
/// Colinear or coincident points fall back to a line to `p1`.
pub(crate) fn arc_to_between(p0: Point, p1: Point, p2: Point, r: f64) -> ArcTo {
    if point_position(p0, p1, p2) == 0.0 || p0 == p1 || p1 == p2 || p0 == p2 {
        return ArcTo::Line(p1);
    }
    let a = point_angle(p0, p1, p2);

    // Distance from the corner to the two tangent points.
    let d = r / (a / 2.0).tan();

    let r1 = d / (p1 - p0).hypot();
    let i1 = Point::new(p1.x - (p1.x - p0.x) * r1, p1.y - (p1.y - p0.y) * r1);

    let r2 = d / (p2 - p1).hypot();
    let i2 = Point::new(p1.x - (p1.x - p2.x) * r2, p1.y - (p1.y - p2.y) * r2);

    let c = if point_position(p0, p1, p2) < 0.0 {
        midpoint(
            point_offset_ortho(i1, p1, -r),
            point_offset_ortho(i2, p1, r),
        )
    } else {
        midpoint(
            point_offset_ortho(i1, p1, r),
            point_offset_ortho(i2, p1, -r),
        )
    };

    ArcTo::Arc(arc_between_points(c, r, i1, i2))
}

fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) * 0.5, (p1.y + p2.y) * 0.5)
}
