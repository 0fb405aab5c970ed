// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Affine transform and small geometry helpers.
//!
//! Transforms are plain [`kurbo::Affine`] matrices, applied as
//! `(x, y) → (x·a + y·c + e, x·b + y·d + f)`. Drawing-state mutators
//! pre-concatenate, so translate/scale/rotate compose in call order.

use kurbo::{Affine, Point, Vec2};

/// The linear part of `t`, with the translation zeroed.
pub fn extract_linear(t: Affine) -> Affine {
    let [a, b, c, d, _, _] = t.as_coeffs();
    Affine::new([a, b, c, d, 0.0, 0.0])
}

/// The scale factors of `t`: `(√(a² + b²), det / √(a² + b²))`.
pub fn extract_scale(t: Affine) -> (f64, f64) {
    let [a, b, c, d, _, _] = t.as_coeffs();
    let det = a * d - b * c;
    let r = (a * a + b * b).sqrt();
    (r, det / r)
}

/// The translation part of `t`.
pub fn extract_translation(t: Affine) -> Vec2 {
    t.translation()
}

/// Sum of the absolute linear coefficients, an upper bound on how far the
/// transform can move a unit offset in any axis direction.
pub fn linear_norm(t: Affine) -> f64 {
    let [a, b, c, d, _, _] = t.as_coeffs();
    a.abs() + b.abs() + c.abs() + d.abs()
}

/// The angle p1-p2-p3, in `[0, π]`.
pub fn point_angle(p1: Point, p2: Point, p3: Point) -> f64 {
    let d1_2 = (p2 - p1).hypot2();
    let d1 = d1_2.sqrt();
    let d2_2 = (p3 - p2).hypot2();
    let d2 = d2_2.sqrt();
    let d3_2 = (p1 - p3).hypot2();
    let c = ((d1_2 + d2_2 - d3_2) / (2.0 * d1 * d2)).min(1.0);
    c.acos()
}

/// The position of `p` relative to the directed line p1→p2:
/// negative on the left, positive on the right, zero when exactly on it.
pub fn point_position(p1: Point, p2: Point, p: Point) -> f64 {
    (p2.y - p1.y) * (p.x - p1.x) - (p2.x - p1.x) * (p.y - p1.y)
}

/// The point at distance `o` from `p1`, orthogonal to p1→p2 (to the right
/// for positive `o`).
pub fn point_offset_ortho(p1: Point, p2: Point, o: f64) -> Point {
    let r = o / (p2 - p1).hypot();
    Point::new(p1.x + (p2.y - p1.y) * r, p1.y - (p2.x - p1.x) * r)
}

/// Like [`point_offset_ortho`], but for points living in the image of a
/// linear transform: the orthogonal direction is found in the pre-transform
/// frame (via `inv_lin`) and mapped back (via `lin`), so strokes stay
/// uniform under non-uniform scale.
pub fn point_offset_ortho_transform(
    p1: Point,
    p2: Point,
    o: f64,
    lin: Affine,
    inv_lin: Affine,
) -> Point {
    let dp = inv_lin * (p2 - p1).to_point();
    let ortho = Point::new(-dp.y, dp.x);
    let norm = ortho.to_vec2().hypot();
    let ortho = lin * ortho;
    Point::new(p1.x + ortho.x / norm * o, p1.y + ortho.y / norm * o)
}

/// Normalize an angle into `[0, 2π)`.
pub(crate) fn normalize_angle(a: f64) -> f64 {
    let tau = 2.0 * std::f64::consts::PI;
    a - tau * (a / tau).floor()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn inverse_round_trip() {
        let t = Affine::new([2.0, 0.5, -1.0, 3.0, 7.0, -4.0]);
        let id = t * t.inverse();
        for (x, y) in id.as_coeffs().iter().zip(Affine::IDENTITY.as_coeffs()) {
            assert_near(*x, y);
        }
        let p = id * Point::new(13.0, -5.0);
        assert_near(p.x, 13.0);
        assert_near(p.y, -5.0);
    }

    #[test]
    fn scale_decomposition() {
        let t = Affine::scale_non_uniform(3.0, 2.0);
        let (sx, sy) = extract_scale(t);
        assert_near(sx, 3.0);
        assert_near(sy, 2.0);
    }

    #[test]
    fn linear_part_drops_translation() {
        let t = Affine::translate((5.0, 6.0)) * Affine::rotate(1.0);
        let lin = extract_linear(t);
        assert_eq!(lin.translation(), Vec2::ZERO);
        assert_eq!(lin.as_coeffs()[..4], t.as_coeffs()[..4]);
    }

    #[test]
    fn compose_in_call_order() {
        // translate then scale, as a canvas user would issue them
        let t = Affine::IDENTITY * Affine::translate((10.0, 0.0)) * Affine::scale(2.0);
        let p = t * Point::new(1.0, 1.0);
        assert_near(p.x, 12.0);
        assert_near(p.y, 2.0);
    }

    #[test]
    fn ortho_offset_is_orthogonal() {
        let p = point_offset_ortho(Point::new(0.0, 0.0), Point::new(10.0, 0.0), 2.0);
        assert_near(p.x, 0.0);
        assert_near(p.y, -2.0);
    }

    #[test]
    fn ortho_offset_under_scale() {
        // The offset is found in the pre-transform frame and mapped back, so
        // a 2x horizontal scale doubles the offset of a vertical edge.
        let lin = Affine::scale_non_uniform(2.0, 1.0);
        let p = point_offset_ortho_transform(
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            3.0,
            lin,
            lin.inverse(),
        );
        assert_near(p.x, -6.0);
        assert_near(p.y, 0.0);
    }
}
