// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient specifications and per-pixel evaluation.

use kurbo::{Affine, Point};

use crate::color::{alpha_blend, Color};

/// Stops closer together than this are treated as coincident.
const POS_EPSILON: f64 = 1e-5;

/// Radial evaluation clamps the parameter here; beyond it the gradient is
/// transparent.
const RADIAL_INFINITY: f64 = 1e7;

/// The geometry of a gradient.
#[derive(Clone, Debug)]
pub enum GradientKind {
    /// Interpolates along the segment from `start` to `end`.
    Linear { start: Point, end: Point },
    /// Interpolates between two circles.
    Radial {
        center1: Point,
        radius1: f64,
        center2: Point,
        radius2: f64,
    },
    /// Sweeps around `center`, starting at `angle`.
    Conic { center: Point, angle: f64 },
}

/// A color stop; positions are in `[0, 1]`.
#[derive(Clone, Copy, Debug)]
pub struct GradientStop {
    pub pos: f64,
    pub color: Color,
}

/// A gradient: a geometry plus an ordered list of color stops.
#[derive(Clone, Debug)]
pub struct Gradient {
    kind: GradientKind,
    stops: Vec<GradientStop>,
}

impl Gradient {
    pub fn linear(start: Point, end: Point) -> Gradient {
        Gradient {
            kind: GradientKind::Linear { start, end },
            stops: Vec::new(),
        }
    }

    pub fn radial(center1: Point, radius1: f64, center2: Point, radius2: f64) -> Gradient {
        Gradient {
            kind: GradientKind::Radial {
                center1,
                radius1,
                center2,
                radius2,
            },
            stops: Vec::new(),
        }
    }

    pub fn conic(center: Point, angle: f64) -> Gradient {
        Gradient {
            kind: GradientKind::Conic { center, angle },
            stops: Vec::new(),
        }
    }

    pub fn kind(&self) -> &GradientKind {
        &self.kind
    }

    pub fn stops(&self) -> &[GradientStop] {
        &self.stops
    }

    /// Add a color stop, keeping the list sorted.
    ///
    /// A stop at an already-used position goes after the existing ones, so
    /// ties resolve by insertion order.
    pub fn add_color_stop(&mut self, pos: f64, color: Color) {
        let at = self.stops.partition_point(|s| s.pos <= pos);
        self.stops.insert(at, GradientStop { pos, color });
    }

    /// Interpolate the stop list at parameter `pos`.
    ///
    /// With no stops the gradient is opaque black; outside the stop range
    /// the nearest stop's color is used unchanged.
    fn evaluate(&self, pos: f64) -> Color {
        let Some(first) = self.stops.first() else {
            return Color::BLACK;
        };
        if pos <= first.pos {
            return first.color;
        }
        for (i, stop) in self.stops.iter().enumerate() {
            if stop.pos >= pos {
                break;
            }
            let Some(next) = self.stops.get(i + 1) else {
                return stop.color;
            };
            if next.pos < pos {
                continue;
            }
            if next.pos - stop.pos < POS_EPSILON {
                return stop.color;
            }
            let t = (pos - stop.pos) / (next.pos - stop.pos);
            return alpha_blend((t * 255.0).round() as u8, stop.color, next.color);
        }
        self.stops.last().unwrap().color
    }

    /// Evaluate the gradient at device position (`x`, `y`).
    ///
    /// `inverse` maps device coordinates back to the space the gradient was
    /// specified in.
    pub fn evaluate_at(&self, x: f64, y: f64, inverse: Affine) -> Color {
        let p = inverse * Point::new(x, y);
        match self.kind {
            GradientKind::Linear { start, end } => {
                let dx = end.x - start.x;
                let dy = end.y - start.y;
                let t = ((p.x - start.x) * dx + (p.y - start.y) * dy) / (dx * dx + dy * dy);
                self.evaluate(t)
            }
            GradientKind::Radial {
                center1,
                radius1,
                center2,
                radius2,
            } => {
                let x1 = center2.x - center1.x;
                let y1 = center2.y - center1.y;
                let x = p.x - center1.x;
                let y = p.y - center1.y;
                let dr = radius2 - radius1;
                let mut a = x1 * x1 + y1 * y1 - dr * dr;
                if a == 0.0 {
                    // The solution is continuous in `a`.
                    a = 1e-6;
                }
                let b = -2.0 * x * x1 - 2.0 * y * y1 - 2.0 * radius1 * dr;
                let c = x * x + y * y - radius1 * radius1;
                let delta = b * b - 4.0 * a * c;
                if delta < 0.0 {
                    return Color::TRANSPARENT;
                }
                let pos_sqrt = if a > 0.0 { delta.sqrt() } else { -delta.sqrt() };
                let t = (pos_sqrt - b) / (2.0 * a);
                if t > RADIAL_INFINITY {
                    return Color::TRANSPARENT;
                }
                self.evaluate(t)
            }
            GradientKind::Conic { center, angle } => {
                let dx = p.x - center.x;
                let dy = p.y - center.y;
                let tau = 2.0 * std::f64::consts::PI;
                let a = dx.atan2(-dy) - angle;
                self.evaluate(a / tau - (a / tau).floor())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn no_stops_is_opaque_black() {
        let g = Gradient::linear(p(0.0, 0.0), p(1.0, 0.0));
        assert_eq!(g.evaluate_at(0.5, 0.0, Affine::IDENTITY), Color::BLACK);
    }

    #[test]
    fn linear_midpoint() {
        let mut g = Gradient::linear(p(0.0, 0.0), p(100.0, 0.0));
        g.add_color_stop(0.0, Color::BLACK);
        g.add_color_stop(1.0, Color::WHITE);
        let c = g.evaluate_at(50.0, 0.0, Affine::IDENTITY);
        assert!(c.r == 127 || c.r == 128);
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }

    #[test]
    fn clamps_outside_stop_range() {
        let mut g = Gradient::linear(p(0.0, 0.0), p(10.0, 0.0));
        g.add_color_stop(0.25, Color::rgb8(10, 0, 0));
        g.add_color_stop(0.75, Color::rgb8(200, 0, 0));
        assert_eq!(g.evaluate_at(0.0, 0.0, Affine::IDENTITY).r, 10);
        assert_eq!(g.evaluate_at(10.0, 0.0, Affine::IDENTITY).r, 200);
    }

    #[test]
    fn coincident_stops_keep_insertion_order() {
        let mut g = Gradient::linear(p(0.0, 0.0), p(10.0, 0.0));
        g.add_color_stop(0.5, Color::rgb8(1, 0, 0));
        g.add_color_stop(0.5, Color::rgb8(2, 0, 0));
        // Left of the pair the first stop wins, right of it the second.
        assert_eq!(g.evaluate_at(2.0, 0.0, Affine::IDENTITY).r, 1);
        assert_eq!(g.evaluate_at(8.0, 0.0, Affine::IDENTITY).r, 2);
    }

    #[test]
    fn radial_outside_both_circles() {
        let mut g = Gradient::radial(p(0.0, 0.0), 0.0, p(0.0, 0.0), 10.0);
        g.add_color_stop(0.0, Color::BLACK);
        g.add_color_stop(1.0, Color::WHITE);
        // Halfway out the parameter is 0.5.
        let c = g.evaluate_at(5.0, 0.0, Affine::IDENTITY);
        assert!(c.r == 127 || c.r == 128);
    }

    #[test]
    fn conic_wraps_around() {
        let mut g = Gradient::conic(p(0.0, 0.0), 0.0);
        g.add_color_stop(0.0, Color::BLACK);
        g.add_color_stop(1.0, Color::WHITE);
        let above = g.evaluate_at(0.0, -10.0, Affine::IDENTITY);
        // Directly above the center the sweep is at its start.
        assert_eq!(above.r, 0);
        let below = g.evaluate_at(0.0, 10.0, Affine::IDENTITY);
        // Opposite the start the sweep is halfway.
        assert!(below.r == 127 || below.r == 128);
    }

    #[test]
    fn gradient_respects_inverse_transform() {
        let mut g = Gradient::linear(p(0.0, 0.0), p(10.0, 0.0));
        g.add_color_stop(0.0, Color::BLACK);
        g.add_color_stop(1.0, Color::WHITE);
        // The gradient was laid out before a 10x scale: device x = 100
        // maps back to path-space x = 10.
        let inv = Affine::scale(10.0).inverse();
        assert_eq!(g.evaluate_at(100.0, 0.0, inv).r, 255);
    }
}
