// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scan-line rasterizer.
//!
//! Coverage is analytic on an 8×8 sub-pixel grid. Every polygon edge,
//! clipped to one pixel and snapped to ninths, maps to a 64-bit mask of the
//! samples left of it; the masks for all four endpoint coordinates are
//! precomputed in a 9×9×9×9 table. Even-odd coverage XORs the masks and
//! counts bits; non-zero keeps 64 biased 8-bit winding counters packed into
//! eight words. Rows are produced by clipping the polygon to each scan band
//! with Sutherland-Hodgman passes, then to each pixel column; columns no
//! edge crosses reuse the previous coverage.

use std::sync::OnceLock;

use kurbo::{Affine, Point, Rect};

use crate::blur::gaussian_blur_alpha;
use crate::color::Color;
use crate::compose::{compose, CompositeOp};
use crate::pixmap::Pixmap;
use crate::polygon::Polygon;
use crate::state::{FillRule, Shadow};
use crate::style::DrawStyle;

/// Side length of the sub-pixel sample grid.
const SUB: f64 = 8.0;

/// Non-zero winding falls back to even-odd above this point count, where
/// its packed 8-bit counters could overflow.
const NON_ZERO_LIMIT: usize = 128;

pub(crate) fn fastround(x: f64) -> i32 {
    (x + 0.5).floor() as i32
}

struct Masks {
    /// Edge masks indexed by `((x1 * 9 + y1) * 9 + x2) * 9 + y2`.
    edge: Vec<u64>,
    /// Expansion of a mask byte into eight byte-lanes of 0/1.
    map: [u64; 256],
}

impl Masks {
    fn build() -> Masks {
        let mut edge = vec![0u64; 9 * 9 * 9 * 9];
        let mut at = 0;
        for x1 in 0..=8i32 {
            for y1 in 0..=8i32 {
                for x2 in 0..=8i32 {
                    for y2 in 0..=8i32 {
                        let mut m = 0u64;
                        if y1 != y2 {
                            for i in 0..8i32 {
                                if (i < y1 && i < y2) || (i >= y1 && i >= y2) {
                                    continue;
                                }
                                let j = fastround(
                                    x1 as f64
                                        + (x2 - x1) as f64 * (i as f64 + 0.5 - y1 as f64)
                                            / (y2 - y1) as f64,
                                );
                                m |= (0xffu64 >> j) << ((7 - i) * 8);
                            }
                        }
                        edge[at] = m;
                        at += 1;
                    }
                }
            }
        }

        let mut map = [0u64; 256];
        for (i, entry) in map.iter_mut().enumerate() {
            let mut m = 0u64;
            for b in 0..8 {
                m |= (((i >> b) & 1) as u64) << (8 * b);
            }
            *entry = m;
        }

        Masks { edge, map }
    }

    #[inline]
    fn edge_mask(&self, current: Point, previous: Point, x: f64, y: f64) -> u64 {
        let x1 = fastround((current.x - x) * SUB).clamp(0, 8);
        let y1 = fastround((current.y - y) * SUB).clamp(0, 8);
        let x2 = fastround((previous.x - x) * SUB).clamp(0, 8);
        let y2 = fastround((previous.y - y) * SUB).clamp(0, 8);
        self.edge[(((x1 * 9 + y1) * 9 + x2) * 9 + y2) as usize]
    }
}

fn masks() -> &'static Masks {
    static MASKS: OnceLock<Masks> = OnceLock::new();
    MASKS.get_or_init(Masks::build)
}

/// Clip `p` against the horizontal line at `y`, keeping the side `norm`
/// points away from, into `np`. The offsets shift `p` before clipping.
fn clip_horizontal(y: f64, norm: f64, p: &Polygon, np: &mut Polygon, x_offset: f64, y_offset: f64) {
    np.clear();
    for k in 0..p.subpoly_count() {
        let (first, last) = p.subpoly_range(k);
        let mut prev_idx = last;
        for i in first..=last {
            let current = Point::new(p.points()[i].x + x_offset, p.points()[i].y + y_offset);
            let previous = Point::new(
                p.points()[prev_idx].x + x_offset,
                p.points()[prev_idx].y + y_offset,
            );

            if (current.y - y) * norm <= 0.0 {
                if (previous.y - y) * norm > 0.0 {
                    let px = current.x
                        + (previous.x - current.x) * (y - current.y) / (previous.y - current.y);
                    np.add_point(Point::new(px, y));
                }
                np.add_point(current);
            } else if (previous.y - y) * norm <= 0.0 {
                let px = current.x
                    + (previous.x - current.x) * (y - current.y) / (previous.y - current.y);
                np.add_point(Point::new(px, y));
            }
            prev_idx = i;
        }
        np.end_subpoly(false);
    }
}

fn clip_vertical(x: f64, norm: f64, p: &Polygon, np: &mut Polygon) {
    np.clear();
    for k in 0..p.subpoly_count() {
        let (first, last) = p.subpoly_range(k);
        let mut prev_idx = last;
        for i in first..=last {
            let current = p.points()[i];
            let previous = p.points()[prev_idx];

            if (current.x - x) * norm <= 0.0 {
                if (previous.x - x) * norm > 0.0 {
                    let py = current.y
                        + (previous.y - current.y) * (x - current.x) / (previous.x - current.x);
                    np.add_point(Point::new(x, py));
                }
                np.add_point(current);
            } else if (previous.x - x) * norm <= 0.0 {
                let py = current.y
                    + (previous.y - current.y) * (x - current.x) / (previous.x - current.x);
                np.add_point(Point::new(x, py));
            }
            prev_idx = i;
        }
        np.end_subpoly(false);
    }
}

/// Mark the columns any non-horizontal edge of the scan-band polygon
/// touches; unmarked columns can reuse their neighbor's coverage.
fn build_complex(w: i32, p: &Polygon) -> Vec<bool> {
    let mut complex = vec![false; w as usize];
    for k in 0..p.subpoly_count() {
        let (first, last) = p.subpoly_range(k);
        let mut prev_idx = last;
        for i in first..=last {
            let current = p.points()[i];
            let previous = p.points()[prev_idx];
            prev_idx = i;
            if current.y == previous.y {
                continue;
            }
            let mut ix1 = current.x.floor() as i32;
            let mut ix2 = previous.x.floor() as i32;
            if ix1 > ix2 {
                std::mem::swap(&mut ix1, &mut ix2);
            }
            if ix1 < w && ix2 >= 0 {
                for x in ix1.max(0)..=ix2.min(w - 1) {
                    complex[x as usize] = true;
                }
            }
        }
    }
    complex
}

/// Coverage of the pixel at (`x`, `y`) by XOR of edge masks.
fn coverage_even_odd(y: f64, x: f64, p: &Polygon) -> i32 {
    let tables = masks();
    let mut mask = 0u64;
    for k in 0..p.subpoly_count() {
        let (first, last) = p.subpoly_range(k);
        let mut prev_idx = last;
        for i in first..=last {
            mask ^= tables.edge_mask(p.points()[i], p.points()[prev_idx], x, y);
            prev_idx = i;
        }
    }
    (mask.count_ones() as i32 * 255) / 64
}

/// Coverage of the pixel at (`x`, `y`) by packed biased winding counters.
fn coverage_non_zero(y: f64, x: f64, p: &Polygon) -> i32 {
    if p.points().len() >= NON_ZERO_LIMIT {
        return coverage_even_odd(y, x, p);
    }
    let tables = masks();

    let mut lcnt = [0x8080_8080_8080_8080u64; 8];
    for k in 0..p.subpoly_count() {
        let (first, last) = p.subpoly_range(k);
        let mut prev_idx = last;
        for i in first..=last {
            let current = p.points()[i];
            let previous = p.points()[prev_idx];
            prev_idx = i;
            let m = tables.edge_mask(current, previous, x, y);
            let y1 = fastround((current.y - y) * SUB);
            let y2 = fastround((previous.y - y) * SUB);
            if y2 > y1 {
                for (l, cnt) in lcnt.iter_mut().enumerate() {
                    *cnt = cnt.wrapping_add(tables.map[((m >> (8 * l)) & 0xff) as usize]);
                }
            } else if y2 < y1 {
                for (l, cnt) in lcnt.iter_mut().enumerate() {
                    *cnt = cnt.wrapping_sub(tables.map[((m >> (8 * l)) & 0xff) as usize]);
                }
            }
        }
    }

    let mut bits = 0;
    for cnt in lcnt {
        for l in 0..8 {
            bits += (((cnt >> (8 * l)) & 0xff) != 0x80) as i32;
        }
    }
    bits * 255 / 64
}

fn coverage(rule: FillRule, y: f64, x: f64, p: &Polygon) -> i32 {
    match rule {
        FillRule::NonZero => coverage_non_zero(y, x, p),
        FillRule::EvenOdd => coverage_even_odd(y, x, p),
    }
}

/// Render a polygon onto `pm` with the full set of drawing parameters.
#[allow(clippy::too_many_arguments)]
pub(crate) fn render(
    pm: &mut Pixmap,
    poly: &Polygon,
    bbox: Rect,
    style: &DrawStyle,
    global_alpha: f64,
    shadow: Shadow,
    op: CompositeOp,
    clip: Option<&Pixmap>,
    rule: FillRule,
    transform: Affine,
) {
    if shadow.is_visible() && op != CompositeOp::Copy {
        render_layered(
            pm, poly, bbox, style, global_alpha, shadow, op, clip, rule, transform,
        );
    } else {
        render_direct(pm, poly, bbox, style, global_alpha, op, clip, rule, transform);
    }
}

#[allow(clippy::too_many_arguments)]
fn render_direct(
    pm: &mut Pixmap,
    poly: &Polygon,
    bbox: Rect,
    style: &DrawStyle,
    global_alpha: f64,
    op: CompositeOp,
    clip: Option<&Pixmap>,
    rule: FillRule,
    transform: Affine,
) {
    let mut line_poly = Polygon::new();
    let mut pixel_poly = Polygon::new();
    let mut tmp_poly = Polygon::new();

    let inverse = transform.inverse();
    let ga256 = fastround(global_alpha * 256.0);

    let (mut lo_i, mut hi_i) = (0, pm.height());
    let (mut lo_j, mut hi_j) = (0, pm.width());
    if !op.is_full_screen() {
        lo_i = (bbox.y0 as i32).max(0);
        hi_i = ((bbox.y1 + 1.0) as i32).min(pm.height());
        lo_j = (bbox.x0 as i32).max(0);
        hi_j = ((bbox.x1 + 1.0) as i32).min(pm.width());
    }

    for i in lo_i..hi_i {
        // Rows outside the bounding box see a transparent source.
        if (i as f64) < bbox.y0 || (i as f64) > bbox.y1 {
            for j in 0..pm.width() {
                let dst = pm.at(i, j);
                *pm.at_mut(i, j) = compose(Color::TRANSPARENT, dst, 0, op);
            }
            continue;
        }

        clip_horizontal(i as f64, -1.0, poly, &mut tmp_poly, 0.0, 0.0);
        clip_horizontal(i as f64 + 1.0, 1.0, &tmp_poly, &mut line_poly, 0.0, 0.0);

        let complex = build_complex(pm.width(), &line_poly);
        let mut calculate = true;
        let mut alpha = 0;

        for j in lo_j..hi_j {
            if (j as f64) < bbox.x0 || (j as f64) > bbox.x1 {
                let dst = pm.at(i, j);
                *pm.at_mut(i, j) = compose(Color::TRANSPARENT, dst, 0, op);
                continue;
            }

            let is_complex = complex[j as usize];
            calculate |= is_complex;

            if calculate {
                clip_vertical(j as f64, -1.0, &line_poly, &mut tmp_poly);
                clip_vertical(j as f64 + 1.0, 1.0, &tmp_poly, &mut pixel_poly);
                // The band clipped to x ≥ j serves every later column.
                std::mem::swap(&mut line_poly, &mut tmp_poly);

                alpha = coverage(rule, i as f64, j as f64, &pixel_poly);
                calculate = is_complex;
            }

            let color = style.evaluate(j as f64, i as f64, inverse);
            let mut draw_alpha = (alpha * ga256 * color.a as i32) / (256 * 255);
            if let Some(mask) = clip {
                draw_alpha = draw_alpha * (255 - mask.at(i, j).a as i32) / 255;
            }

            let dst = pm.at(i, j);
            *pm.at_mut(i, j) = compose(color, dst, draw_alpha, op);
        }
    }
}

/// Render the polygon alone into a pixmap the size of its bounding box,
/// with coverage and source alpha folded into the alpha channel.
fn render_to_pixmap(
    poly: &Polygon,
    bbox: Rect,
    style: &DrawStyle,
    rule: FillRule,
    transform: Affine,
) -> Option<Pixmap> {
    let w = (bbox.x1 - bbox.x0) as i32 + 1;
    let h = (bbox.y1 - bbox.y0) as i32 + 1;
    let mut pm = Pixmap::new(w, h).ok()?;

    let mut line_poly = Polygon::new();
    let mut pixel_poly = Polygon::new();
    let mut tmp_poly = Polygon::new();
    let inverse = transform.inverse();

    for i in 0..h {
        clip_horizontal(i as f64, -1.0, poly, &mut tmp_poly, -bbox.x0, -bbox.y0);
        clip_horizontal(i as f64 + 1.0, 1.0, &tmp_poly, &mut line_poly, 0.0, 0.0);

        let complex = build_complex(w, &line_poly);
        let mut calculate = true;
        let mut alpha = 0;

        for j in 0..w {
            let is_complex = complex[j as usize];
            calculate |= is_complex;

            if calculate {
                clip_vertical(j as f64, -1.0, &line_poly, &mut tmp_poly);
                clip_vertical(j as f64 + 1.0, 1.0, &tmp_poly, &mut pixel_poly);
                std::mem::swap(&mut line_poly, &mut tmp_poly);

                alpha = coverage(rule, i as f64, j as f64, &pixel_poly);
                calculate = is_complex;
            }

            let color = style.evaluate(j as f64 + bbox.x0, i as f64 + bbox.y0, inverse);
            let draw_alpha = (alpha * color.a as i32) / 255;
            *pm.at_mut(i, j) = Color {
                a: draw_alpha as u8,
                ..color
            };
        }
    }

    Some(pm)
}

/// Render with a shadow: the shape goes to an intermediate raster, its
/// alpha becomes a blurred matte recolored to the shadow color, and both
/// are composited onto the destination.
#[allow(clippy::too_many_arguments)]
fn render_layered(
    pm: &mut Pixmap,
    poly: &Polygon,
    bbox: Rect,
    style: &DrawStyle,
    global_alpha: f64,
    shadow: Shadow,
    op: CompositeOp,
    clip: Option<&Pixmap>,
    rule: FillRule,
    transform: Affine,
) {
    let Some(rendered) = render_to_pixmap(poly, bbox, style, rule, transform) else {
        return render_direct(pm, poly, bbox, style, global_alpha, op, clip, rule, transform);
    };

    let margin = (3.0 * shadow.blur * shadow.blur).sqrt().ceil() as i32;

    let mut matte = match Pixmap::new(rendered.width() + margin * 2, rendered.height() + margin * 2)
    {
        Ok(m) => m,
        Err(_) => return,
    };
    for i in 0..rendered.height() {
        for j in 0..rendered.width() {
            matte.at_mut(i + margin, j + margin).a = rendered.at(i, j).a;
        }
    }

    let blurred = if shadow.blur == 0.0 {
        matte
    } else {
        gaussian_blur_alpha(&matte, shadow.blur / 2.0)
    };

    let sbbox = Rect::new(
        bbox.x0 - margin as f64 + shadow.offset_x,
        bbox.y0 - margin as f64 + shadow.offset_y,
        bbox.x1 + margin as f64 + shadow.offset_x,
        bbox.y1 + margin as f64 + shadow.offset_y,
    );

    let (mut lo_i, mut hi_i) = (0, pm.height());
    let (mut lo_j, mut hi_j) = (0, pm.width());
    if !op.is_full_screen() {
        lo_i = (sbbox.y0 as i32).max(0);
        hi_i = ((sbbox.y1 + 1.0) as i32).min(pm.height());
        lo_j = (sbbox.x0 as i32).max(0);
        hi_j = ((sbbox.x1 + 1.0) as i32).min(pm.width());
    }

    for i in lo_i..hi_i {
        for j in lo_j..hi_j {
            if (j as f64) < sbbox.x0
                || (j as f64) > sbbox.x1
                || (i as f64) < sbbox.y0
                || (i as f64) > sbbox.y1
            {
                let dst = pm.at(i, j);
                *pm.at_mut(i, j) = compose(Color::TRANSPARENT, dst, 0, op);
                continue;
            }

            let mi = (i - sbbox.y0 as i32).clamp(0, blurred.height() - 1);
            let mj = (j - sbbox.x0 as i32).clamp(0, blurred.width() - 1);
            let fill = Color {
                a: blurred.at(mi, mj).a,
                r: shadow.color.r,
                g: shadow.color.g,
                b: shadow.color.b,
            };

            let mut draw_alpha = fill.a as f64;
            if let Some(mask) = clip {
                draw_alpha *= (255 - mask.at(i, j).a as i32) as f64;
                draw_alpha /= 255.0;
            }

            let dst = pm.at(i, j);
            *pm.at_mut(i, j) = compose(
                fill,
                dst,
                (draw_alpha * shadow.color.a as f64 * global_alpha / 255.0) as i32,
                op,
            );
        }
    }

    // Now the shape itself, on top of its shadow.
    let (mut lo_i, mut hi_i) = (0, pm.height());
    let (mut lo_j, mut hi_j) = (0, pm.width());
    if !op.is_full_screen() {
        lo_i = (bbox.y0 as i32).max(0);
        hi_i = ((bbox.y1 + 1.0) as i32).min(pm.height());
        lo_j = (bbox.x0 as i32).max(0);
        hi_j = ((bbox.x1 + 1.0) as i32).min(pm.width());
    }

    for i in lo_i..hi_i {
        for j in lo_j..hi_j {
            if (j as f64) < bbox.x0
                || (j as f64) > bbox.x1
                || (i as f64) < bbox.y0
                || (i as f64) > bbox.y1
            {
                let dst = pm.at(i, j);
                *pm.at_mut(i, j) = compose(Color::TRANSPARENT, dst, 0, op);
                continue;
            }

            let ri = (i - bbox.y0 as i32).clamp(0, rendered.height() - 1);
            let rj = (j - bbox.x0 as i32).clamp(0, rendered.width() - 1);
            let fill = rendered.at(ri, rj);

            let mut draw_alpha = fill.a as f64;
            if let Some(mask) = clip {
                draw_alpha *= (255 - mask.at(i, j).a as i32) as f64;
                draw_alpha /= 255.0;
            }

            let dst = pm.at(i, j);
            *pm.at_mut(i, j) = compose(fill, dst, (draw_alpha * global_alpha) as i32, op);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_at(x: f64, y: f64, w: f64, h: f64) -> Polygon {
        let mut p = Polygon::new();
        p.add_point(Point::new(x, y));
        p.add_point(Point::new(x + w, y));
        p.add_point(Point::new(x + w, y + h));
        p.add_point(Point::new(x, y + h));
        p.end_subpoly(true);
        p
    }

    fn fill_params() -> (DrawStyle, Shadow) {
        (DrawStyle::Solid(Color::rgb8(255, 0, 0)), Shadow::NONE)
    }

    #[test]
    fn full_pixel_coverage_is_opaque() {
        let poly = unit_square_at(1.0, 1.0, 2.0, 2.0);
        let mut pm = Pixmap::new(4, 4).unwrap();
        let (style, shadow) = fill_params();
        render(
            &mut pm,
            &poly,
            Rect::new(1.0, 1.0, 3.0, 3.0),
            &style,
            1.0,
            shadow,
            CompositeOp::SourceOver,
            None,
            FillRule::NonZero,
            Affine::IDENTITY,
        );
        assert_eq!(pm.at(1, 1), Color::rgb8(255, 0, 0));
        assert_eq!(pm.at(2, 2), Color::rgb8(255, 0, 0));
        assert_eq!(pm.at(0, 0), Color::TRANSPARENT);
        assert_eq!(pm.at(3, 3), Color::TRANSPARENT);
    }

    #[test]
    fn half_pixel_coverage_is_half_alpha() {
        let poly = unit_square_at(0.0, 0.0, 0.5, 1.0);
        let mut pm = Pixmap::new(1, 1).unwrap();
        let (style, shadow) = fill_params();
        render(
            &mut pm,
            &poly,
            Rect::new(0.0, 0.0, 0.5, 1.0),
            &style,
            1.0,
            shadow,
            CompositeOp::SourceOver,
            None,
            FillRule::NonZero,
            Affine::IDENTITY,
        );
        let a = pm.at(0, 0).a as i32;
        assert!((a - 127).abs() <= 2, "alpha {a}");
    }

    #[test]
    fn winding_rules_differ_on_self_overlap() {
        // Two overlapping rings wound the same way: non-zero fills the
        // intersection, even-odd punches it out.
        let mut poly = unit_square_at(0.0, 0.0, 3.0, 3.0);
        let inner = unit_square_at(1.0, 1.0, 3.0, 3.0);
        for k in 0..inner.subpoly_count() {
            let (f, l) = inner.subpoly_range(k);
            for i in f..=l {
                poly.add_point(inner.points()[i]);
            }
            poly.end_subpoly(true);
        }
        let bbox = Rect::new(0.0, 0.0, 4.0, 4.0);
        let (style, shadow) = fill_params();

        let mut nz = Pixmap::new(4, 4).unwrap();
        render(
            &mut nz,
            &poly,
            bbox,
            &style,
            1.0,
            shadow,
            CompositeOp::SourceOver,
            None,
            FillRule::NonZero,
            Affine::IDENTITY,
        );
        assert_eq!(nz.at(1, 1).a, 255);

        let mut eo = Pixmap::new(4, 4).unwrap();
        render(
            &mut eo,
            &poly,
            bbox,
            &style,
            1.0,
            shadow,
            CompositeOp::SourceOver,
            None,
            FillRule::EvenOdd,
            Affine::IDENTITY,
        );
        assert_eq!(eo.at(1, 1).a, 0);
        assert_eq!(eo.at(0, 0).a, 255);
    }

    #[test]
    fn clip_mask_suppresses_coverage() {
        let poly = unit_square_at(0.0, 0.0, 2.0, 2.0);
        // A mask that blocks everything.
        let mask = Pixmap::from_data(2, 2, vec![Color::rgba8(0, 0, 0, 255); 4]).unwrap();
        let mut pm = Pixmap::new(2, 2).unwrap();
        let (style, shadow) = fill_params();
        render(
            &mut pm,
            &poly,
            Rect::new(0.0, 0.0, 2.0, 2.0),
            &style,
            1.0,
            shadow,
            CompositeOp::SourceOver,
            Some(&mask),
            FillRule::NonZero,
            Affine::IDENTITY,
        );
        assert!(pm.data().iter().all(|c| c.a == 0));
    }

    #[test]
    fn shadow_offsets_a_copy() {
        let poly = unit_square_at(2.0, 2.0, 3.0, 3.0);
        let mut pm = Pixmap::new(16, 16).unwrap();
        let (style, _) = fill_params();
        let shadow = Shadow {
            color: Color::rgb8(0, 0, 0),
            offset_x: 6.0,
            offset_y: 6.0,
            blur: 0.0,
        };
        render(
            &mut pm,
            &poly,
            Rect::new(2.0, 2.0, 5.0, 5.0),
            &style,
            1.0,
            shadow,
            CompositeOp::SourceOver,
            None,
            FillRule::NonZero,
            Affine::IDENTITY,
        );
        // Shape in place, black copy at +6/+6.
        assert_eq!(pm.at(3, 3), Color::rgb8(255, 0, 0));
        assert_eq!(pm.at(9, 9), Color::rgb8(0, 0, 0));
        assert_eq!(pm.at(14, 14).a, 0);
    }

    #[test]
    fn copy_op_visits_whole_surface() {
        let poly = unit_square_at(0.0, 0.0, 1.0, 1.0);
        let mut pm =
            Pixmap::from_data(3, 3, vec![Color::rgb8(0, 0, 255); 9]).unwrap();
        let (style, shadow) = fill_params();
        render(
            &mut pm,
            &poly,
            Rect::new(0.0, 0.0, 1.0, 1.0),
            &style,
            1.0,
            shadow,
            CompositeOp::Copy,
            None,
            FillRule::NonZero,
            Affine::IDENTITY,
        );
        assert_eq!(pm.at(0, 0), Color::rgb8(255, 0, 0));
        // Copy is full-screen: pixels outside the shape become transparent.
        assert_eq!(pm.at(2, 2), Color::TRANSPARENT);
    }
}
