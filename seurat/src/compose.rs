// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel-level composite operations.
//!
//! Each operator combines an evaluated source color with the destination
//! pixel under a `draw_alpha` in `[0, 255]`, the product of rasterizer
//! coverage, global alpha, and source alpha. The Porter-Duff operators use
//! the standard formulas; the blend modes compute a per-channel blend and
//! then composite the blended color over the destination.

use crate::color::{alpha_blend, Color};

/// A composite operation, selected via the drawing state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompositeOp {
    SourceOver,
    SourceIn,
    SourceOut,
    SourceAtop,
    DestinationOver,
    DestinationIn,
    DestinationOut,
    DestinationAtop,
    Lighter,
    Copy,
    Xor,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    /// Internal operator used when building clip and shadow mattes.
    OneMinusSrc,
}

impl CompositeOp {
    /// Whether the operator's output depends on pixels outside the
    /// drawing's bounding box, forcing the rasterizer to visit the whole
    /// surface.
    pub fn is_full_screen(self) -> bool {
        matches!(
            self,
            CompositeOp::SourceIn
                | CompositeOp::SourceOut
                | CompositeOp::DestinationIn
                | CompositeOp::DestinationAtop
                | CompositeOp::Copy
                | CompositeOp::OneMinusSrc
        )
    }
}

fn source_over(src: Color, dst: Color, draw_alpha: i32) -> Color {
    if draw_alpha == 255 {
        return src;
    }
    let alpha = draw_alpha + dst.a as i32 - (draw_alpha * dst.a as i32) / 255;
    let mut out = alpha_blend(draw_alpha as u8, dst, src);
    out.a = alpha as u8;
    out
}

fn scaled(c: Color, alpha: i32) -> Color {
    if alpha <= 0 {
        return Color::TRANSPARENT;
    }
    Color::rgba8(
        (alpha * c.r as i32 / 255) as u8,
        (alpha * c.g as i32 / 255) as u8,
        (alpha * c.b as i32 / 255) as u8,
        alpha as u8,
    )
}

fn source_in(src: Color, dst: Color, draw_alpha: i32) -> Color {
    scaled(src, dst.a as i32 * draw_alpha / 255)
}

fn source_out(src: Color, dst: Color, draw_alpha: i32) -> Color {
    scaled(src, (255 - dst.a as i32) * draw_alpha / 255)
}

fn source_atop(src: Color, dst: Color, draw_alpha: i32) -> Color {
    let src_alpha = draw_alpha * dst.a as i32 / 255;
    let dst_alpha = (255 - draw_alpha) * dst.a as i32 / 255;
    Color::rgba8(
        ((dst_alpha * dst.r as i32 + src_alpha * src.r as i32) / 255) as u8,
        ((dst_alpha * dst.g as i32 + src_alpha * src.g as i32) / 255) as u8,
        ((dst_alpha * dst.b as i32 + src_alpha * src.b as i32) / 255) as u8,
        dst.a,
    )
}

fn destination_over(src: Color, dst: Color, draw_alpha: i32) -> Color {
    source_over(src, dst, draw_alpha * (255 - dst.a as i32) / 255)
}

fn destination_in(_src: Color, dst: Color, draw_alpha: i32) -> Color {
    scaled(dst, dst.a as i32 * draw_alpha / 255)
}

fn destination_out(_src: Color, dst: Color, draw_alpha: i32) -> Color {
    scaled(dst, dst.a as i32 * (255 - draw_alpha) / 255)
}

fn destination_atop(src: Color, dst: Color, draw_alpha: i32) -> Color {
    let src_alpha = draw_alpha * (255 - dst.a as i32) / 255;
    let dst_alpha = draw_alpha * dst.a as i32 / 255;
    Color::rgba8(
        ((dst_alpha * dst.r as i32 + src_alpha * src.r as i32) / 255) as u8,
        ((dst_alpha * dst.g as i32 + src_alpha * src.g as i32) / 255) as u8,
        ((dst_alpha * dst.b as i32 + src_alpha * src.b as i32) / 255) as u8,
        draw_alpha as u8,
    )
}

fn lighter(src: Color, dst: Color, draw_alpha: i32) -> Color {
    Color::rgba8(
        (src.r as i32 + dst.r as i32).min(255) as u8,
        (src.g as i32 + dst.g as i32).min(255) as u8,
        (src.b as i32 + dst.b as i32).min(255) as u8,
        (draw_alpha + dst.a as i32).min(255) as u8,
    )
}

fn copy(src: Color, _dst: Color, draw_alpha: i32) -> Color {
    if draw_alpha == 0 {
        Color::TRANSPARENT
    } else {
        src
    }
}

fn xor(src: Color, dst: Color, draw_alpha: i32) -> Color {
    let src_alpha = draw_alpha * (255 - dst.a as i32) / 255;
    let dst_alpha = (255 - draw_alpha) * dst.a as i32 / 255;
    Color::rgba8(
        ((dst_alpha * dst.r as i32 + src_alpha * src.r as i32) / 255) as u8,
        ((dst_alpha * dst.g as i32 + src_alpha * src.g as i32) / 255) as u8,
        ((dst_alpha * dst.b as i32 + src_alpha * src.b as i32) / 255) as u8,
        (src_alpha + dst_alpha) as u8,
    )
}

fn one_minus_src(_src: Color, dst: Color, draw_alpha: i32) -> Color {
    alpha_blend(draw_alpha as u8, Color::WHITE, dst)
}

/// Apply a per-channel blend and composite the result over `dst`.
fn blend(src: Color, dst: Color, draw_alpha: i32, f: impl Fn(i32, i32) -> i32) -> Color {
    let blended = Color::rgba8(
        f(src.r as i32, dst.r as i32) as u8,
        f(src.g as i32, dst.g as i32) as u8,
        f(src.b as i32, dst.b as i32) as u8,
        src.a,
    );
    source_over(blended, dst, draw_alpha)
}

fn overlay_component(bottom: i32, top: i32) -> i32 {
    if bottom < 128 {
        2 * top * bottom / 255
    } else {
        255 - 2 * (255 - top) * (255 - bottom) / 255
    }
}

fn dodge_component(top: i32, bottom: i32) -> i32 {
    if bottom == 0 {
        0
    } else if top == 255 {
        255
    } else {
        (bottom * 255 / (255 - top)).min(255)
    }
}

fn burn_component(top: i32, bottom: i32) -> i32 {
    if bottom == 255 {
        255
    } else if top == 0 {
        0
    } else {
        255 - ((255 - bottom) * 255 / top).min(255)
    }
}

fn soft_light_component(top: i32, bottom: i32) -> i32 {
    if top < 128 {
        bottom - (255 - 2 * top) * bottom * (255 - bottom) / (255 * 255)
    } else {
        let d = if bottom < 64 {
            ((((16 * bottom - 12 * 255) * bottom) / 255 + 4 * 255) * bottom) / 255
        } else {
            (255.0 * (bottom as f64 / 255.0).sqrt()).round() as i32
        };
        bottom + (2 * top - 255) * (d - bottom) / 255
    }
}

fn lum(c: Color) -> f64 {
    0.3 * c.r as f64 / 255.0 + 0.59 * c.g as f64 / 255.0 + 0.11 * c.b as f64 / 255.0
}

/// Shift a color to the target luminance, clipping back into gamut while
/// preserving that luminance.
fn set_lum(c: Color, l: f64) -> Color {
    let d = ((l - lum(c)) * 255.0).round() as i32;
    let mut r = c.r as i32 + d;
    let mut g = c.g as i32 + d;
    let mut b = c.b as i32 + d;
    let n = r.min(g).min(b);
    let x = r.max(g).max(b);
    let il = (l * 255.0).round() as i32;

    if n < 0 {
        r = il + (r - il) * il / (il - n);
        g = il + (g - il) * il / (il - n);
        b = il + (b - il) * il / (il - n);
    }
    if x > 255 {
        r = il + (r - il) * (255 - il) / (x - il);
        g = il + (g - il) * (255 - il) / (x - il);
        b = il + (b - il) * (255 - il) / (x - il);
    }
    Color::rgba8(r as u8, g as u8, b as u8, c.a)
}

fn sat(c: Color) -> i32 {
    let n = c.r.min(c.g).min(c.b) as i32;
    let x = c.r.max(c.g).max(c.b) as i32;
    x - n
}

/// Set a color's saturation, keeping the channel order.
fn set_sat(c: Color, s: i32) -> Color {
    let mut ch = [c.r as i32, c.g as i32, c.b as i32];
    let mut order = [0usize, 1, 2];
    order.sort_by_key(|&i| ch[i]);
    let [min_i, mid_i, max_i] = order;
    if ch[max_i] > ch[min_i] {
        ch[mid_i] = (ch[mid_i] - ch[min_i]) * s / (ch[max_i] - ch[min_i]);
        ch[max_i] = s;
    } else {
        ch[mid_i] = 0;
        ch[max_i] = 0;
    }
    ch[min_i] = 0;
    Color::rgba8(ch[0] as u8, ch[1] as u8, ch[2] as u8, c.a)
}

fn non_separable(src: Color, dst: Color, draw_alpha: i32, op: CompositeOp) -> Color {
    let mut blended = match op {
        CompositeOp::Hue => set_lum(set_sat(src, sat(dst)), lum(dst)),
        CompositeOp::Saturation => set_lum(set_sat(dst, sat(src)), lum(dst)),
        CompositeOp::Color => set_lum(src, lum(dst)),
        CompositeOp::Luminosity => set_lum(dst, lum(src)),
        _ => unreachable!(),
    };
    blended.a = src.a;
    source_over(blended, dst, draw_alpha)
}

/// Composite `src` over `dst` with the given operator.
pub fn compose(src: Color, dst: Color, draw_alpha: i32, op: CompositeOp) -> Color {
    match op {
        CompositeOp::SourceOver => source_over(src, dst, draw_alpha),
        CompositeOp::SourceIn => source_in(src, dst, draw_alpha),
        CompositeOp::SourceOut => source_out(src, dst, draw_alpha),
        CompositeOp::SourceAtop => source_atop(src, dst, draw_alpha),
        CompositeOp::DestinationOver => destination_over(src, dst, draw_alpha),
        CompositeOp::DestinationIn => destination_in(src, dst, draw_alpha),
        CompositeOp::DestinationOut => destination_out(src, dst, draw_alpha),
        CompositeOp::DestinationAtop => destination_atop(src, dst, draw_alpha),
        CompositeOp::Lighter => lighter(src, dst, draw_alpha),
        CompositeOp::Copy => copy(src, dst, draw_alpha),
        CompositeOp::Xor => xor(src, dst, draw_alpha),
        CompositeOp::Multiply => blend(src, dst, draw_alpha, |s, d| s * d / 255),
        CompositeOp::Screen => blend(src, dst, draw_alpha, |s, d| {
            255 - (255 - s) * (255 - d) / 255
        }),
        CompositeOp::Overlay => blend(src, dst, draw_alpha, |s, d| overlay_component(d, s)),
        CompositeOp::Darken => blend(src, dst, draw_alpha, |s, d| s.min(d)),
        CompositeOp::Lighten => blend(src, dst, draw_alpha, |s, d| s.max(d)),
        CompositeOp::ColorDodge => blend(src, dst, draw_alpha, |s, d| dodge_component(d, s)),
        CompositeOp::ColorBurn => blend(src, dst, draw_alpha, |s, d| burn_component(d, s)),
        CompositeOp::HardLight => blend(src, dst, draw_alpha, |s, d| overlay_component(s, d)),
        CompositeOp::SoftLight => blend(src, dst, draw_alpha, |s, d| soft_light_component(s, d)),
        CompositeOp::Difference => blend(src, dst, draw_alpha, |s, d| (s - d).abs()),
        CompositeOp::Exclusion => blend(src, dst, draw_alpha, |s, d| s + d - 2 * s * d / 255),
        CompositeOp::Hue
        | CompositeOp::Saturation
        | CompositeOp::Color
        | CompositeOp::Luminosity => non_separable(src, dst, draw_alpha, op),
        CompositeOp::OneMinusSrc => one_minus_src(src, dst, draw_alpha),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb8(255, 0, 0);
    const BLUE: Color = Color::rgb8(0, 0, 255);

    #[test]
    fn source_over_with_zero_alpha_is_identity() {
        assert_eq!(compose(RED, BLUE, 0, CompositeOp::SourceOver), BLUE);
    }

    #[test]
    fn source_over_with_full_alpha_is_source() {
        assert_eq!(compose(RED, BLUE, 255, CompositeOp::SourceOver), RED);
    }

    #[test]
    fn copy_with_full_coverage_is_source_exactly() {
        let src = Color::rgba8(12, 34, 56, 78);
        assert_eq!(compose(src, BLUE, 255, CompositeOp::Copy), src);
        assert_eq!(compose(src, BLUE, 0, CompositeOp::Copy), Color::TRANSPARENT);
    }

    #[test]
    fn destination_over_opaque_destination_unchanged() {
        assert_eq!(compose(RED, BLUE, 255, CompositeOp::DestinationOver), BLUE);
    }

    #[test]
    fn lighter_saturates() {
        let c = compose(RED, RED, 255, CompositeOp::Lighter);
        assert_eq!(c.r, 255);
        assert_eq!(c.a, 255);
    }

    #[test]
    fn xor_of_opaque_pixels_is_transparent() {
        let c = compose(RED, BLUE, 255, CompositeOp::Xor);
        assert_eq!(c.a, 0);
    }

    #[test]
    fn multiply_with_white_is_identity_on_color() {
        let c = compose(Color::WHITE, BLUE, 255, CompositeOp::Multiply);
        assert_eq!((c.r, c.g, c.b), (0, 0, 255));
    }

    #[test]
    fn screen_with_black_is_identity_on_color() {
        let c = compose(Color::BLACK, BLUE, 255, CompositeOp::Screen);
        assert_eq!((c.r, c.g, c.b), (0, 0, 255));
    }

    #[test]
    fn difference_of_equal_colors_is_black() {
        let c = compose(BLUE, BLUE, 255, CompositeOp::Difference);
        assert_eq!((c.r, c.g, c.b), (0, 0, 0));
    }

    #[test]
    fn soft_light_uses_floating_point_sqrt() {
        // With bottom = 200 and a bright top, the W3C formula gives
        // d = 255·√(200/255) ≈ 226; the result must exceed the bottom.
        let c = soft_light_component(255, 200);
        assert!(c > 200 && c <= 255, "got {c}");
    }

    #[test]
    fn luminosity_preserves_destination_hue() {
        let c = compose(Color::rgb8(128, 128, 128), RED, 255, CompositeOp::Luminosity);
        // Result keeps red dominant.
        assert!(c.r >= c.g && c.r >= c.b);
    }

    #[test]
    fn full_screen_set_matches_contract() {
        use CompositeOp::*;
        let full = [SourceIn, SourceOut, DestinationIn, DestinationAtop, Copy, OneMinusSrc];
        for op in full {
            assert!(op.is_full_screen(), "{op:?}");
        }
        let partial = [
            SourceOver,
            SourceAtop,
            DestinationOver,
            DestinationOut,
            Lighter,
            Xor,
            Multiply,
            Screen,
            Overlay,
            Darken,
            Lighten,
            ColorDodge,
            ColorBurn,
            HardLight,
            SoftLight,
            Difference,
            Exclusion,
            Hue,
            Saturation,
            Color,
            Luminosity,
        ];
        for op in partial {
            assert!(!op.is_full_screen(), "{op:?}");
        }
    }
}
