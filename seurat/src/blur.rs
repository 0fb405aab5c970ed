// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gaussian blur of the alpha channel, used for shadow mattes.
//!
//! A Gaussian of standard deviation σ is approximated by three successive
//! box blurs whose widths are chosen per
//! <https://blog.ivank.net/fastest-gaussian-blur.html>. Each box is a
//! separable running-sum pass, horizontal then vertical, touching only the
//! alpha component.

use crate::pixmap::Pixmap;

const PASSES: i32 = 3;

/// The box widths approximating a Gaussian of standard deviation `s`.
fn blur_boxes(s: f64) -> [i32; PASSES as usize] {
    let n = PASSES;
    let w_ideal = ((12.0 * s * s) / n as f64 + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i32;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wu = wl + 2;
    let m_ideal =
        (12.0 * s * s - (n * wl * wl + 4 * n * wl + 3 * n) as f64) / (-4 * wl - 4) as f64;
    let m = m_ideal.floor() as i32;

    let mut boxes = [0; PASSES as usize];
    for (i, b) in boxes.iter_mut().enumerate() {
        *b = if (i as i32) < m { wl } else { wu };
    }
    boxes
}

fn box_h(dst: &mut Pixmap, src: &Pixmap, r: i32) {
    let w = src.width();
    let h = src.height();
    let iarr = 1.0 / (2 * r + 1) as f64;
    let s = src.data();
    let d = dst.data_mut();

    for i in 0..h {
        let row = (i * w) as usize;
        let (mut ti, mut li, mut ri) = (row, row, row + r as usize);
        let fv = s[row].a as i32;
        let lv = s[row + w as usize - 1].a as i32;
        let mut val = (r + 1) * fv;
        for j in 0..r {
            val += s[row + j as usize].a as i32;
        }
        for _ in 0..=r {
            val += s[ri].a as i32 - fv;
            ri += 1;
            d[ti].a = (val as f64 * iarr).round() as u8;
            ti += 1;
        }
        for _ in r + 1..w - r {
            val += s[ri].a as i32 - s[li].a as i32;
            ri += 1;
            li += 1;
            d[ti].a = (val as f64 * iarr).round() as u8;
            ti += 1;
        }
        for _ in w - r..w {
            val += lv - s[li].a as i32;
            li += 1;
            d[ti].a = (val as f64 * iarr).round() as u8;
            ti += 1;
        }
    }
}

fn box_v(dst: &mut Pixmap, src: &Pixmap, r: i32) {
    let w = src.width() as usize;
    let h = src.height();
    let iarr = 1.0 / (2 * r + 1) as f64;
    let s = src.data();
    let d = dst.data_mut();

    for i in 0..w {
        let (mut ti, mut li, mut ri) = (i, i, i + (r as usize) * w);
        let fv = s[i].a as i32;
        let lv = s[i + w * (h as usize - 1)].a as i32;
        let mut val = (r + 1) * fv;
        for j in 0..r {
            val += s[i + j as usize * w].a as i32;
        }
        for _ in 0..=r {
            val += s[ri].a as i32 - fv;
            d[ti].a = (val as f64 * iarr).round() as u8;
            ri += w;
            ti += w;
        }
        for _ in r + 1..h - r {
            val += s[ri].a as i32 - s[li].a as i32;
            d[ti].a = (val as f64 * iarr).round() as u8;
            li += w;
            ri += w;
            ti += w;
        }
        for _ in h - r..h {
            val += lv - s[li].a as i32;
            d[ti].a = (val as f64 * iarr).round() as u8;
            li += w;
            ti += w;
        }
    }
}

/// Blur the alpha channel of `src` with standard deviation `s`, leaving the
/// color channels untouched.
pub(crate) fn gaussian_blur_alpha(src: &Pixmap, s: f64) -> Pixmap {
    let mut out = src.clone();
    let mut scratch = src.clone();
    for b in blur_boxes(s) {
        let r = (b - 1) / 2;
        if r <= 0 || 2 * r + 1 > out.width().min(out.height()) {
            continue;
        }
        box_h(&mut scratch, &out, r);
        box_v(&mut out, &scratch, r);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn box_widths_are_odd_and_grow() {
        let boxes = blur_boxes(5.0);
        for b in boxes {
            assert_eq!(b % 2, 1);
        }
        assert!(boxes[0] <= boxes[2]);
        // For σ = 5 the ideal width is √(100 + 1) ≈ 10, so boxes are 9/11.
        assert!(boxes.contains(&9) || boxes.contains(&11));
    }

    #[test]
    fn uniform_field_is_unchanged() {
        let pm = Pixmap::from_data(8, 8, vec![Color::rgba8(0, 0, 0, 200); 64]).unwrap();
        let out = gaussian_blur_alpha(&pm, 1.5);
        assert!(out.data().iter().all(|c| c.a == 200));
    }

    #[test]
    fn point_spreads_and_dims() {
        let mut data = vec![Color::TRANSPARENT; 11 * 11];
        data[5 * 11 + 5] = Color::rgba8(0, 0, 0, 255);
        let pm = Pixmap::from_data(11, 11, data).unwrap();
        let out = gaussian_blur_alpha(&pm, 1.0);
        let center = out.data()[5 * 11 + 5].a;
        let near = out.data()[5 * 11 + 6].a;
        let far = out.data()[0].a;
        assert!(center < 255);
        assert!(center >= near);
        assert!(far <= near);
    }

    #[test]
    fn color_channels_are_untouched() {
        let pm = Pixmap::from_data(4, 4, vec![Color::rgba8(9, 8, 7, 100); 16]).unwrap();
        let out = gaussian_blur_alpha(&pm, 2.0);
        for c in out.data() {
            assert_eq!((c.r, c.g, c.b), (9, 8, 7));
        }
    }
}
