// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The font-engine boundary.
//!
//! Text rendering is outsourced: given a font description, a transform, a
//! code point and a pen position, a [`FontEngine`] hands back a glyph
//! outline in device coordinates plus an advance vector. The canvas
//! rasterizes the outline exactly like any other polygon and moves the pen
//! by the advance; a missing glyph draws nothing and advances by zero.

use kurbo::{Affine, Point, Rect, Vec2};

use crate::polygon::Polygon;

/// Font slant styles.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FontSlant {
    #[default]
    Roman,
    Italic,
    Oblique,
}

/// A font selector: family, size, slant, and weight.
#[derive(Clone, PartialEq, Debug)]
pub struct FontDesc {
    pub family: String,
    pub size: f64,
    pub slant: FontSlant,
    pub weight: u16,
}

impl FontDesc {
    pub fn new(family: impl Into<String>, size: f64, slant: FontSlant, weight: u16) -> FontDesc {
        FontDesc {
            family: family.into(),
            size,
            slant,
            weight,
        }
    }
}

impl Default for FontDesc {
    fn default() -> FontDesc {
        FontDesc {
            family: String::new(),
            size: 12.0,
            slant: FontSlant::Roman,
            weight: 400,
        }
    }
}

/// One glyph, ready to rasterize.
pub struct Glyph {
    /// The outline, already transformed and translated to the pen.
    pub polygon: Polygon,
    /// Device-space bounding box of the outline.
    pub bbox: Rect,
    /// How far to move the pen for the next glyph.
    pub advance: Vec2,
}

/// Supplier of glyph outlines.
///
/// Implementations own font loading and caching; the engine calls
/// [`glyph`](FontEngine::glyph) once per code point. Returning `None`
/// (missing glyph, unloadable font) makes the canvas skip the character.
pub trait FontEngine {
    fn glyph(&mut self, font: &FontDesc, transform: Affine, codepoint: char, pen: Point)
        -> Option<Glyph>;
}
