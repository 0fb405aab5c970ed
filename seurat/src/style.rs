// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Draw styles: what fills and strokes are painted with.

use std::rc::Rc;

use kurbo::Affine;

use crate::color::Color;
use crate::gradient::Gradient;
use crate::pattern::Pattern;

/// The paint source for a fill or stroke.
///
/// Gradients and patterns are shared by reference count; cloning a style
/// retains the referenced object. The engine is single-threaded (see the
/// crate docs), so plain `Rc` is used.
#[derive(Clone, Debug)]
pub enum DrawStyle {
    Solid(Color),
    Gradient(Rc<Gradient>),
    Pattern(Rc<Pattern>),
}

impl DrawStyle {
    /// The style's color if solid, transparent black otherwise.
    pub fn as_color(&self) -> Color {
        match self {
            DrawStyle::Solid(c) => *c,
            _ => Color::TRANSPARENT,
        }
    }

    /// Evaluate the style at device position (`x`, `y`).
    ///
    /// `inverse` is the inverse of the transform the geometry was drawn
    /// under; solid colors ignore it.
    pub(crate) fn evaluate(&self, x: f64, y: f64, inverse: Affine) -> Color {
        match self {
            DrawStyle::Solid(c) => *c,
            DrawStyle::Gradient(g) => g.evaluate_at(x, y, inverse),
            DrawStyle::Pattern(p) => p.evaluate_at(x, y, inverse),
        }
    }
}

impl From<Color> for DrawStyle {
    fn from(c: Color) -> DrawStyle {
        DrawStyle::Solid(c)
    }
}

impl From<Rc<Gradient>> for DrawStyle {
    fn from(g: Rc<Gradient>) -> DrawStyle {
        DrawStyle::Gradient(g)
    }
}

impl From<Rc<Pattern>> for DrawStyle {
    fn from(p: Rc<Pattern>) -> DrawStyle {
        DrawStyle::Pattern(p)
    }
}
