// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The graphics state: everything save/restore round-trips.

use std::rc::Rc;

use kurbo::Affine;

use crate::color::Color;
use crate::compose::CompositeOp;
use crate::font::FontDesc;
use crate::polygon::Polygon;
use crate::style::DrawStyle;

/// A fill rule for resolving winding numbers.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FillRule {
    /// Fill everything with a non-zero winding number.
    NonZero,
    /// Fill everything with an odd crossing count.
    EvenOdd,
}

/// Options for angled joins in strokes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineJoin {
    /// Joined by a circular arc around the vertex.
    Round,
    /// The outer edges are extended until they intersect, falling back to
    /// bevel past the miter limit.
    Miter,
    /// The notch between the edges is left flat.
    Bevel,
}

/// Options for the ends of open stroked subpaths.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineCap {
    /// Squared off at the endpoint.
    Butt,
    /// Extended by half the line width, then squared off.
    Square,
    /// A semicircular arc around the endpoint.
    Round,
}

/// Shadow parameters.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Shadow {
    pub color: Color,
    pub offset_x: f64,
    pub offset_y: f64,
    pub blur: f64,
}

impl Shadow {
    pub const NONE: Shadow = Shadow {
        color: Color::TRANSPARENT,
        offset_x: 0.0,
        offset_y: 0.0,
        blur: 0.0,
    };

    /// Whether these settings produce a visible shadow.
    pub fn is_visible(&self) -> bool {
        (self.blur > 0.0 || self.offset_x != 0.0 || self.offset_y != 0.0) && self.color.a != 0
    }
}

/// One accumulated clip instruction: a device-space polygon and the rule it
/// fills under.
#[derive(Clone, Debug)]
pub(crate) struct ClipFill {
    pub poly: Rc<Polygon>,
    pub rule: FillRule,
}

/// The drawing state a canvas saves and restores.
///
/// Cloning is the deep copy `save` needs: the dash array is duplicated,
/// draw-style and clip-polygon references are retained.
#[derive(Clone, Debug)]
pub(crate) struct DrawState {
    pub transform: Affine,
    pub font: FontDesc,
    pub clip_path: Vec<ClipFill>,
    pub line_dash: Vec<f64>,
    pub line_dash_offset: f64,
    pub line_width: f64,
    pub global_alpha: f64,
    pub fill_style: DrawStyle,
    pub stroke_style: DrawStyle,
    pub shadow: Shadow,
    pub composite_op: CompositeOp,
    pub line_join: LineJoin,
    pub line_cap: LineCap,
    pub miter_limit: f64,
}

impl DrawState {
    pub fn new() -> DrawState {
        DrawState {
            transform: Affine::IDENTITY,
            font: FontDesc::default(),
            clip_path: Vec::new(),
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
            line_width: 1.0,
            global_alpha: 1.0,
            fill_style: DrawStyle::Solid(Color::WHITE),
            stroke_style: DrawStyle::Solid(Color::BLACK),
            shadow: Shadow::NONE,
            composite_op: CompositeOp::SourceOver,
            line_join: LineJoin::Round,
            line_cap: LineCap::Butt,
            miter_limit: 10.0,
        }
    }

    /// Reinitialize every field to its default.
    pub fn reset(&mut self) {
        *self = DrawState::new();
    }
}
