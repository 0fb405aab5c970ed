// Copyright 2025 the Seurat Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tessellation output: flat vertex lists grouped into subpolygons.

use kurbo::Point;

/// A set of subpolygons sharing one flat vertex array.
///
/// `ends[k]` is the index of the last vertex of subpolygon `k` (inclusive);
/// `closed[k]` records whether that subpolygon was explicitly closed. The
/// rasterizer treats every subpolygon as a ring regardless of the flag; the
/// stroker uses it to decide between joins and caps.
#[derive(Clone, Debug, Default)]
pub struct Polygon {
    points: Vec<Point>,
    ends: Vec<usize>,
    closed: Vec<bool>,
}

impl Polygon {
    pub fn new() -> Polygon {
        Polygon::default()
    }

    /// Drop all vertices and subpolygons, keeping allocations.
    pub fn clear(&mut self) {
        self.points.clear();
        self.ends.clear();
        self.closed.clear();
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Point] {
        &mut self.points
    }

    pub fn subpoly_count(&self) -> usize {
        self.ends.len()
    }

    /// The inclusive (first, last) vertex indices of subpolygon `k`.
    pub fn subpoly_range(&self, k: usize) -> (usize, usize) {
        let first = if k == 0 { 0 } else { self.ends[k - 1] + 1 };
        (first, self.ends[k])
    }

    pub fn is_closed(&self, k: usize) -> bool {
        self.closed[k]
    }

    fn open_len(&self) -> usize {
        match self.ends.last() {
            None => self.points.len(),
            Some(&e) => self.points.len() - 1 - e,
        }
    }

    /// Append a vertex to the open subpolygon, dropping exact duplicates of
    /// the preceding vertex.
    pub fn add_point(&mut self, pt: Point) {
        if self.open_len() == 0 || *self.points.last().unwrap() != pt {
            self.points.push(pt);
        }
    }

    /// Finish the open subpolygon.
    ///
    /// Closing appends the first vertex again if needed so the ring is
    /// explicit. Subpolygons with fewer than two vertices are dropped.
    pub fn end_subpoly(&mut self, close: bool) {
        let n = self.open_len();
        if n > 1 {
            let first = match self.ends.last() {
                None => self.points[0],
                Some(&e) => self.points[e + 1],
            };
            if close && *self.points.last().unwrap() != first {
                self.add_point(first);
            }
            self.ends.push(self.points.len() - 1);
            self.closed.push(close);
        } else if n == 1 {
            self.points.pop();
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
    fn close_repeats_first_point() {
        let mut poly = Polygon::new();
        poly.add_point(p(0.0, 0.0));
        poly.add_point(p(4.0, 0.0));
        poly.add_point(p(4.0, 4.0));
        poly.end_subpoly(true);
        assert_eq!(poly.subpoly_count(), 1);
        let (first, last) = poly.subpoly_range(0);
        assert_eq!((first, last), (0, 3));
        assert_eq!(poly.points()[last], poly.points()[first]);
        assert!(poly.is_closed(0));
    }

    #[test]
    fn single_point_subpoly_is_dropped() {
        let mut poly = Polygon::new();
        poly.add_point(p(1.0, 1.0));
        poly.end_subpoly(false);
        assert_eq!(poly.subpoly_count(), 0);
        assert!(poly.points().is_empty());
    }

    #[test]
    fn duplicate_points_are_merged() {
        let mut poly = Polygon::new();
        poly.add_point(p(1.0, 1.0));
        poly.add_point(p(1.0, 1.0));
        poly.add_point(p(2.0, 1.0));
        poly.end_subpoly(false);
        let (first, last) = poly.subpoly_range(0);
        assert_eq!(last - first + 1, 2);
    }

    #[test]
    fn second_subpoly_indices() {
        let mut poly = Polygon::new();
        poly.add_point(p(0.0, 0.0));
        poly.add_point(p(1.0, 0.0));
        poly.end_subpoly(false);
        poly.add_point(p(5.0, 5.0));
        poly.add_point(p(6.0, 5.0));
        poly.add_point(p(6.0, 6.0));
        poly.end_subpoly(false);
        assert_eq!(poly.subpoly_range(1), (2, 4));
    }
}
