//! Bezier curve flattening
//!
//! A curvable polygon is a cyclic list of points where each point is either
//! an anchor (on the outline) or a control handle. Runs of one or two
//! control points between anchors describe cubic Bezier segments, which are
//! sampled with de Casteljau's algorithm into straight edges.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::vector::Point;

/// Default number of straight segments per curve
pub const DEFAULT_STEPS_PER_CURVE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolygonError {
    #[error("polygon has no points")]
    Empty,
    #[error("polygon has no anchor point")]
    NoAnchor,
    #[error("polygon needs at least {min} points, got {found}")]
    TooFewPoints { min: usize, found: usize },
}

/// Polygon vertex that may be a Bezier control handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvablePoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub control: bool,
}

impl CurvablePoint {
    pub fn anchor(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            control: false,
        }
    }

    pub fn control(x: f64, y: f64) -> Self {
        Self { x, y, control: true }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Evaluate the Bezier curve through `points` at `t` by repeated
/// linear interpolation
pub fn de_casteljau(points: &[Point], t: f64) -> Point {
    let mut current: Vec<Point> = points.to_vec();
    while current.len() > 1 {
        current = current
            .windows(2)
            .map(|pair| {
                let (a, b) = (pair[0], pair[1]);
                Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
            })
            .collect();
    }
    current.first().copied().unwrap_or_default()
}

/// Sample a cubic Bezier into `steps + 1` points, endpoints included verbatim
pub fn cubic_bezier_points(
    start: Point,
    control1: Point,
    control2: Point,
    end: Point,
    steps: usize,
) -> Vec<Point> {
    let curve = [start, control1, control2, end];
    let step = 1.0 / steps as f64;

    let mut points = Vec::with_capacity(steps + 1);
    points.push(start);
    let mut t = 0.0;
    for _ in 0..steps.saturating_sub(1) {
        t += step;
        points.push(de_casteljau(&curve, t));
    }
    points.push(end);
    points
}

/// Replace every Bezier run in a curvable polygon with straight edges
pub fn flatten(points: &[CurvablePoint], steps_per_curve: usize) -> Result<Vec<Point>, PolygonError> {
    if points.is_empty() {
        return Err(PolygonError::Empty);
    }
    let steps = steps_per_curve.max(1);

    // Start the walk on an anchor
    let start = points
        .iter()
        .position(|p| !p.control)
        .ok_or(PolygonError::NoAnchor)?;
    let first = points[start];
    let rest: Vec<CurvablePoint> = points[start + 1..]
        .iter()
        .chain(&points[..start])
        .copied()
        .collect();

    // Lookups past the end wrap to the first anchor
    let at = |i: usize| rest.get(i).copied().unwrap_or(first);

    let mut flattened = vec![first.point()];
    let mut i = 0;
    while i < rest.len() {
        let point = rest[i];
        let previous = if i == 0 { first } else { rest[i - 1] };
        let next = at(i + 1);

        if point.control && !next.control {
            flattened.extend(cubic_bezier_points(
                previous.point(),
                point.point(),
                point.point(),
                next.point(),
                steps,
            ));
            i += 2;
            continue;
        }

        let next2 = at(i + 2);
        if point.control && next.control && !next2.control {
            flattened.extend(cubic_bezier_points(
                previous.point(),
                point.point(),
                next.point(),
                next2.point(),
                steps,
            ));
            i += 3;
            continue;
        }

        flattened.push(point.point());
        i += 1;
    }

    Ok(flattened)
}
