//! Collision shapes and the shape factory
//!
//! Shapes live in a local frame centered on the owning entity; the collider
//! carries the world position and angle separately.

use serde::{Deserialize, Serialize};

use crate::math::{CurvablePoint, Point, PolygonError, Vector, degrees_to_radians, flatten};

/// Closed set of shape definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Circle { radius: f64 },
    Ellipse { radius_x: f64, radius_y: f64 },
    /// Centered on the origin
    Rectangle { width: f64, height: f64 },
    Polygon { points: Vec<Point> },
    CurvablePolygon { points: Vec<CurvablePoint> },
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Circle { .. } => "circle",
            Shape::Ellipse { .. } => "ellipse",
            Shape::Rectangle { .. } => "rectangle",
            Shape::Polygon { .. } => "polygon",
            Shape::CurvablePolygon { .. } => "curvable_polygon",
        }
    }

    /// Straight-edged version of this shape; only curvable polygons change
    pub fn flattened(&self, steps_per_curve: usize) -> Result<Shape, PolygonError> {
        match self {
            Shape::CurvablePolygon { points } => Ok(Shape::Polygon {
                points: flatten(points, steps_per_curve)?,
            }),
            other => Ok(other.clone()),
        }
    }

    pub fn rectangle(width: f64, height: f64, scale: f64) -> Self {
        Shape::Rectangle {
            width: width * scale,
            height: height * scale,
        }
    }

    pub fn circle(radius: f64, scale: f64) -> Self {
        Shape::Circle {
            radius: radius * scale,
        }
    }

    pub fn ellipse(radius_x: f64, radius_y: f64, scale: f64) -> Self {
        Shape::Ellipse {
            radius_x: radius_x * scale,
            radius_y: radius_y * scale,
        }
    }

    pub fn polygon(points: &[Point], scale: f64) -> Self {
        Shape::Polygon {
            points: points
                .iter()
                .map(|p| Point::new(p.x * scale, p.y * scale))
                .collect(),
        }
    }

    pub fn curvable_polygon(points: &[CurvablePoint], scale: f64) -> Self {
        Shape::CurvablePolygon {
            points: points
                .iter()
                .map(|p| CurvablePoint {
                    x: p.x * scale,
                    y: p.y * scale,
                    control: p.control,
                })
                .collect(),
        }
    }

    /// Regular polygon with `corners` vertices on a circle of `radius`
    pub fn regular_polygon(corners: usize, radius: f64, scale: f64) -> Result<Self, PolygonError> {
        if corners < 3 {
            return Err(PolygonError::TooFewPoints {
                min: 3,
                found: corners,
            });
        }

        Ok(Shape::polygon(&regular_outline(corners, radius), scale))
    }

    /// Star alternating between `radius` and `inner_radius`
    pub fn star(
        tips: usize,
        radius: f64,
        inner_radius: f64,
        scale: f64,
    ) -> Result<Self, PolygonError> {
        if tips < 3 {
            return Err(PolygonError::TooFewPoints {
                min: 3,
                found: tips,
            });
        }

        Ok(Shape::polygon(&star_outline(tips, radius, inner_radius), scale))
    }

    pub fn preset(preset: ShapePreset, scale: f64) -> Self {
        let polygon = |corners| Shape::polygon(&regular_outline(corners, 50.0), scale);
        match preset {
            ShapePreset::Circle => Shape::circle(40.0, scale),
            ShapePreset::Square => Shape::rectangle(75.0, 75.0, scale),
            ShapePreset::Star => Shape::polygon(&star_outline(5, 50.0, 25.0), scale),
            ShapePreset::Triangle => polygon(3),
            ShapePreset::Pentagon => polygon(5),
            ShapePreset::Hexagon => polygon(6),
            ShapePreset::Heptagon => polygon(7),
            ShapePreset::Octagon => polygon(8),
        }
    }
}

/// Vertices of a regular polygon, starting opposite the up direction
fn regular_outline(corners: usize, radius: f64) -> Vec<Point> {
    let step = 360.0 / corners as f64;
    (1..=corners)
        .map(|i| outline_point(step * i as f64 + 180.0, radius))
        .collect()
}

fn star_outline(tips: usize, radius: f64, inner_radius: f64) -> Vec<Point> {
    let steps = tips * 2;
    let step = 360.0 / steps as f64;
    (1..=steps)
        .map(|i| {
            let distance = if i % 2 == 0 { inner_radius } else { radius };
            outline_point(step * i as f64, distance)
        })
        .collect()
}

fn outline_point(degrees: f64, distance: f64) -> Point {
    let direction = Vector::from_angle(degrees_to_radians(degrees));
    // from_angle is always 2D
    let (x, y) = (direction.x(), direction.y().unwrap_or_default());
    Point::new(x * distance, y * distance)
}

/// Named shapes used by level data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapePreset {
    Circle,
    Square,
    Triangle,
    Pentagon,
    Hexagon,
    Heptagon,
    Octagon,
    Star,
}

impl ShapePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapePreset::Circle => "circle",
            ShapePreset::Square => "square",
            ShapePreset::Triangle => "triangle",
            ShapePreset::Pentagon => "pentagon",
            ShapePreset::Hexagon => "hexagon",
            ShapePreset::Heptagon => "heptagon",
            ShapePreset::Octagon => "octagon",
            ShapePreset::Star => "star",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "circle" => Some(ShapePreset::Circle),
            "square" => Some(ShapePreset::Square),
            "triangle" => Some(ShapePreset::Triangle),
            "pentagon" => Some(ShapePreset::Pentagon),
            "hexagon" => Some(ShapePreset::Hexagon),
            "heptagon" => Some(ShapePreset::Heptagon),
            "octagon" => Some(ShapePreset::Octagon),
            "star" => Some(ShapePreset::Star),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_json() {
        let json = r#"{"type":"ellipse","radius_x":30.0,"radius_y":80.0}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert_eq!(shape, Shape::ellipse(30.0, 80.0, 1.0));

        let json = r#"{"type":"curvable_polygon","points":[{"x":0,"y":0},{"x":5,"y":5,"control":true},{"x":10,"y":0}]}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        match shape {
            Shape::CurvablePolygon { points } => {
                assert!(!points[0].control);
                assert!(points[1].control);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_flattened_only_touches_curvable() {
        let circle = Shape::circle(10.0, 1.0);
        assert_eq!(circle.flattened(10).unwrap(), circle);

        let curved = Shape::curvable_polygon(
            &[
                CurvablePoint::anchor(0.0, 0.0),
                CurvablePoint::control(5.0, 5.0),
                CurvablePoint::anchor(10.0, 0.0),
            ],
            1.0,
        );
        match curved.flattened(4).unwrap() {
            Shape::Polygon { points } => assert_eq!(points.len(), 1 + 5),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn test_regular_polygon() {
        let Shape::Polygon { points } = Shape::regular_polygon(6, 50.0, 2.0).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(points.len(), 6);
        for p in &points {
            assert!(((p.x * p.x + p.y * p.y).sqrt() - 100.0).abs() < 1e-9);
        }
        assert!(Shape::regular_polygon(2, 50.0, 1.0).is_err());
    }

    #[test]
    fn test_star_alternates_radius() {
        let Shape::Polygon { points } = Shape::star(5, 50.0, 25.0, 1.0).unwrap() else {
            panic!("expected polygon");
        };
        assert_eq!(points.len(), 10);
        let radius = |p: &Point| (p.x * p.x + p.y * p.y).sqrt();
        assert!((radius(&points[0]) - 50.0).abs() < 1e-9);
        assert!((radius(&points[1]) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_presets() {
        assert_eq!(ShapePreset::from_str("Octagon"), Some(ShapePreset::Octagon));
        assert_eq!(ShapePreset::from_str("blob"), None);
        match Shape::preset(ShapePreset::Octagon, 1.0) {
            Shape::Polygon { points } => assert_eq!(points.len(), 8),
            other => panic!("expected polygon, got {other:?}"),
        }
        assert_eq!(Shape::preset(ShapePreset::Square, 2.0), Shape::rectangle(150.0, 150.0, 1.0));
    }

    #[test]
    fn test_polygon_presets_match_constructors() {
        let cases = [
            (ShapePreset::Triangle, 3),
            (ShapePreset::Pentagon, 5),
            (ShapePreset::Hexagon, 6),
            (ShapePreset::Heptagon, 7),
            (ShapePreset::Octagon, 8),
        ];
        for (preset, corners) in cases {
            assert_eq!(
                Shape::preset(preset, 1.5),
                Shape::regular_polygon(corners, 50.0, 1.5).unwrap(),
                "{}",
                preset.as_str()
            );
        }
        assert_eq!(
            Shape::preset(ShapePreset::Star, 1.5),
            Shape::star(5, 50.0, 25.0, 1.5).unwrap()
        );
        assert_eq!(Shape::preset(ShapePreset::Circle, 1.5), Shape::circle(40.0, 1.5));
    }
}
