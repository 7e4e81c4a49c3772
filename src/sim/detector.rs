//! Collision detector boundary
//!
//! The physics core never computes overlaps itself. It describes bodies to a
//! [`CollisionDetector`], keeps the returned [`BodyHandle`], and consumes the
//! [`OverlapPair`] records the detector reports once per frame.
//!
//! [`ParryDetector`] is the bundled brute-force implementation:
//! - every dynamic body is tested against every other body
//! - exact contacts come from `parry2d_f64::query::contact`
//! - concave polygons are split with a convex decomposition

use parry2d_f64::na::{Isometry2, Point2, Vector2};
use parry2d_f64::query;
use parry2d_f64::shape::SharedShape;
use slotmap::SlotMap;
use thiserror::Error;

use super::collider::ColliderId;
use super::shape::Shape;
use crate::math::{Point, Vector};

slotmap::new_key_type! {
    /// Handle to a body owned by a detector
    pub struct BodyHandle;
}

/// Approximate segment length used when sampling ellipse outlines
const ELLIPSE_STEP: f64 = 10.0;

/// Segments used when sampling a circle outline for containment tests
const CIRCLE_SEGMENTS: usize = 32;

/// Overlaps shallower than this are not reported
const MIN_PENETRATION: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    #[error("{kind} needs a positive {dimension}, got {value}")]
    InvalidDimension {
        kind: &'static str,
        dimension: &'static str,
        value: f64,
    },
    #[error("{kind} is degenerate: {reason}")]
    DegenerateShape { kind: &'static str, reason: String },
    #[error("{kind} must be flattened before it reaches the detector")]
    UnsupportedShape { kind: &'static str },
}

/// Shape geometry as the detector understands it
#[derive(Debug, Clone, PartialEq)]
pub enum BodyShape {
    Circle { radius: f64 },
    Ellipse { radius_x: f64, radius_y: f64 },
    /// Centered box
    Box { width: f64, height: f64 },
    Polygon { points: Vec<Point> },
}

impl BodyShape {
    /// Build detector geometry for an already flattened shape
    pub fn from_shape(shape: &Shape) -> Result<Self, DetectorError> {
        match shape {
            Shape::Circle { radius } => Ok(BodyShape::Circle { radius: *radius }),
            Shape::Ellipse { radius_x, radius_y } => Ok(BodyShape::Ellipse {
                radius_x: *radius_x,
                radius_y: *radius_y,
            }),
            Shape::Rectangle { width, height } => Ok(BodyShape::Box {
                width: *width,
                height: *height,
            }),
            Shape::Polygon { points } => Ok(BodyShape::Polygon {
                points: points.clone(),
            }),
            Shape::CurvablePolygon { .. } => Err(DetectorError::UnsupportedShape {
                kind: shape.kind(),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BodyShape::Circle { .. } => "circle",
            BodyShape::Ellipse { .. } => "ellipse",
            BodyShape::Box { .. } => "box",
            BodyShape::Polygon { .. } => "polygon",
        }
    }
}

/// Everything a detector needs to register a body
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDescriptor {
    pub shape: BodyShape,
    pub position: Point,
    /// Radians
    pub angle: f64,
    pub is_static: bool,
    /// Non-owning back-reference to the registering collider
    pub collider: ColliderId,
}

/// One overlapping pair as seen from body `a`
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub collider_a: ColliderId,
    pub collider_b: ColliderId,
    /// `a` lies entirely inside `b`
    pub a_in_b: bool,
    /// `b` lies entirely inside `a`
    pub b_in_a: bool,
    /// Penetration depth
    pub overlap: f64,
    /// Unit direction from `a` towards `b`
    pub overlap_normal: Vector,
    /// `overlap_normal * overlap`; subtracting it from `a` separates the pair
    pub overlap_vector: Vector,
}

impl OverlapPair {
    /// The same overlap as seen from `b`
    pub fn swapped(&self) -> Self {
        Self {
            a: self.b,
            b: self.a,
            collider_a: self.collider_b,
            collider_b: self.collider_a,
            a_in_b: self.b_in_a,
            b_in_a: self.a_in_b,
            overlap: self.overlap,
            overlap_normal: self.overlap_normal.opposite(),
            overlap_vector: self.overlap_vector.opposite(),
        }
    }
}

/// Broad and narrow phase collision detection
pub trait CollisionDetector {
    fn insert(&mut self, body: BodyDescriptor) -> Result<BodyHandle, DetectorError>;

    /// Returns false when the handle is unknown
    fn remove(&mut self, handle: BodyHandle) -> bool;

    fn set_position(&mut self, handle: BodyHandle, position: Point) -> bool;

    fn set_angle(&mut self, handle: BodyHandle, angle: f64) -> bool;

    fn contains(&self, handle: BodyHandle) -> bool;

    /// Report every overlapping pair, once from each side. A static body's
    /// side of a pair comes first.
    fn check_all(&self, callback: &mut dyn FnMut(&OverlapPair));

    /// Overlap of `a` with `b` at their current transforms, seen from `a`
    fn check_pair(&self, a: BodyHandle, b: BodyHandle) -> Option<OverlapPair>;
}

struct Body {
    shape: SharedShape,
    /// Local outline samples for containment tests
    outline: Vec<Point2<f64>>,
    position: Point,
    angle: f64,
    is_static: bool,
    collider: ColliderId,
}

impl Body {
    fn isometry(&self) -> Isometry2<f64> {
        Isometry2::new(Vector2::new(self.position.x, self.position.y), self.angle)
    }

    /// Every outline sample of `self` lies inside `other`
    fn is_inside(&self, other: &Body) -> bool {
        let own = self.isometry();
        let theirs = other.isometry();
        self.outline
            .iter()
            .all(|p| other.shape.contains_point(&theirs, &own.transform_point(p)))
    }
}

/// Brute-force detector backed by parry2d
#[derive(Default)]
pub struct ParryDetector {
    bodies: SlotMap<BodyHandle, Body>,
}

impl ParryDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn overlap(&self, a: BodyHandle, body_a: &Body, b: BodyHandle, body_b: &Body) -> Option<OverlapPair> {
        let iso_a = body_a.isometry();
        let iso_b = body_b.isometry();
        let contact = match query::contact(&iso_a, &*body_a.shape, &iso_b, &*body_b.shape, 0.0) {
            Ok(Some(contact)) => contact,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("Unsupported contact query between bodies: {err:?}");
                return None;
            }
        };

        let overlap = -contact.dist;
        if overlap < MIN_PENETRATION {
            return None;
        }

        let normal = Vector::new_2d(contact.normal1.x, contact.normal1.y);
        Some(OverlapPair {
            a,
            b,
            collider_a: body_a.collider,
            collider_b: body_b.collider,
            a_in_b: body_a.is_inside(body_b),
            b_in_a: body_b.is_inside(body_a),
            overlap,
            overlap_vector: normal.scale(overlap),
            overlap_normal: normal,
        })
    }
}

impl CollisionDetector for ParryDetector {
    fn insert(&mut self, body: BodyDescriptor) -> Result<BodyHandle, DetectorError> {
        let (shape, outline) = build_shape(&body.shape)?;
        let handle = self.bodies.insert(Body {
            shape,
            outline,
            position: body.position,
            angle: body.angle,
            is_static: body.is_static,
            collider: body.collider,
        });
        log::debug!(
            "Inserted {} body {handle:?} at ({}, {})",
            body.shape.kind(),
            body.position.x,
            body.position.y
        );
        Ok(handle)
    }

    fn remove(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(handle).is_some()
    }

    fn set_position(&mut self, handle: BodyHandle, position: Point) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.position = position;
                true
            }
            None => false,
        }
    }

    fn set_angle(&mut self, handle: BodyHandle, angle: f64) -> bool {
        match self.bodies.get_mut(handle) {
            Some(body) => {
                body.angle = angle;
                true
            }
            None => false,
        }
    }

    fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(handle)
    }

    fn check_all(&self, callback: &mut dyn FnMut(&OverlapPair)) {
        let bodies: Vec<(BodyHandle, &Body)> = self.bodies.iter().collect();
        for (i, &(a, body_a)) in bodies.iter().enumerate() {
            for &(b, body_b) in &bodies[i + 1..] {
                if body_a.is_static && body_b.is_static {
                    continue;
                }
                let Some(pair) = self.overlap(a, body_a, b, body_b) else {
                    continue;
                };
                if body_b.is_static && !body_a.is_static {
                    callback(&pair.swapped());
                    callback(&pair);
                } else {
                    callback(&pair);
                    callback(&pair.swapped());
                }
            }
        }
    }

    fn check_pair(&self, a: BodyHandle, b: BodyHandle) -> Option<OverlapPair> {
        let (body_a, body_b) = (self.bodies.get(a)?, self.bodies.get(b)?);
        self.overlap(a, body_a, b, body_b)
    }
}

fn positive(kind: &'static str, dimension: &'static str, value: f64) -> Result<f64, DetectorError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(DetectorError::InvalidDimension {
            kind,
            dimension,
            value,
        })
    }
}

fn build_shape(shape: &BodyShape) -> Result<(SharedShape, Vec<Point2<f64>>), DetectorError> {
    let kind = shape.kind();
    match shape {
        BodyShape::Circle { radius } => {
            let radius = positive(kind, "radius", *radius)?;
            Ok((SharedShape::ball(radius), ellipse_outline(radius, radius, CIRCLE_SEGMENTS)))
        }
        BodyShape::Ellipse { radius_x, radius_y } => {
            let radius_x = positive(kind, "radius_x", *radius_x)?;
            let radius_y = positive(kind, "radius_y", *radius_y)?;
            let segments = ellipse_segments(radius_x, radius_y);
            let outline = ellipse_outline(radius_x, radius_y, segments);
            let hull = SharedShape::convex_hull(&outline).ok_or_else(|| {
                DetectorError::DegenerateShape {
                    kind,
                    reason: "ellipse outline has no hull".to_string(),
                }
            })?;
            Ok((hull, outline))
        }
        BodyShape::Box { width, height } => {
            let hx = positive(kind, "width", *width)? / 2.0;
            let hy = positive(kind, "height", *height)? / 2.0;
            let outline = vec![
                Point2::new(-hx, -hy),
                Point2::new(hx, -hy),
                Point2::new(hx, hy),
                Point2::new(-hx, hy),
            ];
            Ok((SharedShape::cuboid(hx, hy), outline))
        }
        BodyShape::Polygon { points } => {
            let outline = dedup_outline(points);
            if outline.len() < 3 {
                return Err(DetectorError::DegenerateShape {
                    kind,
                    reason: format!("needs 3 distinct points, got {}", outline.len()),
                });
            }

            let shape = if is_convex(&outline) {
                SharedShape::convex_hull(&outline).ok_or_else(|| DetectorError::DegenerateShape {
                    kind,
                    reason: "points are collinear".to_string(),
                })?
            } else {
                let n = outline.len() as u32;
                let edges: Vec<[u32; 2]> = (0..n).map(|i| [i, (i + 1) % n]).collect();
                SharedShape::convex_decomposition(&outline, &edges)
            };
            Ok((shape, outline))
        }
    }
}

/// Ramanujan's perimeter estimate split into roughly `ELLIPSE_STEP` sized pieces
fn ellipse_segments(radius_x: f64, radius_y: f64) -> usize {
    let (a, b) = (radius_x, radius_y);
    let perimeter = std::f64::consts::PI * (3.0 * (a + b) - ((3.0 * a + b) * (a + 3.0 * b)).sqrt());
    ((perimeter / ELLIPSE_STEP).ceil() as usize).max(8)
}

fn ellipse_outline(radius_x: f64, radius_y: f64, segments: usize) -> Vec<Point2<f64>> {
    (0..segments)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / segments as f64;
            Point2::new(radius_x * theta.cos(), radius_y * theta.sin())
        })
        .collect()
}

/// Drop repeated consecutive points, including a closing duplicate
fn dedup_outline(points: &[Point]) -> Vec<Point2<f64>> {
    let mut outline: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        let candidate = Point2::new(p.x, p.y);
        if outline.last().is_none_or(|last| (last - candidate).norm() > 1e-9) {
            outline.push(candidate);
        }
    }
    while outline.len() > 1 && (outline[0] - outline[outline.len() - 1]).norm() <= 1e-9 {
        outline.pop();
    }
    outline
}

/// All turns go the same way
fn is_convex(outline: &[Point2<f64>]) -> bool {
    let n = outline.len();
    let mut sign = 0.0;
    for i in 0..n {
        let a = outline[i];
        let b = outline[(i + 1) % n];
        let c = outline[(i + 2) % n];
        let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
        if cross.abs() < 1e-12 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn collider(n: u64) -> ColliderId {
        ColliderId::from(KeyData::from_ffi(n))
    }

    fn body(shape: BodyShape, x: f64, y: f64, is_static: bool, id: u64) -> BodyDescriptor {
        BodyDescriptor {
            shape,
            position: Point::new(x, y),
            angle: 0.0,
            is_static,
            collider: collider(id),
        }
    }

    fn collect(detector: &ParryDetector) -> Vec<OverlapPair> {
        let mut pairs = Vec::new();
        detector.check_all(&mut |pair| pairs.push(pair.clone()));
        pairs
    }

    #[test]
    fn test_circle_against_box() {
        let mut detector = ParryDetector::new();
        let ball = detector
            .insert(body(BodyShape::Circle { radius: 25.0 }, 0.0, 0.0, false, 1))
            .unwrap();
        let wall = detector
            .insert(body(BodyShape::Box { width: 100.0, height: 100.0 }, 0.0, 65.0, true, 2))
            .unwrap();

        let pairs = collect(&detector);
        assert_eq!(pairs.len(), 2);

        let from_ball = pairs.iter().find(|p| p.a == ball).unwrap();
        assert_eq!(from_ball.b, wall);
        assert_eq!(from_ball.collider_a, collider(1));
        assert!((from_ball.overlap - 10.0).abs() < 1e-6);
        assert!(from_ball.overlap_vector.matches(&Vector::new_2d(0.0, 10.0), 6));
        assert!(!from_ball.a_in_b);
        assert!(!from_ball.b_in_a);

        let from_wall = pairs.iter().find(|p| p.a == wall).unwrap();
        assert!(from_wall.overlap_vector.matches(&Vector::new_2d(0.0, -10.0), 6));
    }

    #[test]
    fn test_static_side_reported_first() {
        let mut detector = ParryDetector::new();
        let ball = detector
            .insert(body(BodyShape::Circle { radius: 25.0 }, 0.0, 0.0, false, 1))
            .unwrap();
        let wall = detector
            .insert(body(BodyShape::Box { width: 100.0, height: 100.0 }, 0.0, 65.0, true, 2))
            .unwrap();

        let pairs = collect(&detector);
        assert_eq!((pairs[0].a, pairs[0].b), (wall, ball));
        assert_eq!((pairs[1].a, pairs[1].b), (ball, wall));
    }

    #[test]
    fn test_check_pair_uses_current_transforms() {
        let mut detector = ParryDetector::new();
        let a = detector
            .insert(body(BodyShape::Circle { radius: 25.0 }, 0.0, 0.0, false, 1))
            .unwrap();
        let b = detector
            .insert(body(BodyShape::Circle { radius: 25.0 }, 45.0, 0.0, false, 2))
            .unwrap();

        let pair = detector.check_pair(a, b).unwrap();
        assert!((pair.overlap - 5.0).abs() < 1e-9);
        assert!(pair.overlap_vector.matches(&Vector::new_2d(5.0, 0.0), 9));
        let reverse = detector.check_pair(b, a).unwrap();
        assert!(reverse.overlap_vector.matches(&Vector::new_2d(-5.0, 0.0), 9));

        // Exactly touching no longer counts
        assert!(detector.set_position(a, Point::new(-5.0, 0.0)));
        assert!(detector.check_pair(a, b).is_none());
        assert!(detector.check_pair(b, a).is_none());

        assert!(detector.remove(b));
        assert!(detector.check_pair(a, b).is_none());
    }

    #[test]
    fn test_static_pairs_are_skipped() {
        let mut detector = ParryDetector::new();
        detector
            .insert(body(BodyShape::Circle { radius: 10.0 }, 0.0, 0.0, true, 1))
            .unwrap();
        detector
            .insert(body(BodyShape::Circle { radius: 10.0 }, 5.0, 0.0, true, 2))
            .unwrap();
        assert!(collect(&detector).is_empty());
    }

    #[test]
    fn test_containment_flags() {
        let mut detector = ParryDetector::new();
        let ball = detector
            .insert(body(BodyShape::Circle { radius: 10.0 }, 0.0, 0.0, false, 1))
            .unwrap();
        detector
            .insert(body(BodyShape::Circle { radius: 40.0 }, 5.0, 0.0, true, 2))
            .unwrap();

        let pairs = collect(&detector);
        let from_ball = pairs.iter().find(|p| p.a == ball).unwrap();
        assert!(from_ball.a_in_b);
        assert!(!from_ball.b_in_a);
    }

    #[test]
    fn test_transform_updates() {
        let mut detector = ParryDetector::new();
        let ball = detector
            .insert(body(BodyShape::Circle { radius: 10.0 }, 0.0, 0.0, false, 1))
            .unwrap();
        detector
            .insert(body(BodyShape::Box { width: 10.0, height: 100.0 }, 100.0, 0.0, true, 2))
            .unwrap();
        assert!(collect(&detector).is_empty());

        assert!(detector.set_position(ball, Point::new(90.0, 0.0)));
        assert_eq!(collect(&detector).len(), 2);

        assert!(detector.remove(ball));
        assert!(!detector.remove(ball));
        assert!(!detector.set_angle(ball, 1.0));
        assert!(collect(&detector).is_empty());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let mut detector = ParryDetector::new();
        let err = detector
            .insert(body(BodyShape::Circle { radius: 0.0 }, 0.0, 0.0, false, 1))
            .unwrap_err();
        assert!(matches!(err, DetectorError::InvalidDimension { .. }));

        let line = BodyShape::Polygon {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 0.0)],
        };
        assert!(detector.insert(body(line, 0.0, 0.0, true, 2)).is_err());
        assert!(detector.is_empty());

        let curved = Shape::CurvablePolygon { points: vec![] };
        assert!(matches!(
            BodyShape::from_shape(&curved),
            Err(DetectorError::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn test_concave_polygon_detection() {
        // U shape opening upwards
        let points = vec![
            Point::new(-50.0, -50.0),
            Point::new(-30.0, -50.0),
            Point::new(-30.0, 30.0),
            Point::new(30.0, 30.0),
            Point::new(30.0, -50.0),
            Point::new(50.0, -50.0),
            Point::new(50.0, 50.0),
            Point::new(-50.0, 50.0),
        ];
        let mut detector = ParryDetector::new();
        detector
            .insert(body(BodyShape::Polygon { points }, 0.0, 0.0, true, 1))
            .unwrap();
        // Sits in the notch without touching
        detector
            .insert(body(BodyShape::Circle { radius: 5.0 }, 0.0, -20.0, false, 2))
            .unwrap();
        assert!(collect(&detector).is_empty());
    }

    #[test]
    fn test_is_convex() {
        let square = dedup_outline(&[
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(square.len(), 4);
        assert!(is_convex(&square));

        let arrow = dedup_outline(&[
            Point::new(0.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(0.0, 2.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(!is_convex(&arrow));
    }
}
