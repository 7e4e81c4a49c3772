//! Collider: the link between an entity and its detector body
//!
//! A collider owns its local shape, a world transform and a tag set. It keeps
//! only ids for its owner and its body; the world resolves them.

use std::collections::BTreeSet;

use thiserror::Error;

use super::detector::{BodyDescriptor, BodyHandle, BodyShape, CollisionDetector, OverlapPair};
use super::entity::{CollisionReaction, Entity, EntityId};
use super::shape::Shape;
use crate::math::{DEFAULT_STEPS_PER_CURVE, Vector, VectorError};

slotmap::new_key_type! {
    /// Id of a collider in the world's collider arena
    pub struct ColliderId;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColliderError {
    #[error("could not register {shape} collider: {reason}")]
    RegistrationFailed { shape: &'static str, reason: String },
    #[error(transparent)]
    Vector(#[from] VectorError),
}

/// Overlap data for one collider of a pair
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionOverlap {
    /// This collider lies fully inside the other
    pub inside_other: bool,
    /// The other collider lies fully inside this one
    pub inside_this: bool,
    pub overlap: f64,
    /// Unit direction from this collider towards the other
    pub overlap_normal: Vector,
    /// Minimal translation separating the pair, pointing towards the other
    pub overlap_vector: Vector,
}

impl From<&OverlapPair> for CollisionOverlap {
    fn from(pair: &OverlapPair) -> Self {
        Self {
            inside_other: pair.a_in_b,
            inside_this: pair.b_in_a,
            overlap: pair.overlap,
            overlap_normal: pair.overlap_normal.clone(),
            overlap_vector: pair.overlap_vector.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColliderOptions {
    pub tags: Vec<String>,
    pub is_static: bool,
    pub steps_per_curve: usize,
}

impl Default for ColliderOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            is_static: true,
            steps_per_curve: DEFAULT_STEPS_PER_CURVE,
        }
    }
}

impl ColliderOptions {
    pub fn dynamic(mut self) -> Self {
        self.is_static = false;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn steps_per_curve(mut self, steps: usize) -> Self {
        self.steps_per_curve = steps;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Collider {
    id: ColliderId,
    owner: EntityId,
    /// Shape as given, curves included
    shape: Shape,
    /// Straight-edged shape handed to the detector
    geometry: Shape,
    position: Vector,
    angle: f64,
    is_static: bool,
    tags: BTreeSet<String>,
    body: Option<BodyHandle>,
}

impl Collider {
    /// Flatten the shape and register a body for it with the detector
    #[allow(clippy::too_many_arguments)]
    pub fn register<D: CollisionDetector + ?Sized>(
        detector: &mut D,
        id: ColliderId,
        owner: EntityId,
        shape: Shape,
        position: Vector,
        angle: f64,
        options: ColliderOptions,
    ) -> Result<Self, ColliderError> {
        let kind = shape.kind();
        let registration_failed = |reason: String| ColliderError::RegistrationFailed {
            shape: kind,
            reason,
        };

        let geometry = shape
            .flattened(options.steps_per_curve)
            .map_err(|err| registration_failed(err.to_string()))?;
        let body_shape =
            BodyShape::from_shape(&geometry).map_err(|err| registration_failed(err.to_string()))?;

        let body = detector
            .insert(BodyDescriptor {
                shape: body_shape,
                position: position.to_point()?,
                angle,
                is_static: options.is_static,
                collider: id,
            })
            .map_err(|err| registration_failed(err.to_string()))?;

        log::debug!(
            "Registered {kind} collider {id:?} for {owner:?} with tags {:?}",
            options.tags
        );

        Ok(Self {
            id,
            owner,
            shape,
            geometry,
            position,
            angle,
            is_static: options.is_static,
            tags: options.tags.into_iter().collect(),
            body: Some(body),
        })
    }

    pub fn id(&self) -> ColliderId {
        self.id
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Flattened shape, identical to `shape` unless it had curves
    pub fn geometry(&self) -> &Shape {
        &self.geometry
    }

    pub fn position(&self) -> &Vector {
        &self.position
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn is_destroyed(&self) -> bool {
        self.body.is_none()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &str) {
        self.tags.insert(tag.to_string());
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn set_position<D: CollisionDetector + ?Sized>(
        &mut self,
        detector: &mut D,
        position: Vector,
    ) -> Result<(), VectorError> {
        let Some(body) = self.body else {
            log::warn!("Collider {:?} moved after it was destroyed", self.id);
            return Ok(());
        };
        let point = position.to_point()?;
        if !detector.set_position(body, point) {
            log::warn!("Detector lost body {body:?} of collider {:?}", self.id);
        }
        self.position = position;
        Ok(())
    }

    pub fn set_angle<D: CollisionDetector + ?Sized>(&mut self, detector: &mut D, angle: f64) {
        let Some(body) = self.body else {
            log::warn!("Collider {:?} rotated after it was destroyed", self.id);
            return;
        };
        if !detector.set_angle(body, angle) {
            log::warn!("Detector lost body {body:?} of collider {:?}", self.id);
        }
        self.angle = angle;
    }

    /// Unregister the body; calling it twice only logs
    pub fn destroy<D: CollisionDetector + ?Sized>(&mut self, detector: &mut D) {
        match self.body.take() {
            Some(body) => {
                detector.remove(body);
                log::debug!("Destroyed collider {:?}", self.id);
            }
            None => log::warn!("Collider {:?} already destroyed", self.id),
        }
    }

    /// Forward an overlap to the owner when it is active
    pub fn handle_collision(
        &self,
        owner: &mut Entity,
        other: &Collider,
        overlap: &CollisionOverlap,
    ) -> Result<CollisionReaction, VectorError> {
        if !owner.is_active() {
            return Ok(CollisionReaction::None);
        }
        owner.on_collision(other, overlap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::CurvablePoint;
    use crate::sim::detector::ParryDetector;
    use crate::sim::entity::Wall;
    use slotmap::SlotMap;

    struct Fixture {
        detector: ParryDetector,
        colliders: SlotMap<ColliderId, Collider>,
        entities: SlotMap<EntityId, ()>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                detector: ParryDetector::new(),
                colliders: SlotMap::with_key(),
                entities: SlotMap::with_key(),
            }
        }

        fn register(&mut self, shape: Shape, options: ColliderOptions) -> Result<ColliderId, ColliderError> {
            let owner = self.entities.insert(());
            let detector = &mut self.detector;
            self.colliders.try_insert_with_key(|id| {
                Collider::register(detector, id, owner, shape, Vector::new_2d(10.0, 20.0), 0.5, options)
            })
        }
    }

    #[test]
    fn test_register_flattens_curves() {
        let mut fixture = Fixture::new();
        let shape = Shape::curvable_polygon(
            &[
                CurvablePoint::anchor(0.0, 0.0),
                CurvablePoint::control(50.0, 50.0),
                CurvablePoint::anchor(100.0, 0.0),
            ],
            1.0,
        );
        let id = fixture.register(shape.clone(), ColliderOptions::default()).unwrap();
        let collider = &fixture.colliders[id];

        assert_eq!(collider.shape(), &shape);
        assert!(matches!(collider.geometry(), Shape::Polygon { points } if points.len() == 12));
        assert_eq!(collider.angle(), 0.5);
        assert!(collider.is_static());
        assert_eq!(fixture.detector.len(), 1);
    }

    #[test]
    fn test_register_failure() {
        let mut fixture = Fixture::new();
        let err = fixture
            .register(Shape::CurvablePolygon { points: vec![] }, ColliderOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ColliderError::RegistrationFailed { shape: "curvable_polygon", .. }
        ));

        let err = fixture
            .register(Shape::circle(-1.0, 1.0), ColliderOptions::default())
            .unwrap_err();
        assert!(matches!(err, ColliderError::RegistrationFailed { shape: "circle", .. }));
        assert!(fixture.colliders.is_empty());
        assert!(fixture.detector.is_empty());
    }

    #[test]
    fn test_tags() {
        let mut fixture = Fixture::new();
        let id = fixture
            .register(Shape::circle(5.0, 1.0), ColliderOptions::default().tag("wall"))
            .unwrap();
        let collider = &mut fixture.colliders[id];
        assert!(collider.has_tag("wall"));
        assert!(!collider.has_tag("breakable"));
        collider.add_tag("breakable");
        assert!(collider.has_tag("breakable"));
        assert_eq!(collider.tags().collect::<Vec<_>>(), vec!["breakable", "wall"]);
    }

    #[test]
    fn test_transform_and_destroy() {
        let mut fixture = Fixture::new();
        let id = fixture
            .register(Shape::circle(5.0, 1.0), ColliderOptions::default().dynamic())
            .unwrap();
        let collider = &mut fixture.colliders[id];

        collider
            .set_position(&mut fixture.detector, Vector::new_2d(1.0, 2.0))
            .unwrap();
        collider.set_angle(&mut fixture.detector, 1.0);
        assert_eq!(collider.position(), &Vector::new_2d(1.0, 2.0));
        assert_eq!(collider.angle(), 1.0);

        collider.destroy(&mut fixture.detector);
        assert!(collider.is_destroyed());
        assert!(fixture.detector.is_empty());

        // Second destroy and late transforms are tolerated no-ops
        collider.destroy(&mut fixture.detector);
        collider
            .set_position(&mut fixture.detector, Vector::new_2d(5.0, 5.0))
            .unwrap();
        collider.set_angle(&mut fixture.detector, 2.0);
        assert_eq!(collider.position(), &Vector::new_2d(1.0, 2.0));
        assert_eq!(collider.angle(), 1.0);
    }

    #[test]
    fn test_inactive_owner_ignores_collisions() {
        let mut fixture = Fixture::new();
        let a = fixture
            .register(Shape::circle(5.0, 1.0), ColliderOptions::default().tag("wall"))
            .unwrap();
        let b = fixture
            .register(Shape::circle(5.0, 1.0), ColliderOptions::default().tag("wall"))
            .unwrap();

        let mut owner = Entity::Wall(Wall::new(Vector::new_2d(0.0, 0.0), 0.0));
        let overlap = CollisionOverlap {
            inside_other: false,
            inside_this: false,
            overlap: 1.0,
            overlap_normal: Vector::new_2d(1.0, 0.0),
            overlap_vector: Vector::new_2d(1.0, 0.0),
        };
        let reaction = fixture.colliders[a]
            .handle_collision(&mut owner, &fixture.colliders[b], &overlap)
            .unwrap();
        assert_eq!(reaction, CollisionReaction::None);
        assert_eq!(owner.position(), &Vector::new_2d(0.0, 0.0));
    }

    #[test]
    fn test_overlap_from_pair() {
        let mut colliders: SlotMap<ColliderId, ()> = SlotMap::with_key();
        let mut bodies: SlotMap<BodyHandle, ()> = SlotMap::with_key();
        let pair = OverlapPair {
            a: bodies.insert(()),
            b: bodies.insert(()),
            collider_a: colliders.insert(()),
            collider_b: colliders.insert(()),
            a_in_b: true,
            b_in_a: false,
            overlap: 2.0,
            overlap_normal: Vector::new_2d(0.0, 1.0),
            overlap_vector: Vector::new_2d(0.0, 2.0),
        };
        let overlap = CollisionOverlap::from(&pair);
        assert!(overlap.inside_other);
        assert!(!overlap.inside_this);

        let mirrored = CollisionOverlap::from(&pair.swapped());
        assert!(mirrored.inside_this);
        assert_eq!(mirrored.overlap_vector, Vector::new_2d(0.0, -2.0));
    }
}
