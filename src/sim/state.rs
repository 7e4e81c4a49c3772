//! World state: entity and collider arenas plus the detector
//!
//! The world owns everything. Entities and colliders reference each other by
//! id only, and bodies live inside the detector behind their handles.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use slotmap::SlotMap;

use super::ball::Ball;
use super::collider::{Collider, ColliderId, ColliderOptions, CollisionOverlap};
use super::detector::{BodyHandle, CollisionDetector, OverlapPair, ParryDetector};
use super::entity::{BreakableWall, CollisionReaction, Entity, EntityId, Hole, Wall};
use super::scene::SceneSink;
use super::shape::Shape;
use crate::consts::{HOLE_RADIUS, TAG_BALL, TAG_BREAKABLE, TAG_HOLE, TAG_WALL};
use crate::error::{Error, Result};
use crate::math::Vector;
use crate::settings::Settings;

pub struct World<D: CollisionDetector = ParryDetector> {
    settings: Settings,
    detector: D,
    entities: SlotMap<EntityId, Entity>,
    colliders: SlotMap<ColliderId, Collider>,
    /// Seeded from the settings; only used for initial ball pushes
    rng: Pcg32,
    /// Simulated milliseconds
    time_ms: f64,
    ticks: u64,
}

impl World<ParryDetector> {
    pub fn new(settings: Settings) -> Self {
        Self::with_detector(settings, ParryDetector::new())
    }
}

impl<D: CollisionDetector> World<D> {
    pub fn with_detector(settings: Settings, detector: D) -> Self {
        let rng = Pcg32::seed_from_u64(settings.seed);
        Self {
            settings,
            detector,
            entities: SlotMap::with_key(),
            colliders: SlotMap::with_key(),
            rng,
            time_ms: 0.0,
            ticks: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter()
    }

    pub fn collider(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id)
    }

    /// Collider of an entity, if it still has one
    pub fn collider_of(&self, entity: EntityId) -> Option<&Collider> {
        self.entities
            .get(entity)
            .and_then(Entity::collider)
            .and_then(|id| self.colliders.get(id))
    }

    pub fn ball(&self, id: EntityId) -> Result<&Ball> {
        let entity = self.entities.get(id).ok_or(Error::UnknownEntity(id))?;
        entity.as_ball().ok_or(Error::NotABall {
            id,
            kind: entity.kind(),
        })
    }

    pub fn balls(&self) -> impl Iterator<Item = (EntityId, &Ball)> {
        self.entities
            .iter()
            .filter_map(|(id, entity)| entity.as_ball().map(|ball| (id, ball)))
    }

    /// Spawn a ball with a random push, as a freshly placed ball gets
    pub fn spawn_ball(&mut self, position: Vector) -> Result<EntityId> {
        let ball = Ball::with_random_momentum(position, &self.settings.ball, &mut self.rng);
        self.insert_ball(ball)
    }

    /// Add a ball exactly as given
    pub fn insert_ball(&mut self, ball: Ball) -> Result<EntityId> {
        let shape = Shape::circle(ball.radius, 1.0);
        let options = ColliderOptions::default().dynamic().tag(TAG_BALL);
        self.spawn(Entity::Ball(ball), shape, options)
    }

    /// `angle` is in the configured angle unit
    pub fn spawn_wall(&mut self, shape: Shape, position: Vector, angle: f64) -> Result<EntityId> {
        let angle = self.settings.angle_unit.to_radians(angle);
        let options = ColliderOptions::default().tag(TAG_WALL);
        self.spawn(Entity::Wall(Wall::new(position, angle)), shape, options)
    }

    /// `angle` is in the configured angle unit
    pub fn spawn_breakable_wall(
        &mut self,
        shape: Shape,
        position: Vector,
        angle: f64,
        hitpoints: u32,
    ) -> Result<EntityId> {
        let angle = self.settings.angle_unit.to_radians(angle);
        let wall = BreakableWall::new(position, angle, hitpoints);
        let options = ColliderOptions::default().tag(TAG_WALL).tag(TAG_BREAKABLE);
        self.spawn(Entity::BreakableWall(wall), shape, options)
    }

    pub fn spawn_hole(&mut self, position: Vector) -> Result<EntityId> {
        let options = ColliderOptions::default().tag(TAG_HOLE);
        let hole = Hole::new(position, HOLE_RADIUS);
        self.spawn(Entity::Hole(hole), Shape::circle(HOLE_RADIUS, 1.0), options)
    }

    fn spawn(&mut self, entity: Entity, shape: Shape, options: ColliderOptions) -> Result<EntityId> {
        let position = entity.position().clone();
        let angle = entity.angle();
        let kind = entity.kind();
        let options = options.steps_per_curve(self.settings.steps_per_curve);

        let id = self.entities.insert(entity);
        let detector = &mut self.detector;
        let registered = self.colliders.try_insert_with_key(|collider| {
            Collider::register(detector, collider, id, shape, position, angle, options)
        });

        match registered {
            Ok(collider) => {
                if let Some(entity) = self.entities.get_mut(id) {
                    entity.set_collider(Some(collider));
                }
                log::debug!("Spawned {kind} {id:?}");
                Ok(id)
            }
            Err(err) => {
                self.entities.remove(id);
                Err(err.into())
            }
        }
    }

    /// Remove an entity and unregister its collider
    pub fn despawn(&mut self, id: EntityId) -> Result<()> {
        let entity = self.entities.remove(id).ok_or(Error::UnknownEntity(id))?;
        if let Some(mut collider) = entity.collider().and_then(|c| self.colliders.remove(c)) {
            if !collider.is_destroyed() {
                collider.destroy(&mut self.detector);
            }
        }
        log::debug!("Despawned {} {id:?}", entity.kind());
        Ok(())
    }

    /// Launch a ball towards `target`; `magnitude` is the hold time
    pub fn launch(&mut self, id: EntityId, target: &Vector, magnitude: f64) -> Result<()> {
        let entity = self.entities.get_mut(id).ok_or(Error::UnknownEntity(id))?;
        let kind = entity.kind();
        let ball = entity.as_ball_mut().ok_or(Error::NotABall { id, kind })?;
        ball.launch(target, magnitude, &self.settings.launch)?;
        Ok(())
    }

    /// Update every active entity and mirror moved bodies to the detector
    pub fn integrate(&mut self, dt: f64) -> Result<()> {
        for (_, entity) in self.entities.iter_mut() {
            if !entity.is_active() {
                continue;
            }
            entity.update(dt)?;
            if let Entity::Ball(_) = entity {
                sync_transform(entity, &mut self.colliders, &mut self.detector)?;
            }
        }
        Ok(())
    }

    /// Run the detector and dispatch every overlap to its owners
    ///
    /// Each ordered pair is re-tested right before its callback, so a pair an
    /// earlier callback already separated is not dispatched.
    pub fn resolve_collisions(&mut self) -> Result<()> {
        let mut candidates: Vec<(BodyHandle, BodyHandle)> = Vec::new();
        self.detector.check_all(&mut |pair| candidates.push((pair.a, pair.b)));

        let mut broken: Vec<ColliderId> = Vec::new();
        let mut failure = None;
        for (a, b) in candidates {
            let Some(pair) = self.detector.check_pair(a, b) else {
                continue;
            };
            if let Err(err) = self.dispatch(&pair, &mut broken) {
                failure = Some(err);
                break;
            }
        }

        // Broken walls disappear once the frame has been handled, even a failed one
        for id in broken {
            if let Some(collider) = self.colliders.get_mut(id) {
                if !collider.is_destroyed() {
                    collider.destroy(&mut self.detector);
                }
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Hand one overlap to the owner of body `a` and apply its reaction
    fn dispatch(&mut self, pair: &OverlapPair, broken: &mut Vec<ColliderId>) -> Result<()> {
        let (Some(own), Some(other)) = (
            self.colliders.get(pair.collider_a),
            self.colliders.get(pair.collider_b),
        ) else {
            return Ok(());
        };
        let other_owner = other.owner();
        let Some(owner) = self.entities.get_mut(own.owner()) else {
            return Ok(());
        };

        let overlap = CollisionOverlap::from(pair);
        let reaction = own.handle_collision(owner, other, &overlap)?;
        sync_transform(owner, &mut self.colliders, &mut self.detector)?;

        match reaction {
            CollisionReaction::None => {}
            CollisionReaction::Impulse(impulse) => {
                if let Some(ball) = self.entities.get_mut(other_owner).and_then(Entity::as_ball_mut) {
                    ball.apply_impulse(&impulse)?;
                }
            }
            CollisionReaction::DestroySelf => broken.push(pair.collider_a),
        }
        Ok(())
    }

    pub(crate) fn advance_clock(&mut self, dt: f64) {
        self.time_ms += dt;
        self.ticks += 1;
    }

    /// Push every entity with a live collider to the scene
    pub fn publish(&self, sink: &mut dyn SceneSink) -> Result<()> {
        for (id, entity) in self.entities.iter() {
            let alive = entity
                .collider()
                .and_then(|c| self.colliders.get(c))
                .is_some_and(|c| !c.is_destroyed());
            if alive {
                sink.update(id, entity.position().to_dvec2()?, entity.angle());
            }
        }
        Ok(())
    }
}

/// Mirror an entity's transform onto its collider
fn sync_transform<D: CollisionDetector>(
    entity: &Entity,
    colliders: &mut SlotMap<ColliderId, Collider>,
    detector: &mut D,
) -> Result<()> {
    let Some(collider) = entity.collider().and_then(|id| colliders.get_mut(id)) else {
        return Ok(());
    };
    if collider.is_destroyed() {
        return Ok(());
    }
    if collider.position() != entity.position() {
        collider.set_position(detector, entity.position().clone())?;
    }
    if collider.angle() != entity.angle() {
        collider.set_angle(detector, entity.angle());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point;
    use crate::settings::BallSettings;
    use crate::sim::scene::SceneSnapshot;

    fn world() -> World {
        World::new(Settings::default())
    }

    fn resting_ball(x: f64, y: f64) -> Ball {
        Ball::new(Vector::new_2d(x, y), &BallSettings::default())
    }

    fn moving_ball(x: f64, y: f64, momentum: Vector) -> Ball {
        let mut ball = resting_ball(x, y);
        ball.momentum = momentum;
        ball
    }

    #[test]
    fn test_spawn_registers_colliders() {
        let mut world = world();
        let ball = world.spawn_ball(Vector::zero_2d()).unwrap();
        let wall = world
            .spawn_wall(Shape::rectangle(100.0, 20.0, 1.0), Vector::new_2d(0.0, 300.0), 0.0)
            .unwrap();

        assert_eq!(world.detector().len(), 2);
        assert!(world.collider_of(ball).unwrap().has_tag(TAG_BALL));
        let wall_collider = world.collider_of(wall).unwrap();
        assert!(wall_collider.has_tag(TAG_WALL));
        assert!(wall_collider.is_static());
        assert_eq!(wall_collider.owner(), wall);
        assert!((world.ball(ball).unwrap().momentum.length() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_failed_spawn_leaves_nothing_behind() {
        let mut world = world();
        let err = world
            .spawn_wall(Shape::Polygon { points: vec![Point::new(0.0, 0.0)] }, Vector::zero_2d(), 0.0)
            .unwrap_err();
        assert!(matches!(err, Error::Collider(_)));
        assert_eq!(world.entities().count(), 0);
        assert!(world.detector().is_empty());
    }

    #[test]
    fn test_spawn_angle_uses_configured_unit() {
        let mut settings = Settings::default();
        settings.angle_unit = crate::math::AngleUnit::Degrees;
        let mut world = World::new(settings);
        let wall = world
            .spawn_wall(Shape::rectangle(10.0, 10.0, 1.0), Vector::zero_2d(), 180.0)
            .unwrap();
        let angle = world.entity(wall).unwrap().angle();
        assert!((angle - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn test_resting_ball_pushed_out_of_wall() {
        let mut world = world();
        let ball = world.insert_ball(resting_ball(0.0, 0.0)).unwrap();
        // Top edge at y = 15, ball reaches y = 25
        world
            .spawn_wall(Shape::rectangle(200.0, 100.0, 1.0), Vector::new_2d(0.0, 65.0), 0.0)
            .unwrap();

        world.resolve_collisions().unwrap();
        let ball_state = world.ball(ball).unwrap();
        assert!(ball_state.position.matches(&Vector::new_2d(0.0, -10.0), 6));
        assert!(ball_state.momentum.is_zero());

        // The collider followed the ball
        let collider = world.collider_of(ball).unwrap();
        assert_eq!(collider.position(), &ball_state.position);
    }

    #[test]
    fn test_moving_ball_bounces_off_wall() {
        let mut world = world();
        let ball = world
            .insert_ball(moving_ball(0.0, 0.0, Vector::new_2d(0.0, 0.5)))
            .unwrap();
        world
            .spawn_wall(Shape::rectangle(200.0, 100.0, 1.0), Vector::new_2d(0.0, 70.0), 0.0)
            .unwrap();

        world.resolve_collisions().unwrap();
        let ball = world.ball(ball).unwrap();
        assert!(ball.momentum.y().unwrap() < 0.0);
        assert!((ball.momentum.length() - (0.5 - 0.03)).abs() < 1e-9);
    }

    #[test]
    fn test_struck_ball_is_shoved_not_bounced() {
        let mut world = world();
        let start = Vector::new_2d(0.4, 0.0);
        let striker = world.insert_ball(moving_ball(0.0, 0.0, start.clone())).unwrap();
        let target = world.insert_ball(resting_ball(45.0, 0.0)).unwrap();

        world.resolve_collisions().unwrap();

        // Striker backs out along -x; the tangent of that push is (0, -1)
        let drag = BallSettings::default().collision_drag;
        let tangent = Vector::new_2d(-1.0, 0.0).perpendicular().unwrap();
        let bounced = start.bounce_off_line(&tangent).unwrap();
        let expected_striker = start
            .scale(0.5)
            .subtract_length(drag)
            .unwrap()
            .add(&bounced.scale(0.5).subtract_length(drag).unwrap())
            .unwrap();
        let expected_impulse = tangent
            .opposite()
            .set_length(start.length())
            .unwrap()
            .subtract_length(drag)
            .unwrap();

        let striker_ball = world.ball(striker).unwrap();
        assert!(striker_ball.momentum.matches(&expected_striker, 9));
        assert!(striker_ball.momentum.matches(&Vector::zero_2d(), 9));
        assert!(striker_ball.position.matches(&Vector::new_2d(-5.0, 0.0), 9));

        let target_ball = world.ball(target).unwrap();
        assert!(target_ball.momentum.matches(&expected_impulse, 9));
        assert!(target_ball.momentum.matches(&Vector::new_2d(0.0, 0.37), 9));
        assert!(target_ball.position.matches(&Vector::new_2d(45.0, 0.0), 9));

        // The two balls end exactly touching
        let gap = striker_ball.position.distance(&target_ball.position).unwrap()
            - striker_ball.radius
            - target_ball.radius;
        assert!(gap.abs() < 1e-9);
    }

    #[test]
    fn test_failed_dispatch_still_destroys_broken_walls() {
        let mut world = world();
        let wall = world
            .spawn_breakable_wall(Shape::circle(20.0, 1.0), Vector::new_2d(40.0, 0.0), 0.0, 1)
            .unwrap();
        // A 3D ball cannot take the 2D push-out vector
        let mut ball = resting_ball(0.0, 0.0);
        ball.position = Vector::new_3d(0.0, 0.0, 0.0);
        world.insert_ball(ball).unwrap();

        let err = world.resolve_collisions().unwrap_err();
        assert!(matches!(err, Error::Vector(_)));

        let Some(Entity::BreakableWall(state)) = world.entity(wall) else {
            panic!("expected breakable wall");
        };
        assert!(state.is_broken());
        assert!(world.collider_of(wall).unwrap().is_destroyed());
        assert_eq!(world.detector().len(), 1);
    }

    #[test]
    fn test_breakable_wall_breaks_after_hits() {
        let mut world = world();
        let wall = world
            .spawn_breakable_wall(Shape::circle(20.0, 1.0), Vector::new_2d(40.0, 0.0), 0.0, 2)
            .unwrap();

        for _ in 0..2 {
            // A fresh ball overlapping the wall each round
            let ball = world.insert_ball(resting_ball(0.0, 0.0)).unwrap();
            world.resolve_collisions().unwrap();
            world.despawn(ball).unwrap();
        }

        let Some(Entity::BreakableWall(state)) = world.entity(wall) else {
            panic!("expected breakable wall");
        };
        assert!(state.is_broken());
        assert!(world.collider_of(wall).unwrap().is_destroyed());
        assert!(world.detector().is_empty());
    }

    #[test]
    fn test_hole_sees_ball_inside() {
        let mut world = world();
        let hole = world.spawn_hole(Vector::new_2d(100.0, 100.0)).unwrap();
        world.insert_ball(resting_ball(102.0, 100.0)).unwrap();

        world.resolve_collisions().unwrap();
        let Some(Entity::Hole(state)) = world.entity(hole) else {
            panic!("expected hole");
        };
        assert!(state.ball_inside);

        // Next frame starts clean
        world.integrate(16.0).unwrap();
        let Some(Entity::Hole(state)) = world.entity(hole) else {
            panic!("expected hole");
        };
        assert!(!state.ball_inside);
    }

    #[test]
    fn test_launch_and_despawn() {
        let mut world = world();
        let ball = world.insert_ball(resting_ball(0.0, 0.0)).unwrap();
        let wall = world
            .spawn_wall(Shape::circle(10.0, 1.0), Vector::new_2d(500.0, 0.0), 0.0)
            .unwrap();

        world.launch(ball, &Vector::new_2d(10.0, 0.0), 500.0).unwrap();
        assert!(world.ball(ball).unwrap().momentum.matches(&Vector::new_2d(0.5, 0.0), 9));

        assert!(matches!(
            world.launch(wall, &Vector::zero_2d(), 1.0),
            Err(Error::NotABall { kind: "wall", .. })
        ));

        world.despawn(ball).unwrap();
        assert!(matches!(world.despawn(ball), Err(Error::UnknownEntity(_))));
        assert!(matches!(
            world.launch(ball, &Vector::zero_2d(), 1.0),
            Err(Error::UnknownEntity(_))
        ));
        assert_eq!(world.detector().len(), 1);
    }

    #[test]
    fn test_publish_skips_destroyed() {
        let mut world = world();
        let ball = world.insert_ball(resting_ball(5.0, 6.0)).unwrap();
        world
            .spawn_breakable_wall(Shape::circle(10.0, 1.0), Vector::new_2d(30.0, 6.0), 0.0, 1)
            .unwrap();
        world.resolve_collisions().unwrap();

        let mut snapshot = SceneSnapshot::default();
        world.publish(&mut snapshot).unwrap();
        assert_eq!(snapshot.transforms.len(), 1);
        let (position, angle) = snapshot.get(ball).unwrap();
        assert_eq!(angle, 0.0);
        assert!(position.y < 6.0 + 1e-9);
    }
}
