//! Ball movement and collision response
//!
//! - integration: `position += momentum * dt`, then ambient drag
//! - wall impact: push out along the overlap, bounce off the wall tangent
//! - ball impact: push out, blend forward and bounced momentum, shove the
//!   other ball

use rand::Rng;

use super::collider::{ColliderId, CollisionOverlap};
use crate::math::{Vector, VectorResult};
use crate::settings::{BallSettings, LaunchSettings};

/// Whether the ball is rolling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    /// Momentum is the zero vector
    Idle,
    Moving,
}

/// A ball that rolls, bounces and loses speed to drag
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    /// World position; the world mirrors it to the collider after every change
    pub position: Vector,
    pub angle: f64,
    /// Velocity in units per millisecond
    pub momentum: Vector,
    pub radius: f64,
    /// Speed lost per millisecond
    pub drag: f64,
    /// Speed lost on every impact
    pub collision_drag: f64,
    pub collider: Option<ColliderId>,
}

impl Ball {
    /// A resting ball
    pub fn new(position: Vector, settings: &BallSettings) -> Self {
        Self {
            position,
            angle: 0.0,
            momentum: Vector::zero_2d(),
            radius: settings.radius,
            drag: settings.drag,
            collision_drag: settings.collision_drag,
            collider: None,
        }
    }

    /// A ball rolling off in a random direction at the configured initial speed
    pub fn with_random_momentum<R: Rng + ?Sized>(
        position: Vector,
        settings: &BallSettings,
        rng: &mut R,
    ) -> Self {
        let mut ball = Self::new(position, settings);
        ball.momentum = Vector::random(rng).scale(settings.initial_speed);
        ball
    }

    pub fn state(&self) -> MotionState {
        if self.momentum.is_zero() {
            MotionState::Idle
        } else {
            MotionState::Moving
        }
    }

    pub fn is_moving(&self) -> bool {
        self.state() == MotionState::Moving
    }

    /// Advance by `dt` milliseconds
    pub fn update(&mut self, dt: f64) -> VectorResult<()> {
        self.position = self.position.add(&self.momentum.scale(dt))?;
        if self.is_moving() {
            self.momentum = self.momentum.subtract_length(self.drag * dt)?;
        }
        Ok(())
    }

    /// Aim at `target` with a hold `magnitude` (milliseconds held)
    pub fn launch(
        &mut self,
        target: &Vector,
        magnitude: f64,
        settings: &LaunchSettings,
    ) -> VectorResult<()> {
        let direction = target.subtract(&self.position)?.normalize()?;
        let speed = (magnitude / settings.time_to_force).min(settings.max_force);
        self.momentum = direction.scale(speed);
        log::debug!("Ball launched towards {target} at speed {speed}");
        Ok(())
    }

    /// Add momentum handed over by another body
    pub fn apply_impulse(&mut self, impulse: &Vector) -> VectorResult<()> {
        self.momentum = self.momentum.add(impulse)?;
        Ok(())
    }

    /// Push out of a wall and bounce off its tangent
    pub fn bounce_off_wall(&mut self, overlap: &CollisionOverlap) -> VectorResult<()> {
        let corrected = self.position.subtract(&overlap.overlap_vector)?;

        if self.is_moving() && !overlap.overlap_vector.is_zero() {
            let push = corrected.subtract(&self.position)?.normalize()?;
            self.momentum = self
                .momentum
                .bounce_off_line(&push.perpendicular()?)?
                .subtract_length(self.collision_drag)?;
        }

        self.position = corrected;
        Ok(())
    }

    /// Push out of another ball and return the impulse it receives
    pub fn bounce_off_ball(&mut self, overlap: &CollisionOverlap) -> VectorResult<Option<Vector>> {
        let corrected = self.position.subtract(&overlap.overlap_vector)?;
        let mut impulse = None;

        if self.is_moving() && !overlap.overlap_vector.is_zero() {
            let start_speed = self.momentum.length();
            let push = corrected.subtract(&self.position)?.normalize()?;
            let tangent = push.perpendicular()?;
            let bounced = self.momentum.bounce_off_line(&tangent)?;

            // Half keeps rolling forward, half follows the bounce
            let forward = self.momentum.scale(0.5).subtract_length(self.collision_drag)?;
            let deflected = bounced.scale(0.5).subtract_length(self.collision_drag)?;
            self.momentum = forward.add(&deflected)?;

            impulse = Some(
                tangent
                    .opposite()
                    .set_length(start_speed)?
                    .subtract_length(self.collision_drag)?,
            );
        }

        self.position = corrected;
        Ok(impulse)
    }
}
