//! Frame step
//!
//! One tick: apply input, integrate every active entity, then let the
//! detector report overlaps and dispatch them one pair at a time.

use super::detector::CollisionDetector;
use super::entity::EntityId;
use super::state::World;
use crate::error::Result;
use crate::math::Vector;

/// A shot taken by the player
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchInput {
    pub ball: EntityId,
    /// World point the player aimed at
    pub target: Vector,
    /// How long the player held, in milliseconds
    pub magnitude: f64,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    pub launch: Option<LaunchInput>,
}

/// Advance the world by `dt` milliseconds
pub fn tick<D: CollisionDetector>(world: &mut World<D>, input: &TickInput, dt: f64) -> Result<()> {
    if let Some(launch) = &input.launch {
        world.launch(launch.ball, &launch.target, launch.magnitude)?;
    }

    world.integrate(dt)?;
    world.resolve_collisions()?;
    world.advance_clock(dt);
    Ok(())
}
