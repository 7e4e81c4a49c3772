//! Course entities
//!
//! Entities are a closed enum. The collider layer talks to them through the
//! capability methods on [`Entity`] and never inspects the variants itself.

use super::ball::Ball;
use super::collider::{Collider, ColliderId, CollisionOverlap};
use crate::consts::{TAG_BALL, TAG_WALL};
use crate::math::{Vector, VectorResult};

slotmap::new_key_type! {
    /// Id of an entity in the world's entity arena
    pub struct EntityId;
}

/// What the world must do after an entity handled a collision
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionReaction {
    None,
    /// Add this momentum to the other collider's owner
    Impulse(Vector),
    /// Destroy the collider that reported the collision
    DestroySelf,
}

/// Immovable obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct Wall {
    pub position: Vector,
    pub angle: f64,
    pub collider: Option<ColliderId>,
}

impl Wall {
    pub fn new(position: Vector, angle: f64) -> Self {
        Self {
            position,
            angle,
            collider: None,
        }
    }
}

/// Wall that gives way after a number of ball hits
#[derive(Debug, Clone, PartialEq)]
pub struct BreakableWall {
    pub position: Vector,
    pub angle: f64,
    pub hitpoints: u32,
    pub full_hitpoints: u32,
    pub collider: Option<ColliderId>,
}

impl BreakableWall {
    pub fn new(position: Vector, angle: f64, hitpoints: u32) -> Self {
        let hitpoints = hitpoints.max(1);
        Self {
            position,
            angle,
            hitpoints,
            full_hitpoints: hitpoints,
            collider: None,
        }
    }

    /// Take one hit; true when this hit broke the wall
    pub fn hit(&mut self) -> bool {
        if self.hitpoints == 0 {
            return false;
        }
        self.hitpoints -= 1;
        self.hitpoints == 0
    }

    pub fn is_broken(&self) -> bool {
        self.hitpoints == 0
    }

    /// Remaining hitpoints as a fraction in `[0, 1]`
    pub fn integrity(&self) -> f64 {
        self.hitpoints as f64 / self.full_hitpoints as f64
    }
}

/// Target the ball has to come to rest in
#[derive(Debug, Clone, PartialEq)]
pub struct Hole {
    pub position: Vector,
    pub radius: f64,
    /// A ball lay completely inside the hole during the last frame
    pub ball_inside: bool,
    pub collider: Option<ColliderId>,
}

impl Hole {
    pub fn new(position: Vector, radius: f64) -> Self {
        Self {
            position,
            radius,
            ball_inside: false,
            collider: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Ball(Ball),
    Wall(Wall),
    BreakableWall(BreakableWall),
    Hole(Hole),
}

impl Entity {
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Ball(_) => "ball",
            Entity::Wall(_) => "wall",
            Entity::BreakableWall(_) => "breakable_wall",
            Entity::Hole(_) => "hole",
        }
    }

    /// Active entities are updated every frame and hear their collisions
    pub fn is_active(&self) -> bool {
        !matches!(self, Entity::Wall(_))
    }

    pub fn position(&self) -> &Vector {
        match self {
            Entity::Ball(ball) => &ball.position,
            Entity::Wall(wall) => &wall.position,
            Entity::BreakableWall(wall) => &wall.position,
            Entity::Hole(hole) => &hole.position,
        }
    }

    pub fn angle(&self) -> f64 {
        match self {
            Entity::Ball(ball) => ball.angle,
            Entity::Wall(wall) => wall.angle,
            Entity::BreakableWall(wall) => wall.angle,
            Entity::Hole(_) => 0.0,
        }
    }

    pub fn collider(&self) -> Option<ColliderId> {
        match self {
            Entity::Ball(ball) => ball.collider,
            Entity::Wall(wall) => wall.collider,
            Entity::BreakableWall(wall) => wall.collider,
            Entity::Hole(hole) => hole.collider,
        }
    }

    pub fn set_collider(&mut self, collider: Option<ColliderId>) {
        match self {
            Entity::Ball(ball) => ball.collider = collider,
            Entity::Wall(wall) => wall.collider = collider,
            Entity::BreakableWall(wall) => wall.collider = collider,
            Entity::Hole(hole) => hole.collider = collider,
        }
    }

    pub fn as_ball(&self) -> Option<&Ball> {
        match self {
            Entity::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_ball_mut(&mut self) -> Option<&mut Ball> {
        match self {
            Entity::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    /// Per-frame update, `dt` in milliseconds
    pub fn update(&mut self, dt: f64) -> VectorResult<()> {
        match self {
            Entity::Ball(ball) => ball.update(dt),
            Entity::Hole(hole) => {
                hole.ball_inside = false;
                Ok(())
            }
            Entity::Wall(_) | Entity::BreakableWall(_) => Ok(()),
        }
    }

    /// React to an overlap with `other`
    pub fn on_collision(
        &mut self,
        other: &Collider,
        overlap: &CollisionOverlap,
    ) -> VectorResult<CollisionReaction> {
        match self {
            Entity::Ball(ball) => {
                if other.has_tag(TAG_WALL) {
                    ball.bounce_off_wall(overlap)?;
                } else if other.has_tag(TAG_BALL) {
                    if let Some(impulse) = ball.bounce_off_ball(overlap)? {
                        return Ok(CollisionReaction::Impulse(impulse));
                    }
                }
                Ok(CollisionReaction::None)
            }
            Entity::BreakableWall(wall) => {
                if other.has_tag(TAG_BALL) && wall.hit() {
                    log::info!("Breakable wall at {} broke", wall.position);
                    return Ok(CollisionReaction::DestroySelf);
                }
                Ok(CollisionReaction::None)
            }
            Entity::Hole(hole) => {
                if other.has_tag(TAG_BALL) && overlap.inside_this {
                    hole.ball_inside = true;
                }
                Ok(CollisionReaction::None)
            }
            Entity::Wall(_) => Ok(CollisionReaction::None),
        }
    }
}
