//! Deterministic physics simulation
//!
//! Everything that moves lives here. This module must stay deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (arena slot order)
//! - No rendering or platform dependencies

pub mod ball;
pub mod collider;
pub mod course;
pub mod detector;
pub mod entity;
pub mod scene;
pub mod shape;
pub mod state;
pub mod tick;

pub use ball::{Ball, MotionState};
pub use collider::{Collider, ColliderError, ColliderId, ColliderOptions, CollisionOverlap};
pub use course::{Course, curved_concave_wall, obstacle_course, test_course};
pub use detector::{
    BodyDescriptor, BodyHandle, BodyShape, CollisionDetector, DetectorError, OverlapPair,
    ParryDetector,
};
pub use entity::{BreakableWall, CollisionReaction, Entity, EntityId, Hole, Wall};
pub use scene::{SceneSink, SceneSnapshot};
pub use shape::{Shape, ShapePreset};
pub use state::World;
pub use tick::{LaunchInput, TickInput, tick};
