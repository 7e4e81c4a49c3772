//! Write-only link to the rendering layer

use glam::DVec2;

use super::entity::EntityId;

/// Receives entity transforms after every tick
pub trait SceneSink {
    fn update(&mut self, entity: EntityId, position: DVec2, angle: f64);
}

impl<F> SceneSink for F
where
    F: FnMut(EntityId, DVec2, f64),
{
    fn update(&mut self, entity: EntityId, position: DVec2, angle: f64) {
        self(entity, position, angle)
    }
}

/// Keeps the latest transform per entity
#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    pub transforms: Vec<(EntityId, DVec2, f64)>,
}

impl SceneSnapshot {
    pub fn get(&self, entity: EntityId) -> Option<(DVec2, f64)> {
        self.transforms
            .iter()
            .find(|(id, _, _)| *id == entity)
            .map(|&(_, position, angle)| (position, angle))
    }
}

impl SceneSink for SceneSnapshot {
    fn update(&mut self, entity: EntityId, position: DVec2, angle: f64) {
        match self.transforms.iter_mut().find(|(id, _, _)| *id == entity) {
            Some(entry) => *entry = (entity, position, angle),
            None => self.transforms.push((entity, position, angle)),
        }
    }
}
