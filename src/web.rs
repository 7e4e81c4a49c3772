//! Browser bindings
//!
//! A thin wasm-bindgen wrapper around [`World`]. Entity ids cross the
//! boundary as their `u64` FFI form.

use slotmap::{Key, KeyData};
use wasm_bindgen::prelude::*;

use crate::math::Vector;
use crate::settings::Settings;
use crate::sim::{EntityId, SceneSink, TickInput, World, obstacle_course, test_course, tick};

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn entity_id(ffi: u64) -> EntityId {
    EntityId::from(KeyData::from_ffi(ffi))
}

/// Flattened `[x, y, angle]` triples plus their entity ids
#[derive(Default)]
struct FlatScene {
    ids: Vec<u64>,
    transforms: Vec<f64>,
}

impl SceneSink for FlatScene {
    fn update(&mut self, entity: EntityId, position: glam::DVec2, angle: f64) {
        self.ids.push(entity.data().as_ffi());
        self.transforms.extend([position.x, position.y, angle]);
    }
}

#[wasm_bindgen]
pub struct MinigolfWorld {
    world: World,
    scene: FlatScene,
}

#[wasm_bindgen]
impl MinigolfWorld {
    /// Uses the LocalStorage settings when no JSON is given
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<MinigolfWorld, JsValue> {
        let settings = match settings_json {
            Some(json) => Settings::from_json(&json).map_err(js_error)?,
            None => Settings::load(),
        };
        Ok(Self {
            world: World::new(settings),
            scene: FlatScene::default(),
        })
    }

    /// Build a demo course and return the id of its ball
    #[wasm_bindgen(js_name = loadCourse)]
    pub fn load_course(&mut self, name: &str) -> Result<u64, JsValue> {
        let course = match name {
            "obstacles" => obstacle_course(&mut self.world),
            "test" => test_course(&mut self.world),
            other => return Err(JsValue::from_str(&format!("unknown course {other}"))),
        }
        .map_err(js_error)?;
        course
            .balls
            .first()
            .map(|id| id.data().as_ffi())
            .ok_or_else(|| JsValue::from_str("course has no ball"))
    }

    pub fn launch(&mut self, ball: u64, x: f64, y: f64, magnitude: f64) -> Result<(), JsValue> {
        self.world
            .launch(entity_id(ball), &Vector::new_2d(x, y), magnitude)
            .map_err(js_error)
    }

    /// Advance `dt` milliseconds and refresh the published transforms
    pub fn tick(&mut self, dt: f64) -> Result<(), JsValue> {
        tick(&mut self.world, &TickInput::default(), dt).map_err(js_error)?;
        self.scene = FlatScene::default();
        self.world.publish(&mut self.scene).map_err(js_error)
    }

    #[wasm_bindgen(js_name = entityIds)]
    pub fn entity_ids(&self) -> Vec<u64> {
        self.scene.ids.clone()
    }

    pub fn transforms(&self) -> js_sys::Float64Array {
        js_sys::Float64Array::from(self.scene.transforms.as_slice())
    }

    #[wasm_bindgen(js_name = saveSettings)]
    pub fn save_settings(&self) {
        self.world.settings().save();
    }
}
