//! Physics tuning
//!
//! Serialized as JSON. In the browser the settings persist in LocalStorage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{AngleUnit, DEFAULT_STEPS_PER_CURVE, VectorConfig};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

/// Ball size and drag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallSettings {
    pub radius: f64,
    /// Speed lost per millisecond of rolling
    pub drag: f64,
    /// Speed lost on every wall or ball impact
    pub collision_drag: f64,
    /// Speed of the random push a new ball starts with
    pub initial_speed: f64,
}

impl Default for BallSettings {
    fn default() -> Self {
        Self {
            radius: 25.0,
            drag: 0.0001,
            collision_drag: 0.03,
            initial_speed: 0.6,
        }
    }
}

/// Mapping from how long the player held to launch speed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    /// Hold time in milliseconds that yields a speed of 1
    pub time_to_force: f64,
    /// Launch speed cap
    pub max_force: f64,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            time_to_force: 1000.0,
            max_force: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ball: BallSettings,
    pub launch: LaunchSettings,
    /// Straight segments per Bezier curve when flattening shapes
    pub steps_per_curve: usize,
    /// Unit for angles in course data
    pub angle_unit: AngleUnit,
    /// Seed for random ball pushes
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ball: BallSettings::default(),
            launch: LaunchSettings::default(),
            steps_per_curve: DEFAULT_STEPS_PER_CURVE,
            angle_unit: AngleUnit::Radians,
            seed: 0x6d69_6e69_676f_6c66,
        }
    }
}

fn check(field: &'static str, requirement: &'static str, value: f64, ok: bool) -> Result<(), SettingsError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            requirement,
            value,
        })
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "minigolf_physics_settings";

    pub fn vector_config(&self) -> VectorConfig {
        VectorConfig {
            angles: self.angle_unit,
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let ball = &self.ball;
        check("ball.radius", "positive", ball.radius, ball.radius > 0.0)?;
        check("ball.drag", "non-negative", ball.drag, ball.drag >= 0.0)?;
        check(
            "ball.collision_drag",
            "non-negative",
            ball.collision_drag,
            ball.collision_drag >= 0.0,
        )?;
        check(
            "ball.initial_speed",
            "non-negative",
            ball.initial_speed,
            ball.initial_speed >= 0.0,
        )?;

        let launch = &self.launch;
        check(
            "launch.time_to_force",
            "positive",
            launch.time_to_force,
            launch.time_to_force > 0.0,
        )?;
        check("launch.max_force", "non-negative", launch.max_force, launch.max_force >= 0.0)?;

        let steps = self.steps_per_curve as f64;
        check("steps_per_curve", "at least 1", steps, self.steps_per_curve >= 1)?;
        Ok(())
    }

    /// Parse and validate; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring stored settings: {err}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native: read from a JSON file, defaults when it is missing or invalid
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(err) => {
                    log::warn!("Ignoring {}: {err}", path.display());
                    Self::default()
                }
            },
            Err(err) => {
                log::info!("Using default settings ({}: {err})", path.display());
                Self::default()
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No settings storage for {}, using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
