//! Crate-level error type

use thiserror::Error;

use crate::math::{PolygonError, VectorError};
use crate::settings::SettingsError;
use crate::sim::{ColliderError, DetectorError, EntityId};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Vector(#[from] VectorError),
    #[error(transparent)]
    Polygon(#[from] PolygonError),
    #[error(transparent)]
    Collider(#[from] ColliderError),
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("no entity with id {0:?}")]
    UnknownEntity(EntityId),
    #[error("entity {id:?} is a {kind}, not a ball")]
    NotABall { id: EntityId, kind: &'static str },
}

pub type Result<T> = std::result::Result<T, Error>;
