//! Geometry primitives
//!
//! - `vector`: immutable N-dimensional vectors and points
//! - `angle`: angle units and the angle-aware vector config
//! - `curve`: Bezier evaluation and curvable polygon flattening

pub mod angle;
pub mod curve;
pub mod vector;

pub use angle::{AngleUnit, VectorConfig, degrees_to_radians, radians_to_degrees};
pub use curve::{
    CurvablePoint, DEFAULT_STEPS_PER_CURVE, PolygonError, cubic_bezier_points, de_casteljau,
    flatten,
};
pub use vector::{DEFAULT_PRECISION, Point, Vector, VectorError, VectorResult, round_to_decimals};
