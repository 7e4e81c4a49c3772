//! Immutable N-dimensional vector
//!
//! Every operation returns a new `Vector`; nothing mutates in place. Most
//! geometry is 2D, a few operations (cross product, 3D points) need 3D.
//! Angles are always radians here; see [`super::angle::VectorConfig`] for
//! degree-aware wrappers.

use std::fmt;

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Default number of decimals used by `matches` and friends
pub const DEFAULT_PRECISION: u32 = 3;

/// Errors raised by vector operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VectorError {
    #[error("vector was given no components")]
    Construction,
    #[error("vector has no component at index {index}")]
    MissingComponent { index: usize },
    #[error("{operation} needs {expected}D vectors, got {found}D")]
    DimensionMismatch {
        operation: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("cannot {operation} a vector with no length")]
    ZeroLength { operation: &'static str },
}

pub type VectorResult<T> = Result<T, VectorError>;

/// Serializable projection of a vector, used in shape definitions
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// Round `value` to `decimals` decimal places
#[inline]
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// An ordered list of at least one real component
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    components: SmallVec<[f64; 3]>,
}

impl Vector {
    /// Build a vector from its components, failing on an empty list
    pub fn new<I>(components: I) -> VectorResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let components: SmallVec<[f64; 3]> = components.into_iter().collect();
        if components.is_empty() {
            return Err(VectorError::Construction);
        }
        Ok(Self { components })
    }

    pub fn new_2d(x: f64, y: f64) -> Self {
        Self {
            components: SmallVec::from_slice(&[x, y]),
        }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            components: SmallVec::from_slice(&[x, y, z]),
        }
    }

    /// Zero vector with the given number of dimensions
    pub fn zero(dimensions: usize) -> VectorResult<Self> {
        Self::new(std::iter::repeat_n(0.0, dimensions))
    }

    /// The 2D origin
    pub fn zero_2d() -> Self {
        Self::new_2d(0.0, 0.0)
    }

    /// 2D vector for a point, 3D when the point carries a z
    pub fn from_point(point: &Point) -> Self {
        match point.z {
            Some(z) => Self::new_3d(point.x, point.y, z),
            None => Self::new_2d(point.x, point.y),
        }
    }

    /// Unit vector `(sin a, cos a)` for an angle in radians
    pub fn from_angle(radians: f64) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new_2d(sin, cos)
    }

    /// Random 2D unit vector
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let candidate = Self::new_2d(rng.random::<f64>() - 0.5, rng.random::<f64>() - 0.5);
            if let Ok(unit) = candidate.normalize() {
                return unit;
            }
        }
    }

    pub fn components(&self) -> &[f64] {
        &self.components
    }

    /// 2 = 2D vector, 3 = 3D vector, and so on
    pub fn dimensions(&self) -> usize {
        self.components.len()
    }

    pub fn x(&self) -> f64 {
        self.components[0]
    }

    pub fn y(&self) -> VectorResult<f64> {
        self.component(1)
    }

    pub fn z(&self) -> VectorResult<f64> {
        self.component(2)
    }

    pub fn component(&self, index: usize) -> VectorResult<f64> {
        self.components
            .get(index)
            .copied()
            .ok_or(VectorError::MissingComponent { index })
    }

    pub fn length(&self) -> f64 {
        self.components.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// Alias for `length`
    pub fn magnitude(&self) -> f64 {
        self.length()
    }

    pub fn is_zero(&self) -> bool {
        self.length() == 0.0
    }

    /// Point projection; dimensions past the third are dropped
    pub fn to_point(&self) -> VectorResult<Point> {
        match self.components.as_slice() {
            [x, y] => Ok(Point::new(*x, *y)),
            [x, y, z, rest @ ..] => {
                if !rest.is_empty() {
                    log::warn!(
                        "{}D vector truncated to a 3D point",
                        self.dimensions()
                    );
                }
                Ok(Point::new_3d(*x, *y, *z))
            }
            _ => Err(VectorError::DimensionMismatch {
                operation: "to_point",
                expected: 2,
                found: self.dimensions(),
            }),
        }
    }

    pub fn to_dvec2(&self) -> VectorResult<DVec2> {
        let (x, y) = self.xy("to_dvec2")?;
        Ok(DVec2::new(x, y))
    }

    pub fn add(&self, other: &Self) -> VectorResult<Self> {
        self.zip_with(other, "add", |a, b| a + b)
    }

    pub fn subtract(&self, other: &Self) -> VectorResult<Self> {
        self.zip_with(other, "subtract", |a, b| a - b)
    }

    pub fn scale(&self, scalar: f64) -> Self {
        self.map(|c| c * scalar)
    }

    pub fn divide(&self, scalar: f64) -> Self {
        self.map(|c| c / scalar)
    }

    /// Apply `f` to every component
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            components: self.components.iter().map(|&c| f(c)).collect(),
        }
    }

    pub fn normalize(&self) -> VectorResult<Self> {
        let length = self.length();
        if length == 0.0 {
            return Err(VectorError::ZeroLength {
                operation: "normalize",
            });
        }
        Ok(self.divide(length))
    }

    /// Like `normalize`, but a zero vector comes back unchanged
    pub fn normalize_or_remain(&self) -> Self {
        self.normalize().unwrap_or_else(|_| self.clone())
    }

    pub fn dot(&self, other: &Self) -> VectorResult<f64> {
        self.same_dimensions(other, "dot")?;
        Ok(self
            .components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| a * b)
            .sum())
    }

    pub fn cross(&self, other: &Self) -> VectorResult<Self> {
        let [ax, ay, az] = self.xyz("cross")?;
        let [bx, by, bz] = other.xyz("cross")?;
        Ok(Self::new_3d(
            ay * bz - az * by,
            az * bx - ax * bz,
            ax * by - ay * bx,
        ))
    }

    /// Standard rotation matrix applied to a 2D vector
    pub fn rotate(&self, radians: f64) -> VectorResult<Self> {
        let (x, y) = self.xy("rotate")?;
        let (sin, cos) = radians.sin_cos();
        Ok(Self::new_2d(cos * x - sin * y, sin * x + cos * y))
    }

    pub fn rotate_around_anchor(&self, radians: f64, anchor: &Self) -> VectorResult<Self> {
        self.subtract(anchor)?.rotate(radians)?.add(anchor)
    }

    /// Clockwise perpendicular `(-y, x)`
    pub fn perpendicular(&self) -> VectorResult<Self> {
        self.perpendicular_2d(true)
    }

    pub fn perpendicular_2d(&self, clockwise: bool) -> VectorResult<Self> {
        let (x, y) = self.xy("perpendicular_2d")?;
        if clockwise {
            Ok(Self::new_2d(-y, x))
        } else {
            Ok(Self::new_2d(y, -x))
        }
    }

    /// Negate the component at `index`
    pub fn flip_component(&self, index: usize) -> VectorResult<Self> {
        self.component(index)?;
        let mut flipped = self.clone();
        flipped.components[index] = -flipped.components[index];
        Ok(flipped)
    }

    pub fn flip_x(&self) -> Self {
        let mut flipped = self.clone();
        flipped.components[0] = -flipped.components[0];
        flipped
    }

    pub fn flip_y(&self) -> VectorResult<Self> {
        self.flip_component(1)
    }

    pub fn flip_z(&self) -> VectorResult<Self> {
        self.flip_component(2)
    }

    /// Negate every component
    pub fn flip(&self) -> Self {
        self.map(|c| -c)
    }

    /// Same as `flip`: points the other way
    pub fn opposite(&self) -> Self {
        self.flip()
    }

    /// Midpoint between two position vectors
    pub fn middle(&self, other: &Self) -> VectorResult<Self> {
        Ok(self.add(other)?.divide(2.0))
    }

    pub fn distance(&self, other: &Self) -> VectorResult<f64> {
        let (ax, ay) = self.xy("distance")?;
        let (bx, by) = other.xy("distance")?;
        Ok(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
    }

    /// `atan2(dx, dy)` of `self - other`
    pub fn angle_to(&self, other: &Self) -> VectorResult<f64> {
        self.xy("angle_to")?;
        other.xy("angle_to")?;
        let diff = self.subtract(other)?;
        let (dx, dy) = diff.xy("angle_to")?;
        Ok(dx.atan2(dy))
    }

    /// Clockwise angle from "up" `(0, -1)`, in `[0, 2π)`
    pub fn to_angle(&self) -> VectorResult<f64> {
        let (x, _) = self.xy("to_angle")?;
        let length = self.length();
        if length == 0.0 {
            return Err(VectorError::ZeroLength {
                operation: "measure the angle of",
            });
        }

        let up = Self::new_2d(0.0, -1.0);
        let cos = (self.dot(&up)? / length).clamp(-1.0, 1.0);
        let mut radians = cos.acos();
        // Left half-plane continues clockwise past π
        if x <= 0.0 {
            radians = std::f64::consts::TAU - radians;
        }
        Ok(radians.rem_euclid(std::f64::consts::TAU))
    }

    pub fn is_near(&self, other: &Self, distance: f64) -> VectorResult<bool> {
        Ok(self.distance(other)? <= distance)
    }

    /// Mirror this position vector through `point`
    pub fn reflect_over_point(&self, point: &Self) -> VectorResult<Self> {
        let distance = self.distance(point)?;
        let direction = point.subtract(self)?.normalize_or_remain();
        self.add(&direction.scale(distance * 2.0))
    }

    /// Component-wise equality after rounding to `precision` decimals
    pub fn matches(&self, other: &Self, precision: u32) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| round_to_decimals(*a, precision) == round_to_decimals(*b, precision))
    }

    pub fn matches_direction(&self, other: &Self, precision: u32) -> bool {
        self.normalize_or_remain()
            .matches(&other.normalize_or_remain(), precision)
    }

    /// Same or exactly opposite direction
    pub fn is_parallel_to(&self, other: &Self, precision: u32) -> VectorResult<bool> {
        if self.is_zero() || other.is_zero() {
            return Err(VectorError::ZeroLength {
                operation: "compare the direction of",
            });
        }
        Ok(self.matches_direction(other, precision)
            || self.matches_direction(&other.opposite(), precision))
    }

    /// Orthogonal projection onto the infinite line through `start` and `end`
    pub fn project_to_line_segment(&self, start: &Self, end: &Self) -> VectorResult<Self> {
        let ab = end.subtract(start)?;
        let ac = self.subtract(start)?;
        let ab_sq = ab.dot(&ab)?;
        if ab_sq == 0.0 {
            return Err(VectorError::ZeroLength {
                operation: "project onto",
            });
        }
        let ad = ab.scale(ac.dot(&ab)?).divide(ab_sq);
        start.add(&ad)
    }

    pub fn set_length(&self, length: f64) -> VectorResult<Self> {
        if self.is_zero() {
            return Err(VectorError::ZeroLength {
                operation: "set the length of",
            });
        }
        Ok(self.normalize()?.scale(length))
    }

    pub fn add_length(&self, addition: f64) -> VectorResult<Self> {
        if addition < 0.0 {
            return self.subtract_length(-addition);
        }
        if self.is_zero() {
            return Err(VectorError::ZeroLength {
                operation: "add length to",
            });
        }
        self.set_length(self.length() + addition)
    }

    /// Shrink the magnitude, clamping at the zero vector
    pub fn subtract_length(&self, subtraction: f64) -> VectorResult<Self> {
        if subtraction < 0.0 {
            return self.add_length(-subtraction);
        }
        let length = self.length();
        if length == 0.0 {
            return Ok(self.clone());
        }

        let new_length = length - subtraction;
        if new_length < 0.0 {
            return Self::zero(self.dimensions());
        }
        self.set_length(new_length)
    }

    /// Step `distance` towards `target`; a copy when both already match
    pub fn move_towards(&self, target: &Self, distance: f64) -> VectorResult<Self> {
        if self.matches(target, DEFAULT_PRECISION) {
            log::debug!("move_towards on identical vectors {self}, nothing changed");
            return Ok(self.clone());
        }
        let step = target.subtract(self)?.normalize()?.scale(distance);
        self.add(&step)
    }

    /// Step `distance` away from `target`; a copy when both already match
    pub fn move_away_from(&self, target: &Self, distance: f64) -> VectorResult<Self> {
        if self.matches(target, DEFAULT_PRECISION) {
            log::debug!("move_away_from on identical vectors {self}, nothing changed");
            return Ok(self.clone());
        }
        let step = self.subtract(target)?.normalize()?.scale(distance);
        self.add(&step)
    }

    /// Reflect this vector's direction across `line`, keeping its length
    pub fn bounce_off_line(&self, line: &Self) -> VectorResult<Self> {
        let line_direction = line.normalize()?;
        let direction = self.normalize()?;
        let (lx, ly) = line_direction.xy("bounce_off_line")?;
        let (dx, dy) = direction.xy("bounce_off_line")?;

        let double_dot = line_direction.dot(&direction)? * 2.0;
        let reflection = Self::new_2d(lx * double_dot - dx, ly * double_dot - dy);
        reflection.set_length(self.length())
    }

    fn xy(&self, operation: &'static str) -> VectorResult<(f64, f64)> {
        match self.components.as_slice() {
            [x, y] => Ok((*x, *y)),
            _ => Err(VectorError::DimensionMismatch {
                operation,
                expected: 2,
                found: self.dimensions(),
            }),
        }
    }

    fn xyz(&self, operation: &'static str) -> VectorResult<[f64; 3]> {
        match self.components.as_slice() {
            [x, y, z] => Ok([*x, *y, *z]),
            _ => Err(VectorError::DimensionMismatch {
                operation,
                expected: 3,
                found: self.dimensions(),
            }),
        }
    }

    fn same_dimensions(&self, other: &Self, operation: &'static str) -> VectorResult<()> {
        if self.dimensions() != other.dimensions() {
            return Err(VectorError::DimensionMismatch {
                operation,
                expected: self.dimensions(),
                found: other.dimensions(),
            });
        }
        Ok(())
    }

    fn zip_with<F>(&self, other: &Self, operation: &'static str, f: F) -> VectorResult<Self>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.same_dimensions(other, operation)?;
        Ok(Self {
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}

impl From<DVec2> for Vector {
    fn from(value: DVec2) -> Self {
        Self::new_2d(value.x, value.y)
    }
}

impl From<Point> for Vector {
    fn from(value: Point) -> Self {
        Self::from_point(&value)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{component}")?;
        }
        write!(f, ")")
    }
}
