//! Pose value type and quaternion helpers.

use nalgebra::{Point3, Quaternion};

/// Tolerance on |‖q‖ − 1| for a quaternion to count as a valid orientation.
///
/// Wide enough to accept the truncated `0.707`-style literals that appear in
/// flight configuration tables.
pub const UNIT_NORM_TOLERANCE: f64 = 1e-3;

/// Build a quaternion from `(x, y, z, w)` components, the component order
/// used by the robot-control boundary and the configuration tables.
#[inline]
pub fn quat_xyzw(x: f64, y: f64, z: f64, w: f64) -> Quaternion<f64> {
    Quaternion::new(w, x, y, z)
}

/// Returns `true` when `q` has finite components and near-unit norm.
pub fn is_near_unit(q: &Quaternion<f64>) -> bool {
    q.coords.iter().all(|v| v.is_finite()) && (q.norm() - 1.0).abs() <= UNIT_NORM_TOLERANCE
}

/// A position (meters, station frame) + orientation pair.
///
/// An unknown pose is `Option<Pose>::None` at the robot-control boundary;
/// `Pose` itself always carries both fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Point3<f64>,
    pub orientation: Quaternion<f64>,
}

impl Pose {
    pub fn new(position: Point3<f64>, orientation: Quaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Finite position and near-unit orientation.
    ///
    /// A zero quaternion never denotes "unknown" — that state is expressed as
    /// an absent pose — so it fails this check like any other junk value.
    pub fn is_well_formed(&self) -> bool {
        self.position.coords.iter().all(|v| v.is_finite()) && is_near_unit(&self.orientation)
    }
}
