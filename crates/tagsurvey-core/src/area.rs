//! Survey areas: bounding boxes and derived search planes.
//!
//! The flight configuration describes each area as an axis-aligned box that
//! degenerates to a plane on one axis (the wall carrying the tags). The
//! center pose and facing direction are derived once at configuration load;
//! the resulting table is immutable afterwards.

use std::collections::HashMap;
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;

use nalgebra::{Point3, Quaternion};
use serde::Deserialize;

use crate::pose::{quat_xyzw, Pose};

/// Identifier of a survey area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct AreaId(pub u32);

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "area {}", self.0)
    }
}

/// Axis-aligned bounding box of an area, in station coordinates (meters).
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct AreaBounds {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl AreaBounds {
    /// Box midpoint.
    pub fn center(&self) -> Point3<f64> {
        Point3::new(
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
            (self.min[2] + self.max[2]) / 2.0,
        )
    }

    // Exact equality on purpose: the flight tables repeat the constant
    // coordinate verbatim on the degenerate axis.
    fn degenerate_axes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..3).filter(move |&i| self.min[i] == self.max[i])
    }
}

/// Facing direction of a search plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Facing {
    PosX,
    NegX,
    NegY,
    NegZ,
}

impl Facing {
    /// Orientation quaternion, under the identity-faces-+X convention.
    pub fn orientation(self) -> Quaternion<f64> {
        match self {
            Facing::PosX => quat_xyzw(0.0, 0.0, 0.0, 1.0),
            Facing::NegX => quat_xyzw(0.0, 0.0, 1.0, 0.0),
            Facing::NegY => quat_xyzw(0.0, 0.0, -FRAC_1_SQRT_2, FRAC_1_SQRT_2),
            Facing::NegZ => quat_xyzw(0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
        }
    }
}

/// Derived scan plane of an area: the box center plus the wall to face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchPlane {
    pub center: Point3<f64>,
    pub facing: Facing,
}

impl SearchPlane {
    /// Pose at the plane center, facing the wall.
    pub fn pose(&self) -> Pose {
        Pose::new(self.center, self.facing.orientation())
    }
}

/// Derive the search plane for a bounding box.
///
/// A box degenerate on exactly one axis faces that axis's designated wall
/// (Y-constant → −Y, X-constant → −X, Z-constant → −Z). Zero or more than
/// one degenerate axis falls back to the default facing (+X).
pub fn derive_search_plane(bounds: &AreaBounds) -> SearchPlane {
    let mut degenerate = bounds.degenerate_axes();
    let facing = match (degenerate.next(), degenerate.next()) {
        (Some(1), None) => Facing::NegY,
        (Some(0), None) => Facing::NegX,
        (Some(2), None) => Facing::NegZ,
        _ => Facing::PosX,
    };
    SearchPlane {
        center: bounds.center(),
        facing,
    }
}

/// One configured area: id plus bounding box.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct AreaSpec {
    pub id: AreaId,
    #[serde(flatten)]
    pub bounds: AreaBounds,
}

/// Immutable table of per-area search planes.
#[derive(Clone, Debug, Default)]
pub struct AreaTable {
    planes: HashMap<AreaId, SearchPlane>,
}

impl AreaTable {
    /// Derive every search plane once, at configuration load.
    pub fn from_specs(specs: &[AreaSpec]) -> Self {
        let planes = specs
            .iter()
            .map(|spec| (spec.id, derive_search_plane(&spec.bounds)))
            .collect();
        Self { planes }
    }

    pub fn plane(&self, id: AreaId) -> Option<&SearchPlane> {
        self.planes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }
}
