//! Canonical in-place scan headings.

use std::f64::consts::FRAC_1_SQRT_2;

use nalgebra::Quaternion;

use crate::pose::quat_xyzw;

/// One of the four fixed facing directions used for rotate-in-place scanning.
///
/// Orientations follow the body-frame convention where the identity
/// quaternion faces +X: −X is a 180° yaw, and ∓Z are ±90° pitches about the
/// Y axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CanonicalHeading {
    NegX,
    PosX,
    NegZ,
    PosZ,
}

impl CanonicalHeading {
    /// Fixed order in which a rotate-in-place scan visits the headings.
    pub const SCAN_ORDER: [CanonicalHeading; 4] = [
        CanonicalHeading::NegX,
        CanonicalHeading::PosX,
        CanonicalHeading::NegZ,
        CanonicalHeading::PosZ,
    ];

    /// Orientation quaternion for this heading.
    pub fn orientation(self) -> Quaternion<f64> {
        match self {
            CanonicalHeading::NegX => quat_xyzw(0.0, 0.0, 1.0, 0.0),
            CanonicalHeading::PosX => quat_xyzw(0.0, 0.0, 0.0, 1.0),
            CanonicalHeading::NegZ => quat_xyzw(0.0, FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
            CanonicalHeading::PosZ => quat_xyzw(0.0, -FRAC_1_SQRT_2, 0.0, FRAC_1_SQRT_2),
        }
    }

    /// Short label used in logs and debug-image names.
    pub fn label(self) -> &'static str {
        match self {
            CanonicalHeading::NegX => "neg_x",
            CanonicalHeading::PosX => "pos_x",
            CanonicalHeading::NegZ => "neg_z",
            CanonicalHeading::PosZ => "pos_z",
        }
    }
}
