//! Core types and pure computation for the tagsurvey survey pipeline.
//!
//! This crate is intentionally small and hardware-free: poses and headings,
//! area bounding boxes with their derived search planes, grayscale image
//! buffers, and the pinhole camera model used for undistortion. It does *not*
//! talk to the robot-control boundary or to any detection backend.

mod area;
mod camera;
mod heading;
mod image;
mod logger;
mod pose;

pub use area::{
    derive_search_plane, AreaBounds, AreaId, AreaSpec, AreaTable, Facing, SearchPlane,
};
pub use camera::{
    undistort_image, CameraModel, Distortion, IntrinsicsError, PinholeIntrinsics,
};
pub use heading::CanonicalHeading;
pub use image::{sample_bilinear, sample_bilinear_u8, Frame, GrayImage, GrayImageView};
pub use pose::{is_near_unit, quat_xyzw, Pose, UNIT_NORM_TOLERANCE};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
