//! Free-flyer area survey pipeline.
//!
//! Drives a free-flying robot through inspection areas aboard a station
//! module, captures camera frames at controlled vantage points, and detects
//! square fiducial markers in them. The pipeline is built from three layers
//! behind one hardware seam:
//!
//! - [`motion::MotionExecutor`] — pose-targeted moves with bounded retries
//!   and a post-success settle delay;
//! - [`capture::FrameAcquirer`] — frame acquisition with stabilization waits
//!   and best-effort lens undistortion from live intrinsics;
//! - [`detect::TagScanner`] — fiducial detection through a pluggable backend,
//!   degrading to empty detections instead of faulting;
//! - [`survey::AreaSurveyor`] — the two protocols the mission script calls:
//!   rotate-and-scan-until-found and single-shot fixed-plane capture.
//!
//! Everything is single-threaded and cooperative-by-blocking: waits park the
//! one control thread so the robot never sees overlapping commands. All
//! hardware access goes through [`robot::RobotBus`], which tests script in
//! memory.

pub mod capture;
pub mod config;
pub mod detect;
pub mod motion;
pub mod robot;
pub mod survey;

pub use tagsurvey_aruco as aruco;
pub use tagsurvey_core as core;

pub use tagsurvey_core::{AreaId, AreaTable, CanonicalHeading, Frame, Pose};

pub use capture::{FrameAcquirer, PassThroughReason, Undistorted};
pub use config::{CaptureConfig, ConfigError, DetectionConfig, MotionConfig, SurveyConfig};
pub use detect::{
    BackendError, FiducialDetector, GridScanDetector, TagDetection, TagObservation, TagScanner,
};
pub use motion::{MotionExecutor, MoveOutcome};
pub use robot::{MoveStatus, Pacer, RawIntrinsics, RobotBus, ThreadPacer};
pub use survey::{AreaSurveyor, ScannedFrame};
