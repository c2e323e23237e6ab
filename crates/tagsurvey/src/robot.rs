//! Robot-control boundary.
//!
//! Everything the pipeline needs from the flight software sits behind
//! `RobotBus`; the blocking waits sit behind `Pacer`. Implementations live on
//! the hardware side, tests script both in memory.

use std::time::Duration;

use nalgebra::{Point3, Quaternion};
use tagsurvey_core::{Frame, Pose};

/// Result of a single move command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveStatus {
    pub succeeded: bool,
}

/// Raw camera intrinsics as delivered by the boundary: a flattened row-major
/// 3×3 camera matrix plus an ordered distortion array. May be malformed;
/// parsing happens per undistortion call, never cached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawIntrinsics {
    pub camera_matrix: Vec<f64>,
    pub distortion: Vec<f64>,
}

/// The robot-control boundary.
pub trait RobotBus {
    /// Issue a single move command. `blocking` requests completion before
    /// return; the pipeline always passes `true` — there is exactly one
    /// in-flight motion command at any time.
    fn move_to(
        &self,
        position: &Point3<f64>,
        orientation: &Quaternion<f64>,
        blocking: bool,
    ) -> MoveStatus;

    /// Current robot pose, if kinematics are available.
    fn current_pose(&self) -> Option<Pose>;

    /// One camera frame, if the camera delivered a buffer.
    fn camera_frame(&self) -> Option<Frame>;

    /// Live camera intrinsics, fetched fresh per call.
    fn camera_intrinsics(&self) -> Option<RawIntrinsics>;

    /// Persist a debug image. Fire-and-forget: failures must never affect
    /// control flow, so there is nothing to observe.
    fn persist_debug_image(&self, _frame: &Frame, _label: &str) {}
}

/// Blocking wait primitive behind the settle, stabilization and retry
/// delays. A seam so tests can count waits instead of sleeping through them.
pub trait Pacer {
    fn pause(&self, duration: Duration);
}

/// Production pacer: parks the single control thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, duration: Duration) {
        log::debug!(target: "wait", "pausing for {}ms", duration.as_millis());
        std::thread::sleep(duration);
    }
}
