//! Frame acquisition with retry/backoff, and best-effort undistortion.

use tagsurvey_core::{undistort_image, AreaId, CameraModel, Frame, IntrinsicsError};

use crate::config::CaptureConfig;
use crate::robot::{Pacer, RobotBus};

/// Why an undistortion call passed the original frame through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassThroughReason {
    EmptyFrame,
    MissingIntrinsics,
    MalformedCameraMatrix,
    RemapFailed,
}

/// Result of a best-effort undistortion. Undistortion is an enhancement for
/// downstream detection, never a hard requirement, so both variants carry a
/// usable frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Undistorted {
    /// A newly allocated corrected buffer (capture timestamp preserved).
    Corrected(Frame),
    /// The input frame, untouched.
    PassThrough(Frame, PassThroughReason),
}

impl Undistorted {
    pub fn frame(&self) -> &Frame {
        match self {
            Undistorted::Corrected(frame) | Undistorted::PassThrough(frame, _) => frame,
        }
    }

    pub fn into_frame(self) -> Frame {
        match self {
            Undistorted::Corrected(frame) | Undistorted::PassThrough(frame, _) => frame,
        }
    }

    pub fn is_corrected(&self) -> bool {
        matches!(self, Undistorted::Corrected(_))
    }
}

/// Acquires camera frames and removes lens distortion.
pub struct FrameAcquirer<'a> {
    robot: &'a dyn RobotBus,
    pacer: &'a dyn Pacer,
    config: CaptureConfig,
    debug_mode: bool,
}

impl<'a> FrameAcquirer<'a> {
    pub fn new(
        robot: &'a dyn RobotBus,
        pacer: &'a dyn Pacer,
        config: CaptureConfig,
        debug_mode: bool,
    ) -> Self {
        Self {
            robot,
            pacer,
            config,
            debug_mode,
        }
    }

    /// Capture one frame, waiting out camera stabilization before every
    /// attempt (the first included). Returns `None` after the attempt bound
    /// is exhausted, never an empty placeholder buffer.
    pub fn acquire(&self) -> Option<Frame> {
        log::debug!(target: "nav_cam", "attempting to capture a camera frame");

        for attempt in 1..=self.config.max_attempts {
            self.pacer.pause(self.config.stabilization_wait());

            match self.robot.camera_frame() {
                Some(frame) if !frame.is_empty() => return Some(frame),
                _ => {}
            }

            log::debug!(target: "nav_cam", "frame fetch failed (attempt {attempt}), retrying");
            self.pacer.pause(self.config.retry_wait());
        }

        log::warn!(target: "nav_cam", "failed to capture a camera frame");
        None
    }

    /// Remove lens distortion using intrinsics fetched fresh from the
    /// boundary. Best-effort: a malformed camera matrix or a failed remap
    /// passes the original frame through unchanged. The input is never
    /// mutated.
    pub fn undistort(&self, frame: Frame, area: AreaId) -> Undistorted {
        if frame.is_empty() {
            log::error!(target: "undistort", "source frame for {area} is empty");
            return Undistorted::PassThrough(frame, PassThroughReason::EmptyFrame);
        }

        let Some(raw) = self.robot.camera_intrinsics() else {
            log::error!(target: "undistort", "no camera intrinsics available for {area}");
            return Undistorted::PassThrough(frame, PassThroughReason::MissingIntrinsics);
        };

        // The camera matrix is mandatory; distortion coefficients are not.
        if raw.distortion.len() < 5 {
            log::warn!(
                target: "undistort",
                "distortion array has {} coefficients, expected 5",
                raw.distortion.len()
            );
        }

        let model = match CameraModel::from_raw(&raw.camera_matrix, &raw.distortion) {
            Ok(model) => model,
            Err(err @ IntrinsicsError::TruncatedCameraMatrix { .. }) => {
                log::error!(target: "undistort", "{err}; keeping distorted frame for {area}");
                return Undistorted::PassThrough(frame, PassThroughReason::MalformedCameraMatrix);
            }
            Err(err) => {
                log::error!(target: "undistort", "{err}; keeping distorted frame for {area}");
                return Undistorted::PassThrough(frame, PassThroughReason::RemapFailed);
            }
        };

        let corrected = Frame {
            image: undistort_image(&frame.view(), &model),
            captured_at: frame.captured_at,
        };
        log::debug!(target: "undistort", "frame for {area} undistorted");

        if self.debug_mode {
            self.robot
                .persist_debug_image(&corrected, &format!("undistorted_area_{}", area.0));
        }

        Undistorted::Corrected(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::robot::{MoveStatus, RawIntrinsics};
    use nalgebra::{Point3, Quaternion};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;
    use tagsurvey_core::{GrayImage, Pose};

    struct ScriptedCamera {
        frames: RefCell<VecDeque<Option<Frame>>>,
        intrinsics: Option<RawIntrinsics>,
    }

    impl ScriptedCamera {
        fn with_frames(frames: Vec<Option<Frame>>) -> Self {
            Self {
                frames: RefCell::new(frames.into()),
                intrinsics: None,
            }
        }
    }

    impl RobotBus for ScriptedCamera {
        fn move_to(
            &self,
            _position: &Point3<f64>,
            _orientation: &Quaternion<f64>,
            _blocking: bool,
        ) -> MoveStatus {
            MoveStatus { succeeded: true }
        }

        fn current_pose(&self) -> Option<Pose> {
            None
        }

        fn camera_frame(&self) -> Option<Frame> {
            self.frames.borrow_mut().pop_front().flatten()
        }

        fn camera_intrinsics(&self) -> Option<RawIntrinsics> {
            self.intrinsics.clone()
        }
    }

    #[derive(Default)]
    struct CountingPacer {
        pauses: RefCell<Vec<Duration>>,
    }

    impl Pacer for CountingPacer {
        fn pause(&self, duration: Duration) {
            self.pauses.borrow_mut().push(duration);
        }
    }

    fn config() -> CaptureConfig {
        CaptureConfig {
            max_attempts: 3,
            stabilization_wait_ms: 2000,
            retry_wait_ms: 500,
        }
    }

    const STABILIZE: Duration = Duration::from_millis(2000);
    const RETRY: Duration = Duration::from_millis(500);

    fn frame() -> Frame {
        Frame::now(GrayImage::filled(8, 8, 40))
    }

    #[test]
    fn stabilizes_before_every_attempt_and_returns_second_try_frame() {
        let robot = ScriptedCamera::with_frames(vec![None, Some(frame())]);
        let pacer = CountingPacer::default();
        let acquirer = FrameAcquirer::new(&robot, &pacer, config(), false);

        let captured = acquirer.acquire().expect("frame on second attempt");
        assert_eq!(captured.image.data[0], 40);
        assert_eq!(*pacer.pauses.borrow(), vec![STABILIZE, RETRY, STABILIZE]);
    }

    #[test]
    fn empty_buffers_count_as_failed_captures() {
        let empty = Frame::now(GrayImage::filled(0, 0, 0));
        let robot = ScriptedCamera::with_frames(vec![Some(empty), Some(frame())]);
        let pacer = CountingPacer::default();
        let acquirer = FrameAcquirer::new(&robot, &pacer, config(), false);

        assert!(acquirer.acquire().is_some());
        assert_eq!(pacer.pauses.borrow().len(), 3); // stabilize, retry, stabilize
    }

    #[test]
    fn exhausted_attempts_return_none() {
        let robot = ScriptedCamera::with_frames(vec![None, None, None]);
        let pacer = CountingPacer::default();
        let acquirer = FrameAcquirer::new(&robot, &pacer, config(), false);

        assert!(acquirer.acquire().is_none());
        assert_eq!(
            *pacer.pauses.borrow(),
            vec![STABILIZE, RETRY, STABILIZE, RETRY, STABILIZE, RETRY]
        );
    }

    #[test]
    fn truncated_camera_matrix_passes_the_frame_through() {
        let mut robot = ScriptedCamera::with_frames(vec![]);
        robot.intrinsics = Some(RawIntrinsics {
            camera_matrix: vec![523.1, 0.0, 635.4],
            distortion: vec![0.0; 5],
        });
        let pacer = CountingPacer::default();
        let acquirer = FrameAcquirer::new(&robot, &pacer, config(), false);

        let input = frame();
        match acquirer.undistort(input.clone(), AreaId(2)) {
            Undistorted::PassThrough(out, PassThroughReason::MalformedCameraMatrix) => {
                assert_eq!(out, input);
            }
            other => panic!("expected malformed-matrix pass-through, got {other:?}"),
        }
    }

    #[test]
    fn missing_intrinsics_and_empty_frames_pass_through() {
        let robot = ScriptedCamera::with_frames(vec![]);
        let pacer = CountingPacer::default();
        let acquirer = FrameAcquirer::new(&robot, &pacer, config(), false);

        match acquirer.undistort(frame(), AreaId(1)) {
            Undistorted::PassThrough(_, PassThroughReason::MissingIntrinsics) => {}
            other => panic!("expected missing-intrinsics pass-through, got {other:?}"),
        }

        let empty = Frame::now(GrayImage::filled(0, 0, 0));
        match acquirer.undistort(empty, AreaId(1)) {
            Undistorted::PassThrough(_, PassThroughReason::EmptyFrame) => {}
            other => panic!("expected empty-frame pass-through, got {other:?}"),
        }
    }

    #[test]
    fn zero_distortion_identity_intrinsics_correct_without_changing_pixels() {
        let mut robot = ScriptedCamera::with_frames(vec![]);
        robot.intrinsics = Some(RawIntrinsics {
            camera_matrix: vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            // Short array: tolerated, zero-padded.
            distortion: vec![0.0, 0.0],
        });
        let pacer = CountingPacer::default();
        let acquirer = FrameAcquirer::new(&robot, &pacer, config(), false);

        let input = frame();
        let out = acquirer.undistort(input.clone(), AreaId(3));
        assert!(out.is_corrected());
        assert_eq!(out.frame().image, input.image);
        assert_eq!(out.frame().captured_at, input.captured_at);
    }
}
