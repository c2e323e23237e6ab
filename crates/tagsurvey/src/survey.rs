//! The two area-survey protocols, composed from motion, capture and
//! detection.
//!
//! Both protocols degrade per unit of work: a failed rotation skips one
//! heading, an unknown area yields no frame, and the enclosing mission loop
//! keeps running either way.

use tagsurvey_core::{AreaId, AreaTable, CanonicalHeading, Frame, Pose};

use crate::capture::FrameAcquirer;
use crate::config::SurveyConfig;
use crate::detect::{FiducialDetector, TagScanner};
use crate::motion::MotionExecutor;
use crate::robot::{Pacer, RobotBus};

/// A frame captured during a rotate-in-place scan, labeled with its heading.
#[derive(Clone, Debug)]
pub struct ScannedFrame {
    pub heading: CanonicalHeading,
    pub frame: Frame,
}

/// Progress of one heading during a rotate-in-place scan.
enum HeadingOutcome {
    Captured(Frame),
    MoveSkipped,
    CaptureFailed,
}

/// Composes the pipeline into the two survey protocols.
pub struct AreaSurveyor<'a> {
    robot: &'a dyn RobotBus,
    motion: MotionExecutor<'a>,
    acquirer: FrameAcquirer<'a>,
    scanner: TagScanner<'a>,
    areas: &'a AreaTable,
}

impl<'a> AreaSurveyor<'a> {
    pub fn new(
        robot: &'a dyn RobotBus,
        pacer: &'a dyn Pacer,
        backend: &'a dyn FiducialDetector,
        config: &SurveyConfig,
        areas: &'a AreaTable,
    ) -> Self {
        Self {
            robot,
            motion: MotionExecutor::new(robot, pacer, config.motion.clone()),
            acquirer: FrameAcquirer::new(robot, pacer, config.capture.clone(), config.debug_mode),
            scanner: TagScanner::new(robot, backend, config.debug_mode),
            areas,
        }
    }

    /// Rotate-and-scan-until-found: move to the area's entry pose, rotate in
    /// place through the four canonical headings capturing one frame per
    /// heading, then return the first captured frame (in heading order)
    /// bearing at least one marker. Detection runs on the undistorted
    /// rendition of each frame; the returned frame is the raw capture.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, entry), fields(area = %area))
    )]
    pub fn scan_area_for_markers(&self, area: AreaId, entry: &Pose) -> Option<ScannedFrame> {
        log::debug!(target: "area_scan", "processing {area}");

        if !self.motion.move_to(entry).is_success() {
            log::error!(target: "area_scan", "failed to reach the entry pose of {area}");
            return None;
        }

        for (heading, outcome) in self.rotate_and_capture() {
            let HeadingOutcome::Captured(frame) = outcome else {
                continue;
            };
            let corrected = self.acquirer.undistort(frame.clone(), area);
            let detection = self.scanner.detect(Some(corrected.frame()), area);
            if detection.is_empty() {
                log::debug!(
                    target: "area_scan",
                    "{area} [{}]: no markers detected",
                    heading.label()
                );
                continue;
            }

            log::debug!(
                target: "area_scan",
                "{area} [{}]: found {} marker(s)",
                heading.label(),
                detection.len()
            );
            return Some(ScannedFrame { heading, frame });
        }

        None
    }

    /// Fixed-plane scan: approach the area, rotate in place toward its
    /// derived search plane, and capture a single frame. Undistortion and
    /// detection on that frame are the caller's responsibility.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, entry), fields(area = %area))
    )]
    pub fn scan_area_plane(&self, area: AreaId, entry: &Pose) -> Option<Frame> {
        log::debug!(target: "plane_scan", "processing the search plane of {area}");

        // The robot may already be close enough; a failed approach is not
        // fatal to the capture attempt.
        if !self.motion.move_to(entry).is_success() {
            log::warn!(
                target: "plane_scan",
                "entry move for {area} failed, proceeding from the current pose"
            );
        }

        let Some(plane) = self.areas.plane(area) else {
            log::error!(target: "plane_scan", "no search plane configured for {area}");
            return None;
        };

        let Some(pose) = self.robot.current_pose() else {
            log::error!(target: "plane_scan", "current position unavailable");
            return None;
        };

        let target = Pose::new(pose.position, plane.facing.orientation());
        if !self.motion.move_to(&target).is_success() {
            log::error!(target: "plane_scan", "failed to face the search plane of {area}");
            return None;
        }

        self.acquirer.acquire()
    }

    /// Rotate in place through the canonical headings, capturing at most one
    /// frame per heading. A failed rotation or capture skips that heading
    /// rather than aborting the scan.
    fn rotate_and_capture(&self) -> Vec<(CanonicalHeading, HeadingOutcome)> {
        let Some(pose) = self.robot.current_pose() else {
            log::error!(target: "rotate_capture", "current position unavailable");
            return Vec::new();
        };

        CanonicalHeading::SCAN_ORDER
            .iter()
            .map(|&heading| {
                log::debug!(target: "rotate_capture", "rotating to face {}", heading.label());

                let target = Pose::new(pose.position, heading.orientation());
                if !self.motion.move_to(&target).is_success() {
                    log::warn!(
                        target: "rotate_capture",
                        "failed to rotate to {}",
                        heading.label()
                    );
                    return (heading, HeadingOutcome::MoveSkipped);
                }

                match self.acquirer.acquire() {
                    Some(frame) => (heading, HeadingOutcome::Captured(frame)),
                    None => {
                        log::warn!(
                            target: "rotate_capture",
                            "no frame captured at {}",
                            heading.label()
                        );
                        (heading, HeadingOutcome::CaptureFailed)
                    }
                }
            })
            .collect()
    }
}
