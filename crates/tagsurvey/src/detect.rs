//! Fiducial-tag detection over captured frames.
//!
//! The detection capability itself is a boundary: `FiducialDetector` is what
//! an external vision library provides, `GridScanDetector` is the shipped
//! reference backend, and `TagScanner` wraps whichever backend is configured
//! with the pipeline's degradation rules.

use nalgebra::Point2;
use thiserror::Error;

use tagsurvey_aruco::{scan_frame, Dictionary, DictionaryError, GridScanParams, Matcher};
use tagsurvey_core::{AreaId, Frame, GrayImageView};

use crate::config::DetectionConfig;
use crate::robot::RobotBus;

pub use tagsurvey_aruco::TagObservation;

/// A detection-backend failure. The scanner converts it into an empty
/// detection; detection is never retried (only frame acquisition is).
#[derive(Error, Debug)]
#[error("fiducial backend failure: {0}")]
pub struct BackendError(pub String);

/// The external vision capability: find square fiducials in a frame.
pub trait FiducialDetector {
    fn detect(&self, image: &GrayImageView<'_>) -> Result<Vec<TagObservation>, BackendError>;
}

/// Reference backend: dictionary-matched grid scan over a plane-facing frame.
pub struct GridScanDetector {
    matcher: Matcher,
    params: GridScanParams,
}

impl GridScanDetector {
    pub fn new(
        dictionary: Dictionary,
        max_hamming: u8,
        params: GridScanParams,
    ) -> Result<Self, DictionaryError> {
        Ok(Self {
            matcher: Matcher::new(dictionary, max_hamming)?,
            params,
        })
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self, DictionaryError> {
        let params = GridScanParams {
            cell_px: config.cell_px,
            min_border_score: config.min_border_score,
            ..GridScanParams::default()
        };
        Self::new(config.dictionary.clone(), config.max_hamming, params)
    }
}

impl FiducialDetector for GridScanDetector {
    fn detect(&self, image: &GrayImageView<'_>) -> Result<Vec<TagObservation>, BackendError> {
        Ok(scan_frame(image, &self.params, &self.matcher))
    }
}

/// Per-area detection result. `ids[i]` corresponds to `corners[i]`; empty
/// means no markers found, which is a valid outcome rather than an error.
#[derive(Clone, Debug)]
pub struct TagDetection {
    pub area: AreaId,
    pub ids: Vec<u32>,
    pub corners: Vec<[Point2<f32>; 4]>,
}

impl TagDetection {
    fn empty(area: AreaId) -> Self {
        Self {
            area,
            ids: Vec::new(),
            corners: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Runs the detection backend over captured frames.
pub struct TagScanner<'a> {
    robot: &'a dyn RobotBus,
    backend: &'a dyn FiducialDetector,
    debug_mode: bool,
}

impl<'a> TagScanner<'a> {
    pub fn new(
        robot: &'a dyn RobotBus,
        backend: &'a dyn FiducialDetector,
        debug_mode: bool,
    ) -> Self {
        Self {
            robot,
            backend,
            debug_mode,
        }
    }

    /// Detect markers in `frame` for `area`. An absent or empty frame and a
    /// backend failure all produce an empty detection; ids and corner sets
    /// stay index-aligned in backend order.
    pub fn detect(&self, frame: Option<&Frame>, area: AreaId) -> TagDetection {
        let Some(frame) = frame else {
            log::debug!(target: "ar_tag", "no frame to scan for {area}");
            return TagDetection::empty(area);
        };
        if frame.is_empty() {
            log::debug!(target: "ar_tag", "empty frame for {area}, nothing to scan");
            return TagDetection::empty(area);
        }

        log::debug!(target: "ar_tag", "scanning frame for {area}");
        let observations = match self.backend.detect(&frame.view()) {
            Ok(observations) => observations,
            Err(err) => {
                log::warn!(target: "ar_tag", "detection failed for {area}: {err}");
                return TagDetection::empty(area);
            }
        };

        if self.debug_mode {
            self.robot
                .persist_debug_image(frame, &format!("ar_scan_area_{}", area.0));
            if observations.is_empty() {
                log::debug!(target: "ar_tag", "no markers detected in {area}");
            } else {
                let ids: Vec<u32> = observations.iter().map(|obs| obs.id).collect();
                log::debug!(target: "ar_tag", "detected marker ids in {area}: {ids:?}");
            }
        }

        let mut ids = Vec::with_capacity(observations.len());
        let mut corners = Vec::with_capacity(observations.len());
        for obs in observations {
            ids.push(obs.id);
            corners.push(obs.corners);
        }
        TagDetection { area, ids, corners }
    }
}
