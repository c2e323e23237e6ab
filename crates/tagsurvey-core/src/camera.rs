//! Pinhole camera model, Brown–Conrady distortion, and image undistortion.
//!
//! Intrinsics arrive from the robot-control boundary as a flattened row-major
//! 3×3 camera matrix plus an ordered distortion array; they are parsed fresh
//! for every undistortion call rather than cached.

use thiserror::Error;

use crate::image::{sample_bilinear_u8, GrayImage, GrayImageView};

/// Errors building a camera model from raw boundary intrinsics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntrinsicsError {
    #[error("camera matrix must have 9 elements, got {got}")]
    TruncatedCameraMatrix { got: usize },
    #[error("camera matrix contains non-finite elements")]
    NonFiniteCameraMatrix,
    #[error("degenerate focal length (fx={fx}, fy={fy})")]
    DegenerateFocal { fx: f64, fy: f64 },
}

/// Pinhole intrinsics in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinholeIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl PinholeIntrinsics {
    #[inline]
    pub fn pixel_to_normalized(&self, pixel: [f64; 2]) -> [f64; 2] {
        [(pixel[0] - self.cx) / self.fx, (pixel[1] - self.cy) / self.fy]
    }

    #[inline]
    pub fn normalized_to_pixel(&self, normalized: [f64; 2]) -> [f64; 2] {
        [
            self.fx * normalized[0] + self.cx,
            self.fy * normalized[1] + self.cy,
        ]
    }
}

/// Brown–Conrady radial-tangential coefficients (k1, k2, p1, p2, k3).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

impl Distortion {
    /// Coefficients from a boundary-supplied array.
    ///
    /// Missing trailing entries are zero; entries past k3 are ignored. The
    /// caller decides whether a short array is worth a warning.
    pub fn from_coeffs(coeffs: &[f64]) -> Self {
        let at = |i: usize| coeffs.get(i).copied().unwrap_or(0.0);
        Self {
            k1: at(0),
            k2: at(1),
            p1: at(2),
            p2: at(3),
            k3: at(4),
        }
    }

    /// Apply distortion to normalized pinhole coordinates.
    pub fn distort_normalized(&self, normalized: [f64; 2]) -> [f64; 2] {
        let [x, y] = normalized;
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;
        [x * radial + x_tan, y * radial + y_tan]
    }
}

const UNDISTORT_MAX_ITERS: usize = 15;
const UNDISTORT_EPS: f64 = 1e-12;

/// Complete camera model (intrinsics + distortion).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraModel {
    pub intrinsics: PinholeIntrinsics,
    pub distortion: Distortion,
}

impl CameraModel {
    /// Build from the boundary's flattened row-major camera matrix
    /// `(fx, 0, cx, 0, fy, cy, 0, 0, 1)` and its distortion array.
    pub fn from_raw(matrix: &[f64], coeffs: &[f64]) -> Result<Self, IntrinsicsError> {
        if matrix.len() < 9 {
            return Err(IntrinsicsError::TruncatedCameraMatrix { got: matrix.len() });
        }
        if matrix[..9].iter().any(|v| !v.is_finite()) {
            return Err(IntrinsicsError::NonFiniteCameraMatrix);
        }

        let (fx, cx, fy, cy) = (matrix[0], matrix[2], matrix[4], matrix[5]);
        if fx.abs() < 1e-12 || fy.abs() < 1e-12 {
            return Err(IntrinsicsError::DegenerateFocal { fx, fy });
        }

        Ok(Self {
            intrinsics: PinholeIntrinsics { fx, fy, cx, cy },
            distortion: Distortion::from_coeffs(coeffs),
        })
    }

    /// Map an undistorted pixel to its distorted source pixel.
    pub fn distort_pixel(&self, pixel: [f64; 2]) -> [f64; 2] {
        let normalized = self.intrinsics.pixel_to_normalized(pixel);
        let distorted = self.distortion.distort_normalized(normalized);
        self.intrinsics.normalized_to_pixel(distorted)
    }

    /// Invert the distortion for one pixel by fixed-point iteration.
    pub fn undistort_pixel(&self, pixel: [f64; 2]) -> [f64; 2] {
        let target = self.intrinsics.pixel_to_normalized(pixel);
        let mut x = target;
        for _ in 0..UNDISTORT_MAX_ITERS {
            let d = self.distortion.distort_normalized(x);
            let err = [target[0] - d[0], target[1] - d[1]];
            x = [x[0] + err[0], x[1] + err[1]];
            if err[0].abs().max(err[1].abs()) < UNDISTORT_EPS {
                break;
            }
        }
        self.intrinsics.normalized_to_pixel(x)
    }
}

/// Remove lens distortion from a full image.
///
/// Every output pixel samples the source at its distorted location; samples
/// falling outside the source read as zero. The source buffer is never
/// mutated.
pub fn undistort_image(src: &GrayImageView<'_>, model: &CameraModel) -> GrayImage {
    let mut data = vec![0u8; src.width * src.height];
    for y in 0..src.height {
        for x in 0..src.width {
            let s = model.distort_pixel([x as f64, y as f64]);
            data[y * src.width + x] = sample_bilinear_u8(src, s[0] as f32, s[1] as f32);
        }
    }
    GrayImage {
        width: src.width,
        height: src.height,
        data,
    }
}
