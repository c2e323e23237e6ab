//! Decoding markers from square candidate cells.
//!
//! The survey captures frames facing a flat wall, so candidate markers are
//! close to axis-aligned squares. The scanner sweeps fixed-pitch square cells
//! across the frame, reads each cell's bit grid with 3×3-mean taps, validates
//! the black border, and matches the observed code against the dictionary.

use std::collections::HashSet;

use nalgebra::Point2;
use tagsurvey_core::GrayImageView;

use crate::matcher::Matcher;
use crate::threshold::otsu_threshold;

/// Cells with an inner sampling window smaller than this are unreadable.
const MIN_SIDE_PX: f32 = 12.0;

/// Parameters for sweeping candidate cells across a plane-facing frame.
#[derive(Clone, Debug)]
pub struct GridScanParams {
    /// Candidate cell side length in pixels.
    pub cell_px: f32,
    /// Marker border width in bit cells.
    pub border_bits: usize,
    /// Fraction of the cell ignored near its edges.
    pub inset_frac: f32,
    /// Required fraction of black border cells.
    pub min_border_score: f32,
    /// Keep only the best observation per marker id.
    pub dedup_by_id: bool,
}

impl Default for GridScanParams {
    fn default() -> Self {
        Self {
            cell_px: 64.0,
            border_bits: 1,
            inset_frac: 0.10,
            min_border_score: 0.85,
            dedup_by_id: true,
        }
    }
}

/// One decoded marker observation.
#[derive(Clone, Copy, Debug)]
pub struct TagObservation {
    pub id: u32,
    /// Cell corners in image pixels (TL, TR, BR, BL).
    pub corners: [Point2<f32>; 4],
    /// Quarter turns between the observed code and the dictionary entry.
    pub rotation: u8,
    pub hamming: u8,
    /// Border quality × Hamming penalty, in [0, 1].
    pub score: f32,
}

/// Decode the square cell whose top-left corner sits at `origin` pixels.
pub fn decode_cell(
    img: &GrayImageView<'_>,
    origin: [f32; 2],
    params: &GridScanParams,
    matcher: &Matcher,
) -> Option<TagObservation> {
    let bits = matcher.dictionary().marker_size;
    let grid = bits + 2 * params.border_bits;
    if grid == 0 || params.cell_px <= 1.0 {
        return None;
    }

    let inset = (params.inset_frac.max(0.0) * params.cell_px).round();
    let x0 = (origin[0] + inset).round() as i32;
    let y0 = (origin[1] + inset).round() as i32;
    let side = (params.cell_px - 2.0 * inset).round() as i32;
    if (side as f32) < MIN_SIDE_PX {
        return None;
    }
    if x0 < 0 || y0 < 0 || x0 + side > img.width as i32 || y0 + side > img.height as i32 {
        return None;
    }

    // Threshold over the raw window, bits over 3×3 means at grid centers.
    let mut window = Vec::with_capacity((side * side) as usize);
    for yy in 0..side {
        for xx in 0..side {
            window.push(pixel(img, x0 + xx, y0 + yy));
        }
    }
    let thr = otsu_threshold(&window);

    let step = side as f32 / grid as f32;
    let border = params.border_bits;
    let mut border_black = 0u32;
    let mut border_total = 0u32;
    let mut code = 0u64;

    for gy in 0..grid {
        for gx in 0..grid {
            let sx = x0 as f32 + (gx as f32 + 0.5) * step;
            let sy = y0 as f32 + (gy as f32 + 0.5) * step;
            let is_black = mean_3x3(img, sx, sy) < thr;

            let on_border = border > 0
                && (gx < border || gy < border || gx + border >= grid || gy + border >= grid);
            if on_border {
                border_total += 1;
                if is_black {
                    border_black += 1;
                }
            } else if is_black {
                let bx = gx - border;
                let by = gy - border;
                code |= 1u64 << (by * bits + bx);
            }
        }
    }

    let border_score = if border_total > 0 {
        border_black as f32 / border_total as f32
    } else {
        1.0
    };
    if border_score < params.min_border_score {
        return None;
    }

    let m = matcher.best_match(code)?;
    let bit_count = matcher.dictionary().bit_count().max(1) as f32;
    let score = (border_score * (1.0 - m.hamming as f32 / bit_count)).clamp(0.0, 1.0);

    let s = params.cell_px;
    let (ox, oy) = (origin[0], origin[1]);
    Some(TagObservation {
        id: m.id,
        corners: [
            Point2::new(ox, oy),
            Point2::new(ox + s, oy),
            Point2::new(ox + s, oy + s),
            Point2::new(ox, oy + s),
        ],
        rotation: m.rotation,
        hamming: m.hamming,
        score,
    })
}

/// Sweep fixed-pitch candidate cells across the whole frame.
///
/// Observations come out in row-major cell order unless `dedup_by_id`
/// re-ranks them by score.
pub fn scan_frame(
    img: &GrayImageView<'_>,
    params: &GridScanParams,
    matcher: &Matcher,
) -> Vec<TagObservation> {
    if params.cell_px <= 1.0 {
        return Vec::new();
    }
    let cells_x = (img.width as f32 / params.cell_px).floor() as usize;
    let cells_y = (img.height as f32 / params.cell_px).floor() as usize;

    let mut out = Vec::new();
    for sy in 0..cells_y {
        for sx in 0..cells_x {
            let origin = [sx as f32 * params.cell_px, sy as f32 * params.cell_px];
            if let Some(obs) = decode_cell(img, origin, params, matcher) {
                out.push(obs);
            }
        }
    }

    if params.dedup_by_id {
        dedup_keep_best(out)
    } else {
        out
    }
}

fn dedup_keep_best(mut observations: Vec<TagObservation>) -> Vec<TagObservation> {
    observations.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = HashSet::new();
    observations.retain(|obs| seen.insert(obs.id));
    observations
}

fn mean_3x3(img: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    let ix = x.floor() as i32;
    let iy = y.floor() as i32;
    let mut sum = 0u32;
    for dy in -1..=1 {
        for dx in -1..=1 {
            sum += pixel(img, ix + dx, iy + dy) as u32;
        }
    }
    (sum / 9) as u8
}

#[inline]
fn pixel(img: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= img.width as i32 || y >= img.height as i32 {
        return 0;
    }
    img.data[y as usize * img.width + x as usize]
}
