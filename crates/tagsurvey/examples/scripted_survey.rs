//! Scripted end-to-end run of both survey protocols against an in-memory
//! robot, standing in for the external mission script.
//!
//! Run with `cargo run -p tagsurvey --example scripted_survey`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use log::LevelFilter;
use nalgebra::{Point3, Quaternion};

use tagsurvey::aruco::Dictionary;
use tagsurvey::core::{
    init_with_level, quat_xyzw, AreaBounds, AreaId, AreaSpec, Frame, GrayImage, Pose,
};
use tagsurvey::{
    AreaSurveyor, CaptureConfig, DetectionConfig, FrameAcquirer, GridScanDetector, MotionConfig,
    MoveStatus, Pacer, RawIntrinsics, RobotBus, SurveyConfig, TagScanner,
};

/// In-memory robot: every move succeeds, frames pop from a script, and the
/// camera reports fixed nav-cam intrinsics with no distortion.
struct ScriptedRobot {
    pose: Pose,
    frames: RefCell<VecDeque<Frame>>,
}

impl RobotBus for ScriptedRobot {
    fn move_to(
        &self,
        position: &Point3<f64>,
        _orientation: &Quaternion<f64>,
        _blocking: bool,
    ) -> MoveStatus {
        log::info!(target: "sim", "move accepted: ({:.2}, {:.2}, {:.2})", position.x, position.y, position.z);
        MoveStatus { succeeded: true }
    }

    fn current_pose(&self) -> Option<Pose> {
        Some(self.pose)
    }

    fn camera_frame(&self) -> Option<Frame> {
        self.frames.borrow_mut().pop_front()
    }

    fn camera_intrinsics(&self) -> Option<RawIntrinsics> {
        Some(RawIntrinsics {
            camera_matrix: vec![
                523.105750, 0.0, 635.434258, 0.0, 534.765913, 500.335102, 0.0, 0.0, 1.0,
            ],
            distortion: vec![0.0; 5],
        })
    }

    fn persist_debug_image(&self, frame: &Frame, label: &str) {
        log::info!(target: "sim", "debug image '{label}' ({}x{})", frame.image.width, frame.image.height);
    }
}

/// The demo skips the wall-clock waits a flight pacer would block on.
struct InstantPacer;

impl Pacer for InstantPacer {
    fn pause(&self, _duration: Duration) {}
}

fn dictionary() -> Dictionary {
    Dictionary {
        name: "demo_3x3".into(),
        marker_size: 3,
        max_correction_bits: 1,
        codes: vec![0b000_010_111, 0b101_000_101],
    }
}

/// Paint one bordered marker into a blank frame at the given cell.
fn painted_frame(code: u64, bits: usize, cell_px: usize, left: usize) -> Frame {
    let grid = bits + 2;
    let sub = cell_px / grid;
    let mut image = GrayImage::filled(2 * cell_px, cell_px, 255);
    for gy in 0..grid {
        for gx in 0..grid {
            let on_border = gx == 0 || gy == 0 || gx + 1 == grid || gy + 1 == grid;
            let black = on_border || (code >> ((gy - 1) * bits + (gx - 1))) & 1 == 1;
            if !black {
                continue;
            }
            for yy in 0..sub {
                for xx in 0..sub {
                    let x = left + gx * sub + xx;
                    let y = gy * sub + yy;
                    image.data[y * image.width + x] = 0;
                }
            }
        }
    }
    Frame::now(image)
}

fn blank_frame(cell_px: usize) -> Frame {
    Frame::now(GrayImage::filled(2 * cell_px, cell_px, 255))
}

fn main() {
    init_with_level(LevelFilter::Debug).expect("install logger");

    let cell_px = 50;
    let dict = dictionary();
    let config = SurveyConfig {
        motion: MotionConfig::default(),
        capture: CaptureConfig::default(),
        detection: DetectionConfig {
            dictionary: dict.clone(),
            max_hamming: 0,
            cell_px: cell_px as f32,
            min_border_score: 0.9,
        },
        areas: vec![AreaSpec {
            id: AreaId(2),
            bounds: AreaBounds {
                min: [10.30, -9.25, 3.76203],
                max: [11.55, -8.50, 3.76203],
            },
        }],
        debug_mode: true,
    };
    let areas = config.area_table();

    let robot = ScriptedRobot {
        pose: Pose::new(Point3::new(10.9, -9.9, 4.8), quat_xyzw(0.0, 0.0, 0.0, 1.0)),
        frames: RefCell::new(VecDeque::from([
            // One frame for the plane scan, then four for the rotation scan;
            // the marker shows up at the -Z heading.
            painted_frame(dict.codes[0], dict.marker_size, cell_px, 0),
            blank_frame(cell_px),
            blank_frame(cell_px),
            painted_frame(dict.codes[1], dict.marker_size, cell_px, cell_px),
            blank_frame(cell_px),
        ])),
    };
    let pacer = InstantPacer;
    let backend = GridScanDetector::from_config(&config.detection).expect("detection backend");
    let surveyor = AreaSurveyor::new(&robot, &pacer, &backend, &config, &areas);

    let entry = Pose::new(
        Point3::new(11.0, -9.8, 4.5),
        quat_xyzw(0.0, 0.0, -0.707, 0.707),
    );

    // Protocol B, then the caller's own undistort + detect — exactly what the
    // mission script does with the returned frame.
    match surveyor.scan_area_plane(AreaId(2), &entry) {
        Some(frame) => {
            let acquirer =
                FrameAcquirer::new(&robot, &pacer, config.capture.clone(), config.debug_mode);
            let corrected = acquirer.undistort(frame, AreaId(2)).into_frame();
            let scanner = TagScanner::new(&robot, &backend, config.debug_mode);
            let detection = scanner.detect(Some(&corrected), AreaId(2));
            println!(
                "plane scan of area 2: {} marker(s) {:?}",
                detection.len(),
                detection.ids
            );
        }
        None => println!("plane scan of area 2 produced no frame"),
    }

    // Protocol A: rotate in place until a marker-bearing heading is found.
    match surveyor.scan_area_for_markers(AreaId(2), &entry) {
        Some(hit) => println!("rotation scan: marker-bearing frame facing {}", hit.heading.label()),
        None => println!("rotation scan: no markers at any heading"),
    }
}
