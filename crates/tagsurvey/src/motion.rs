//! Motion execution with bounded retries and a post-success settle delay.

use tagsurvey_core::Pose;

use crate::config::MotionConfig;
use crate::robot::{Pacer, RobotBus};

/// Outcome of a pose-targeted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The boundary reported success on the given 1-based attempt.
    Completed { attempts: u32 },
    /// The target pose was malformed; the boundary was never contacted.
    InvalidTarget,
    /// Every attempt was rejected by the boundary.
    Exhausted { attempts: u32 },
}

impl MoveOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, MoveOutcome::Completed { .. })
    }
}

/// Issues pose-targeted move commands with bounded retries.
///
/// Every wait blocks the single control thread on purpose: the robot must
/// never see overlapping motion commands.
pub struct MotionExecutor<'a> {
    robot: &'a dyn RobotBus,
    pacer: &'a dyn Pacer,
    config: MotionConfig,
}

impl<'a> MotionExecutor<'a> {
    pub fn new(robot: &'a dyn RobotBus, pacer: &'a dyn Pacer, config: MotionConfig) -> Self {
        Self {
            robot,
            pacer,
            config,
        }
    }

    /// Move to `target`, retrying rejected commands up to the configured
    /// bound. One settle wait follows the first reported success; one retry
    /// wait follows every rejection, the last included.
    pub fn move_to(&self, target: &Pose) -> MoveOutcome {
        if !target.is_well_formed() {
            log::warn!(target: "move", "rejecting malformed target pose: {target:?}");
            return MoveOutcome::InvalidTarget;
        }

        log::debug!(
            target: "move",
            "moving to ({:.3}, {:.3}, {:.3})",
            target.position.x, target.position.y, target.position.z
        );

        for attempt in 1..=self.config.max_attempts {
            let status = self
                .robot
                .move_to(&target.position, &target.orientation, true);
            if status.succeeded {
                self.pacer.pause(self.config.settle_wait());
                return MoveOutcome::Completed { attempts: attempt };
            }

            log::debug!(target: "move", "move attempt {attempt} rejected");
            self.pacer.pause(self.config.retry_wait());
        }

        log::warn!(
            target: "move",
            "move failed after {} attempts",
            self.config.max_attempts
        );
        MoveOutcome::Exhausted {
            attempts: self.config.max_attempts,
        }
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
    use tagsurvey_core::{quat_xyzw, Frame};

    struct ScriptedRobot {
        move_results: RefCell<VecDeque<bool>>,
        move_calls: RefCell<u32>,
    }

    impl ScriptedRobot {
        fn with_moves(results: &[bool]) -> Self {
            Self {
                move_results: RefCell::new(results.iter().copied().collect()),
                move_calls: RefCell::new(0),
            }
        }
    }

    impl RobotBus for ScriptedRobot {
        fn move_to(
            &self,
            _position: &Point3<f64>,
            _orientation: &Quaternion<f64>,
            _blocking: bool,
        ) -> MoveStatus {
            *self.move_calls.borrow_mut() += 1;
            let succeeded = self.move_results.borrow_mut().pop_front().unwrap_or(false);
            MoveStatus { succeeded }
        }

        fn current_pose(&self) -> Option<Pose> {
            None
        }

        fn camera_frame(&self) -> Option<Frame> {
            None
        }

        fn camera_intrinsics(&self) -> Option<RawIntrinsics> {
            None
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

    fn config() -> MotionConfig {
        MotionConfig {
            max_attempts: 3,
            retry_wait_ms: 500,
            settle_wait_ms: 1500,
        }
    }

    const RETRY: Duration = Duration::from_millis(500);
    const SETTLE: Duration = Duration::from_millis(1500);

    fn target() -> Pose {
        Pose::new(Point3::new(11.0, -9.8, 4.5), quat_xyzw(0.0, 0.0, -0.707, 0.707))
    }

    #[test]
    fn malformed_target_never_contacts_the_boundary() {
        let robot = ScriptedRobot::with_moves(&[true]);
        let pacer = CountingPacer::default();
        let executor = MotionExecutor::new(&robot, &pacer, config());

        let bad = Pose::new(Point3::new(f64::NAN, 0.0, 0.0), quat_xyzw(0.0, 0.0, 0.0, 1.0));
        assert_eq!(executor.move_to(&bad), MoveOutcome::InvalidTarget);

        let zero_quat = Pose::new(Point3::origin(), quat_xyzw(0.0, 0.0, 0.0, 0.0));
        assert_eq!(executor.move_to(&zero_quat), MoveOutcome::InvalidTarget);

        assert_eq!(*robot.move_calls.borrow(), 0);
        assert!(pacer.pauses.borrow().is_empty());
    }

    #[test]
    fn first_attempt_success_settles_once() {
        let robot = ScriptedRobot::with_moves(&[true]);
        let pacer = CountingPacer::default();
        let executor = MotionExecutor::new(&robot, &pacer, config());

        assert_eq!(executor.move_to(&target()), MoveOutcome::Completed { attempts: 1 });
        assert_eq!(*robot.move_calls.borrow(), 1);
        assert_eq!(*pacer.pauses.borrow(), vec![SETTLE]);
    }

    #[test]
    fn retries_then_succeeds_with_one_settle() {
        let robot = ScriptedRobot::with_moves(&[false, true]);
        let pacer = CountingPacer::default();
        let executor = MotionExecutor::new(&robot, &pacer, config());

        assert_eq!(executor.move_to(&target()), MoveOutcome::Completed { attempts: 2 });
        assert_eq!(*robot.move_calls.borrow(), 2);
        assert_eq!(*pacer.pauses.borrow(), vec![RETRY, SETTLE]);
    }

    #[test]
    fn exhaustion_performs_three_retry_waits_and_no_settle() {
        let robot = ScriptedRobot::with_moves(&[false, false, false]);
        let pacer = CountingPacer::default();
        let executor = MotionExecutor::new(&robot, &pacer, config());

        assert_eq!(executor.move_to(&target()), MoveOutcome::Exhausted { attempts: 3 });
        assert_eq!(*robot.move_calls.borrow(), 3);
        assert_eq!(*pacer.pauses.borrow(), vec![RETRY, RETRY, RETRY]);
    }
}
