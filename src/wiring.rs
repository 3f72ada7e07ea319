//! Joint wiring table
//!
//! Maps each measurable joint to the landmarks that define its angle. Adding a
//! joint is a data change here; the keypoint evaluator only dispatches on the
//! variant.

use crate::geometry::{angle_at, vertical_ratio_angle};
use crate::landmarks::BodyLandmark;
use crate::types::PoseSnapshot;

/// How a joint's angle is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointWiring {
    /// Interior angle at `b` between `b→a` and `b→c`
    ThreePointAngle {
        a: BodyLandmark,
        b: BodyLandmark,
        c: BodyLandmark,
    },
    /// Height of `mid` relative to the `top`→`bottom` span, mapped to degrees
    VerticalRatioProxy {
        top: BodyLandmark,
        mid: BodyLandmark,
        bottom: BodyLandmark,
    },
}

use BodyLandmark::*;
use JointWiring::*;

// Hips are measured shoulder-hip-knee so hip targets in a catalog score on
// real geometry instead of reading as a constant zero angle.
const WIRING: &[(BodyLandmark, JointWiring)] = &[
    (LeftElbow, angle(LeftShoulder, LeftElbow, LeftWrist)),
    (RightElbow, angle(RightShoulder, RightElbow, RightWrist)),
    (LeftKnee, angle(LeftHip, LeftKnee, LeftAnkle)),
    (RightKnee, angle(RightHip, RightKnee, RightAnkle)),
    (LeftShoulder, angle(LeftElbow, LeftShoulder, LeftHip)),
    (RightShoulder, angle(RightElbow, RightShoulder, RightHip)),
    (LeftHip, angle(LeftShoulder, LeftHip, LeftKnee)),
    (RightHip, angle(RightShoulder, RightHip, RightKnee)),
    (LeftWrist, height(LeftShoulder, LeftWrist, LeftAnkle)),
    (RightWrist, height(RightShoulder, RightWrist, RightAnkle)),
];

const fn angle(a: BodyLandmark, b: BodyLandmark, c: BodyLandmark) -> JointWiring {
    ThreePointAngle { a, b, c }
}

const fn height(top: BodyLandmark, mid: BodyLandmark, bottom: BodyLandmark) -> JointWiring {
    VerticalRatioProxy { top, mid, bottom }
}

/// Wiring for a joint, if it is measurable
pub fn wiring_for(joint: BodyLandmark) -> Option<JointWiring> {
    WIRING
        .iter()
        .find(|(j, _)| *j == joint)
        .map(|(_, wiring)| *wiring)
}

/// All joints with a wiring entry
pub fn measurable_joints() -> impl Iterator<Item = BodyLandmark> {
    WIRING.iter().map(|(joint, _)| *joint)
}

impl JointWiring {
    /// Landmarks read by this measurement
    pub fn landmarks(&self) -> [BodyLandmark; 3] {
        match *self {
            ThreePointAngle { a, b, c } => [a, b, c],
            VerticalRatioProxy { top, mid, bottom } => [top, mid, bottom],
        }
    }

    /// Measure the joint angle on a snapshot (degrees, may be non-finite)
    pub fn measure(&self, pose: &PoseSnapshot) -> f64 {
        match *self {
            ThreePointAngle { a, b, c } => {
                angle_at(pose.landmark(a), pose.landmark(b), pose.landmark(c))
            }
            VerticalRatioProxy { top, mid, bottom } => vertical_ratio_angle(
                pose.landmark(top),
                pose.landmark(mid),
                pose.landmark(bottom),
            ),
        }
    }
}
