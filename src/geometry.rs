//! Geometry primitives on normalized image-space coordinates
//!
//! Only the x/y plane is used; landmark depth is ignored.

use crate::landmarks::BodyLandmark;
use crate::types::{Landmark, PoseSnapshot};

/// Interior angle at vertex `b` formed by rays `b→a` and `b→c`, in degrees.
///
/// The result is folded into `[0, 180]`. Returns `NaN` when either ray has
/// zero length, since no angle is defined there.
pub fn angle_at(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let (ax, ay) = (a.x - b.x, a.y - b.y);
    let (cx, cy) = (c.x - b.x, c.y - b.y);

    if ax.hypot(ay) < f64::EPSILON || cx.hypot(cy) < f64::EPSILON {
        return f64::NAN;
    }

    let radians = cy.atan2(cx) - ay.atan2(ax);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle
}

/// Vertical position of `mid` relative to the `top`→`bottom` span, mapped to degrees.
///
/// `180 − ((mid.y − top.y) / (top.y − bottom.y)) × 180`. Used for joints such as
/// the wrist where no natural three-point angle exists. Non-finite when
/// `top` and `bottom` share the same height.
pub fn vertical_ratio_angle(top: &Landmark, mid: &Landmark, bottom: &Landmark) -> f64 {
    180.0 - ((mid.y - top.y) / (top.y - bottom.y)) * 180.0
}

/// Approximate center of the body for framing.
///
/// Midpoint of the shoulders when both are visible, otherwise the nose,
/// otherwise the center of the frame.
pub fn body_center(pose: &PoseSnapshot, visibility_threshold: f64) -> (f64, f64) {
    let visible = |which: BodyLandmark| {
        let landmark = pose.landmark(which);
        (landmark.visibility > visibility_threshold).then_some(landmark)
    };

    match (
        visible(BodyLandmark::LeftShoulder),
        visible(BodyLandmark::RightShoulder),
    ) {
        (Some(left), Some(right)) => ((left.x + right.x) / 2.0, (left.y + right.y) / 2.0),
        _ => match visible(BodyLandmark::Nose) {
            Some(nose) => (nose.x, nose.y),
            None => (0.5, 0.5),
        },
    }
}
