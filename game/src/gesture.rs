use serde::{Deserialize, Serialize};

use crate::landmark::{
    INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, Landmark, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, PINKY_PIP,
    PINKY_TIP, RING_PIP, RING_TIP, THUMB_IP, THUMB_TIP, WRIST,
};

/// Discrete hand pose derived from a single landmark frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gesture {
    Fist,
    Pointer,
    Spread,
    ThumbsUp,
    ThumbsDown,
    Victory,
    /// Hand visible, no specific pose matched.
    Open,
    /// No hand, or a frame the rules cannot read.
    #[default]
    Unknown,
}

/// Spread requires the index-tip/pinky-tip span to exceed this multiple of
/// the wrist-to-middle-MCP palm height, normalizing for hand size and
/// distance from the camera.
const SPREAD_PALM_RATIO: f32 = 1.1;

/// Joints the rules below actually read; a non-finite coordinate on any of
/// them makes the frame unreadable.
const REQUIRED: [usize; 12] = [
    WRIST, THUMB_IP, THUMB_TIP, INDEX_PIP, INDEX_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, RING_PIP,
    RING_TIP, PINKY_PIP, PINKY_TIP,
];

/// Classifies one landmark frame into a [`Gesture`].
///
/// Pure and frame-local: no temporal smoothing, no state. Jitter between
/// frames is absorbed downstream by cooldown locks and hold-to-confirm, not
/// here. The rules are ordered most-restrictive first; the first match wins.
pub fn classify(landmarks: Option<&[Landmark]>) -> Gesture {
    let Some(points) = landmarks else {
        return Gesture::Unknown;
    };
    if points.len() < LANDMARK_COUNT {
        return Gesture::Unknown;
    }
    if REQUIRED.iter().any(|&i| !points[i].is_finite()) {
        return Gesture::Unknown;
    }

    // A finger is extended when its tip sits above its PIP knuckle on
    // screen (top-origin y). The thumb extends sideways under mirrored
    // capture, so it compares x instead.
    let extended = |pip: usize, tip: usize| points[tip].y < points[pip].y;
    let index = extended(INDEX_PIP, INDEX_TIP);
    let middle = extended(MIDDLE_PIP, MIDDLE_TIP);
    let ring = extended(RING_PIP, RING_TIP);
    let pinky = extended(PINKY_PIP, PINKY_TIP);
    let all_curled = !index && !middle && !ring && !pinky;

    let thumb_extended = points[THUMB_TIP].x < points[THUMB_IP].x;
    let thumb_up = points[THUMB_TIP].y < points[INDEX_PIP].y;
    let thumb_down =
        points[THUMB_TIP].y > points[THUMB_IP].y && points[THUMB_TIP].y > points[MIDDLE_MCP].y;

    if thumb_up && all_curled {
        return Gesture::ThumbsUp;
    }
    if thumb_down && all_curled {
        return Gesture::ThumbsDown;
    }
    if index && middle && !ring && !pinky {
        return Gesture::Victory;
    }
    if index && !middle && !ring && !pinky {
        return Gesture::Pointer;
    }
    // The thumb guard keeps a sloppy thumbs-up from reading as a fist.
    if all_curled && !thumb_up {
        return Gesture::Fist;
    }
    if index && middle && ring && pinky && thumb_extended {
        let span = points[INDEX_TIP].distance_to(&points[PINKY_TIP]);
        let palm = points[WRIST].distance_to(&points[MIDDLE_MCP]);
        if span > SPREAD_PALM_RATIO * palm {
            return Gesture::Spread;
        }
    }

    Gesture::Open
}
