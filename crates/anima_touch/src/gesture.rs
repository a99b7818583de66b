//! Touch gesture classification.
//!
//! A small finite classifier over press/move/release events: taps,
//! double-taps, long-presses, drags and rubs. Free-form area strings from
//! the input layer are normalized onto the fixed [`TouchArea`] enum through
//! a keyword-substring table — unmatched areas become `Unknown`, never an
//! error.

use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchArea {
    Head,
    Face,
    Hair,
    Shoulder,
    Hand,
    Body,
    Unknown,
}

impl TouchArea {
    pub fn name(&self) -> &'static str {
        match self {
            TouchArea::Head => "head",
            TouchArea::Face => "face",
            TouchArea::Hair => "hair",
            TouchArea::Shoulder => "shoulder",
            TouchArea::Hand => "hand",
            TouchArea::Body => "body",
            TouchArea::Unknown => "unknown",
        }
    }

    /// Normalize a free-form area label from the input layer.
    pub fn from_label(label: &str) -> TouchArea {
        let l = label.trim().to_lowercase();
        const MAPPING: &[(TouchArea, &[&str])] = &[
            (TouchArea::Head, &["head", "头", "脑袋", "forehead", "额头"]),
            (TouchArea::Face, &["face", "脸", "cheek", "脸颊", "下巴", "chin"]),
            (TouchArea::Hair, &["hair", "头发", "发", "bangs", "刘海", "twintail", "马尾"]),
            (TouchArea::Shoulder, &["shoulder", "肩", "肩膀"]),
            (TouchArea::Hand, &["hand", "手", "palm", "finger", "手指"]),
            (TouchArea::Body, &["body", "身体", "肚子", "belly", "背", "back", "waist", "腰"]),
        ];
        for (area, keywords) in MAPPING {
            if keywords.iter().any(|k| l.contains(k)) {
                return *area;
            }
        }
        TouchArea::Unknown
    }
}

impl std::fmt::Display for TouchArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchGesture {
    Tap,
    DoubleTap,
    LongPress,
    Drag,
    Rub,
}

/// A classified, transient touch event — consumed by the rule engine and
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    pub area: TouchArea,
    pub gesture: TouchGesture,
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &TouchPoint) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone)]
struct ActiveTouch {
    area: TouchArea,
    started: Instant,
    last: TouchPoint,
    /// Total path length while pressed.
    travelled: f32,
}

/// Classifier thresholds (the engine wires these from `TouchConfig`).
#[derive(Debug, Clone)]
pub struct GestureThresholds {
    pub long_press_ms: u64,
    pub double_tap_ms: u64,
    pub drag_threshold: f32,
    pub rub_threshold: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            long_press_ms: 600,
            double_tap_ms: 300,
            drag_threshold: 10.0,
            rub_threshold: 3.0,
        }
    }
}

/// The press/move/release state machine.
#[derive(Debug, Default)]
pub struct GestureTracker {
    thresholds: GestureThresholds,
    active: Option<ActiveTouch>,
    /// A prior tap awaiting a possible double-tap, consumed on match so a
    /// third rapid tap cannot re-trigger.
    pending_tap: Option<(TouchArea, Instant)>,
}

impl GestureTracker {
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            active: None,
            pending_tap: None,
        }
    }

    pub fn press(&mut self, area: TouchArea, position: TouchPoint, now: Instant) {
        self.active = Some(ActiveTouch {
            area,
            started: now,
            last: position,
            travelled: 0.0,
        });
    }

    /// Movement while pressed accumulates path length; sub-jitter movement
    /// is ignored at classification time.
    pub fn move_to(&mut self, position: TouchPoint, _now: Instant) {
        if let Some(active) = &mut self.active {
            active.travelled += active.last.distance(&position);
            active.last = position;
        }
    }

    /// Release and classify. Returns `None` when nothing was pressed or
    /// the movement was below the jitter floor with a too-short hold.
    pub fn release(&mut self, now: Instant) -> Option<TouchEvent> {
        let active = self.active.take()?;
        let held_ms = now.saturating_duration_since(active.started).as_millis() as u64;
        let t = &self.thresholds;

        // Movement classification first: a dragged-out press is a drag
        // regardless of how long it was held.
        if active.travelled > t.drag_threshold {
            self.pending_tap = None;
            return Some(TouchEvent {
                area: active.area,
                gesture: TouchGesture::Drag,
                at: now,
            });
        }
        if active.travelled > t.rub_threshold {
            self.pending_tap = None;
            return Some(TouchEvent {
                area: active.area,
                gesture: TouchGesture::Rub,
                at: now,
            });
        }

        if held_ms >= t.long_press_ms {
            self.pending_tap = None;
            return Some(TouchEvent {
                area: active.area,
                gesture: TouchGesture::LongPress,
                at: now,
            });
        }

        // Tap vs double-tap: a matching prior tap within the window is
        // consumed by the double-tap.
        if let Some((area, at)) = self.pending_tap {
            if area == active.area
                && now.saturating_duration_since(at).as_millis() as u64 <= t.double_tap_ms
            {
                self.pending_tap = None;
                return Some(TouchEvent {
                    area: active.area,
                    gesture: TouchGesture::DoubleTap,
                    at: now,
                });
            }
        }
        self.pending_tap = Some((active.area, now));
        Some(TouchEvent {
            area: active.area,
            gesture: TouchGesture::Tap,
            at: now,
        })
    }

    pub fn cancel(&mut self) {
        self.active = None;
        self.pending_tap = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn tap(tracker: &mut GestureTracker, area: TouchArea, at: Instant) -> Option<TouchEvent> {
        tracker.press(area, TouchPoint::new(0.0, 0.0), at);
        tracker.release(at + Duration::from_millis(50))
    }

    #[test]
    fn test_area_normalization() {
        assert_eq!(TouchArea::from_label("head_top"), TouchArea::Head);
        assert_eq!(TouchArea::from_label("摸摸头"), TouchArea::Head);
        assert_eq!(TouchArea::from_label("左脸颊"), TouchArea::Face);
        assert_eq!(TouchArea::from_label("twintail_l"), TouchArea::Hair);
        assert_eq!(TouchArea::from_label("mystery_zone"), TouchArea::Unknown);
    }

    #[test]
    fn test_simple_tap() {
        let mut tracker = GestureTracker::default();
        let e = tap(&mut tracker, TouchArea::Head, Instant::now()).unwrap();
        assert_eq!(e.gesture, TouchGesture::Tap);
        assert_eq!(e.area, TouchArea::Head);
    }

    #[test]
    fn test_double_tap_consumes_prior() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        let first = tap(&mut tracker, TouchArea::Head, t0).unwrap();
        assert_eq!(first.gesture, TouchGesture::Tap);

        let second = tap(&mut tracker, TouchArea::Head, t0 + Duration::from_millis(150)).unwrap();
        assert_eq!(second.gesture, TouchGesture::DoubleTap);

        // A third rapid tap must NOT chain another double-tap.
        let third = tap(&mut tracker, TouchArea::Head, t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(third.gesture, TouchGesture::Tap);
    }

    #[test]
    fn test_double_tap_requires_same_area() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tap(&mut tracker, TouchArea::Head, t0);
        let e = tap(&mut tracker, TouchArea::Face, t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(e.gesture, TouchGesture::Tap);
    }

    #[test]
    fn test_double_tap_window_expires() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tap(&mut tracker, TouchArea::Head, t0);
        let e = tap(&mut tracker, TouchArea::Head, t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(e.gesture, TouchGesture::Tap);
    }

    #[test]
    fn test_long_press() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tracker.press(TouchArea::Hand, TouchPoint::new(0.0, 0.0), t0);
        let e = tracker.release(t0 + Duration::from_millis(800)).unwrap();
        assert_eq!(e.gesture, TouchGesture::LongPress);
    }

    #[test]
    fn test_drag_beats_long_press() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tracker.press(TouchArea::Hair, TouchPoint::new(0.0, 0.0), t0);
        tracker.move_to(TouchPoint::new(20.0, 0.0), t0 + Duration::from_millis(400));
        let e = tracker.release(t0 + Duration::from_millis(900)).unwrap();
        assert_eq!(e.gesture, TouchGesture::Drag);
    }

    #[test]
    fn test_rub_between_thresholds() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tracker.press(TouchArea::Head, TouchPoint::new(0.0, 0.0), t0);
        tracker.move_to(TouchPoint::new(5.0, 0.0), t0 + Duration::from_millis(100));
        let e = tracker.release(t0 + Duration::from_millis(200)).unwrap();
        assert_eq!(e.gesture, TouchGesture::Rub);
    }

    #[test]
    fn test_jitter_ignored() {
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tracker.press(TouchArea::Head, TouchPoint::new(0.0, 0.0), t0);
        tracker.move_to(TouchPoint::new(1.5, 0.5), t0 + Duration::from_millis(30));
        let e = tracker.release(t0 + Duration::from_millis(60)).unwrap();
        assert_eq!(e.gesture, TouchGesture::Tap, "sub-3-unit jitter is a tap");
    }

    #[test]
    fn test_release_without_press() {
        let mut tracker = GestureTracker::default();
        assert!(tracker.release(Instant::now()).is_none());
    }

    #[test]
    fn test_rub_accumulates_small_strokes() {
        // Back-and-forth strokes accumulate path length even though the
        // end point is near the origin.
        let mut tracker = GestureTracker::default();
        let t0 = Instant::now();
        tracker.press(TouchArea::Head, TouchPoint::new(0.0, 0.0), t0);
        for i in 0..6 {
            let x = if i % 2 == 0 { 2.0 } else { 0.0 };
            tracker.move_to(TouchPoint::new(x, 0.0), t0 + Duration::from_millis(20 * i));
        }
        let e = tracker.release(t0 + Duration::from_millis(200)).unwrap();
        // 6 strokes × 2 units = 12 units of travel → drag territory.
        assert_eq!(e.gesture, TouchGesture::Drag);
    }
}
