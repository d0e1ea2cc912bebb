//! Object tracking and announcement.
//!
//! The tracker turns a noisy per-frame stream of detections into a small
//! number of well-timed phrases. Identity is label plus spatial proximity,
//! not a detector-provided ID: a coarse bucket key groups nearby same-label
//! detections, and a proximity match keeps identity stable when an object
//! drifts across a bucket boundary.
//!
//! One tracker per detection loop; the table is never shared across threads.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::detect::Detection;
use crate::geometry::{approximate_distance, Direction, DEFAULT_DISTANCE_SCALE};

#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Minimum time between two announcements of the same identity.
    pub cooldown: Duration,
    /// Time since last announcement after which an identity is forgotten.
    /// Must exceed `cooldown`; enforced by config validation.
    pub staleness: Duration,
    /// Spatial hash cell size for the candidate key.
    pub bucket_px: u32,
    /// Per-axis distance within which a same-label detection is the same
    /// identity even when its bucket key differs.
    pub proximity_px: i32,
    /// Scaling constant for the distance heuristic.
    pub distance_scale: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(2500),
            staleness: Duration::from_millis(6000),
            bucket_px: 50,
            proximity_px: 80,
            distance_scale: DEFAULT_DISTANCE_SCALE,
        }
    }
}

struct TrackedObject {
    last_center: (i32, i32),
    last_announced_at: Instant,
}

/// Per-frame consumer of detections with announcement cooldown logic.
pub struct ObjectTracker {
    config: TrackerConfig,
    table: HashMap<String, TrackedObject>,
}

impl ObjectTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            table: HashMap::new(),
        }
    }

    /// Fold one frame's detections into tracking state.
    ///
    /// Returns the phrases to announce for this frame, in detection order.
    /// The caller enqueues them within the same frame pass. Detections with
    /// no distance estimate (degenerate boxes) are skipped silently.
    pub fn observe(
        &mut self,
        detections: &[Detection],
        frame_width: u32,
        now: Instant,
    ) -> Vec<String> {
        let mut phrases = Vec::new();

        for det in detections {
            let Some(distance) = approximate_distance(det.area(), self.config.distance_scale)
            else {
                continue;
            };
            let (cx, cy) = det.center();
            let direction = Direction::from_center_x(cx, frame_width);

            let key = self.resolve_identity(&det.label, cx, cy);

            let announce = match self.table.get(&key) {
                None => true,
                Some(obj) => now.duration_since(obj.last_announced_at) >= self.config.cooldown,
            };

            let entry = self.table.entry(key).or_insert(TrackedObject {
                last_center: (cx, cy),
                last_announced_at: now,
            });
            entry.last_center = (cx, cy);
            if announce {
                entry.last_announced_at = now;
                phrases.push(format!(
                    "{} {}, approximately {:.1} meters away",
                    det.label, direction, distance
                ));
            }
        }

        // Eviction is by announcement age, not last-seen age: an identity
        // that goes unannounced for the whole staleness window drops out and
        // a later detection at the same spot is announced as brand new.
        let staleness = self.config.staleness;
        self.table
            .retain(|_, obj| now.duration_since(obj.last_announced_at) <= staleness);

        phrases
    }

    /// Candidate key from the coarse spatial hash, unless an existing
    /// same-label identity is within the proximity threshold.
    ///
    /// With several identities in range the nearest center wins (key order
    /// breaks exact ties), so the match never depends on hash iteration
    /// order.
    fn resolve_identity(&self, label: &str, cx: i32, cy: i32) -> String {
        let prefix = format!("{}_", label);
        let mut nearest: Option<(i64, &String)> = None;
        for (key, obj) in &self.table {
            if !key.starts_with(&prefix) {
                continue;
            }
            let (px, py) = obj.last_center;
            let dx = (px as i64 - cx as i64).abs();
            let dy = (py as i64 - cy as i64).abs();
            if dx < self.config.proximity_px as i64 && dy < self.config.proximity_px as i64 {
                let candidate = (dx * dx + dy * dy, key);
                if nearest.map_or(true, |best| candidate < best) {
                    nearest = Some(candidate);
                }
            }
        }
        if let Some((_, key)) = nearest {
            return key.clone();
        }
        let bucket = self.config.bucket_px as f64;
        format!(
            "{}_{}_{}",
            label,
            (cx as f64 / bucket).round() as i64,
            (cy as f64 / bucket).round() as i64
        )
    }

    /// Identities currently in the table.
    pub fn tracked_count(&self) -> usize {
        self.table.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn person_at(x1: i32, y1: i32, size: i32) -> Detection {
        Detection::new(
            "person",
            0.9,
            BoundingBox::new(x1, y1, x1 + size, y1 + size),
        )
    }

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn stationary_object_scenario() {
        // 50x50 box centered at (100, 100), area 2500, in a 300-wide frame.
        // cx = 100 sits exactly on the first third boundary, which the strict
        // partition reads as "ahead"; 1500 / sqrt(2500) = 30.0 meters.
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let det = person_at(75, 75, 50);
        let t0 = Instant::now();

        let phrases = tracker.observe(&[det.clone()], 300, t0);
        assert_eq!(phrases, vec!["person ahead, approximately 30.0 meters away"]);

        // Within the 2.5 s cooldown: no new announcement.
        let phrases = tracker.observe(&[det.clone()], 300, t0 + secs(1.0));
        assert!(phrases.is_empty());

        // Past the cooldown: re-announced.
        let phrases = tracker.observe(&[det], 300, t0 + secs(3.0));
        assert_eq!(phrases.len(), 1);
    }

    #[test]
    fn cooldown_allows_exactly_the_first_of_two_close_announcements() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let det = person_at(75, 75, 50);
        let t0 = Instant::now();

        assert_eq!(tracker.observe(&[det.clone()], 300, t0).len(), 1);
        assert_eq!(tracker.observe(&[det], 300, t0 + secs(2.4)).len(), 0);
    }

    #[test]
    fn direction_appears_in_the_phrase() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let t0 = Instant::now();

        let left = person_at(25, 75, 50); // center (50, 100)
        let phrases = tracker.observe(&[left], 300, t0);
        assert_eq!(
            phrases,
            vec!["person on the left, approximately 30.0 meters away"]
        );

        let right = person_at(225, 75, 50); // center (250, 100)
        let phrases = tracker.observe(&[right], 300, t0);
        assert_eq!(
            phrases,
            vec!["person on the right, approximately 30.0 meters away"]
        );
    }

    #[test]
    fn drifting_object_keeps_its_identity_across_bucket_boundaries() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let t0 = Instant::now();

        assert_eq!(tracker.observe(&[person_at(75, 75, 50)], 640, t0).len(), 1);
        // 60 px drift: different bucket key, but inside the 80 px proximity.
        let phrases = tracker.observe(&[person_at(135, 75, 50)], 640, t0 + secs(1.0));
        assert!(phrases.is_empty());
        assert_eq!(tracker.tracked_count(), 1);
    }

    #[test]
    fn ambiguous_proximity_match_resolves_to_the_nearest_identity() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let t0 = Instant::now();

        // Two persons: centers (100, 100) and (200, 100), announced 2 s
        // apart so their cooldowns expire at different times.
        assert_eq!(tracker.observe(&[person_at(75, 75, 50)], 640, t0).len(), 1);
        assert_eq!(
            tracker
                .observe(&[person_at(175, 75, 50)], 640, t0 + secs(2.0))
                .len(),
            1
        );

        // Center (130, 100) is within the 80 px proximity of both. It must
        // match the nearer identity at (100, 100), whose cooldown has
        // elapsed, so it announces; a match against the farther one would
        // stay silent.
        let phrases = tracker.observe(&[person_at(105, 75, 50)], 640, t0 + secs(2.6));
        assert_eq!(phrases.len(), 1);
        assert_eq!(tracker.tracked_count(), 2);
    }

    #[test]
    fn distant_same_label_detection_is_a_new_identity() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let t0 = Instant::now();

        assert_eq!(tracker.observe(&[person_at(75, 75, 50)], 640, t0).len(), 1);
        let phrases = tracker.observe(&[person_at(375, 75, 50)], 640, t0 + secs(0.1));
        assert_eq!(phrases.len(), 1);
        assert_eq!(tracker.tracked_count(), 2);
    }

    #[test]
    fn unannounced_identity_is_evicted_after_the_staleness_window() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let det = person_at(75, 75, 50);
        let t0 = Instant::now();

        assert_eq!(tracker.observe(&[det.clone()], 300, t0).len(), 1);
        assert_eq!(tracker.tracked_count(), 1);

        // Object leaves the frame; a later pass past the staleness window
        // garbage-collects the identity.
        assert!(tracker.observe(&[], 300, t0 + secs(6.5)).is_empty());
        assert_eq!(tracker.tracked_count(), 0);

        // The same spot is now a brand-new identity: announced immediately.
        let phrases = tracker.observe(&[det], 300, t0 + secs(6.6));
        assert_eq!(phrases.len(), 1);
    }

    #[test]
    fn continuously_visible_object_is_restamped_and_survives() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let det = person_at(75, 75, 50);
        let t0 = Instant::now();

        // Seen every second: announcements at t0 and whenever the cooldown
        // elapses, each restamping the announcement age, so the identity is
        // never evicted.
        let mut announcements = 0;
        for tick in 0..8 {
            announcements += tracker
                .observe(&[det.clone()], 300, t0 + secs(tick as f64))
                .len();
        }
        assert_eq!(tracker.tracked_count(), 1);
        // t0, t0+3, t0+6 (2.5 s cooldown over 1 s ticks).
        assert_eq!(announcements, 3);
    }

    #[test]
    fn degenerate_boxes_are_silently_skipped() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let zero_width = Detection::new("person", 0.9, BoundingBox::new(10, 10, 10, 40));
        let inverted = Detection::new("person", 0.9, BoundingBox::new(40, 10, 10, 40));

        let phrases = tracker.observe(&[zero_width, inverted], 300, Instant::now());
        assert!(phrases.is_empty());
        assert_eq!(tracker.tracked_count(), 0);
    }

    #[test]
    fn multiple_detections_announce_in_detection_order() {
        let mut tracker = ObjectTracker::new(TrackerConfig::default());
        let t0 = Instant::now();

        let person = person_at(25, 75, 50);
        let car = Detection::new("car", 0.8, BoundingBox::new(400, 75, 500, 175));
        let phrases = tracker.observe(&[person, car], 640, t0);

        assert_eq!(phrases.len(), 2);
        assert!(phrases[0].starts_with("person "));
        assert!(phrases[1].starts_with("car "));
    }
}
