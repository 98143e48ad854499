//! Greedy IoU tracker.

use crate::vision::{BBox, Track, TrackId, Tracker, VisionError};

#[derive(Debug, Clone)]
struct Slot {
    track: Track,
    missed: u32,
}

/// Tracking-by-detection with greedy IoU association.
///
/// Every unmatched detection starts a new track. A track that goes unmatched
/// coasts for up to `max_coast` updates (hidden from the output) and is then
/// dropped; ids are never reused.
#[derive(Debug, Clone)]
pub struct IouTracker {
    min_iou: f32,
    max_coast: u32,
    slots: Vec<Slot>,
    next_id: u32,
}

impl Default for IouTracker {
    fn default() -> Self {
        Self {
            min_iou: 0.3,
            max_coast: 5,
            slots: Vec::new(),
            next_id: 1,
        }
    }
}

impl IouTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_iou(mut self, min_iou: f32) -> Self {
        self.min_iou = min_iou;
        self
    }

    pub fn with_max_coast(mut self, updates: u32) -> Self {
        self.max_coast = updates;
        self
    }

    /// Tracks alive, including coasting ones.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Tracker for IouTracker {
    fn update(&mut self, detections: &[BBox]) -> Result<Vec<Track>, VisionError> {
        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (si, slot) in self.slots.iter().enumerate() {
            for (di, det) in detections.iter().enumerate() {
                let iou = slot.track.bbox.iou(det);
                if iou >= self.min_iou {
                    pairs.push((si, di, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut slot_matched = vec![false; self.slots.len()];
        let mut det_matched = vec![false; detections.len()];
        for (si, di, _) in pairs {
            if slot_matched[si] || det_matched[di] {
                continue;
            }
            slot_matched[si] = true;
            det_matched[di] = true;
            self.slots[si].track.bbox = detections[di];
            self.slots[si].missed = 0;
        }

        for (slot, matched) in self.slots.iter_mut().zip(&slot_matched) {
            if !matched {
                slot.missed += 1;
            }
        }
        let max_coast = self.max_coast;
        self.slots.retain(|slot| {
            let alive = slot.missed <= max_coast;
            if !alive {
                tracing::debug!("Track {} dropped", slot.track.id);
            }
            alive
        });

        for (det, _) in detections.iter().zip(&det_matched).filter(|(_, m)| !**m) {
            let id = TrackId(self.next_id);
            self.next_id += 1;
            tracing::debug!("Track {} started", id);
            self.slots.push(Slot {
                track: Track { bbox: *det, id },
                missed: 0,
            });
        }

        Ok(self
            .slots
            .iter()
            .filter(|slot| slot.missed == 0)
            .map(|slot| slot.track)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32) -> BBox {
        BBox::new(x, 10.0, x + 40.0, 110.0)
    }

    fn ids(tracks: &[Track]) -> Vec<u32> {
        tracks.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_ids_follow_moving_boxes() {
        let mut tracker = IouTracker::new();
        let first = tracker.update(&[boxed(0.0), boxed(200.0)]).unwrap();
        assert_eq!(ids(&first), vec![1, 2]);

        // swapped order, small motion
        let second = tracker.update(&[boxed(205.0), boxed(4.0)]).unwrap();
        assert_eq!(ids(&second), vec![1, 2]);
        assert_eq!(second[0].bbox, boxed(4.0));
        assert_eq!(second[1].bbox, boxed(205.0));
    }

    #[test]
    fn test_jump_starts_new_track() {
        let mut tracker = IouTracker::new();
        tracker.update(&[boxed(0.0)]).unwrap();
        let tracks = tracker.update(&[boxed(100.0)]).unwrap();
        assert_eq!(ids(&tracks), vec![2]);
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn test_coast_then_drop() {
        let mut tracker = IouTracker::new().with_max_coast(2);
        tracker.update(&[boxed(0.0)]).unwrap();
        assert!(tracker.update(&[]).unwrap().is_empty());
        assert!(tracker.update(&[]).unwrap().is_empty());
        assert_eq!(tracker.len(), 1);

        // reacquired while coasting keeps the id
        assert_eq!(ids(&tracker.update(&[boxed(2.0)]).unwrap()), vec![1]);

        for _ in 0..3 {
            tracker.update(&[]).unwrap();
        }
        assert!(tracker.is_empty());
        assert_eq!(ids(&tracker.update(&[boxed(2.0)]).unwrap()), vec![2]);
    }

    #[test]
    fn test_min_iou_threshold() {
        let mut tracker = IouTracker::new().with_min_iou(0.9);
        tracker.update(&[boxed(0.0)]).unwrap();
        // IoU of a 10 px shift on a 40 px box is 0.6
        let tracks = tracker.update(&[boxed(10.0)]).unwrap();
        assert_eq!(ids(&tracks), vec![2]);
    }
}
