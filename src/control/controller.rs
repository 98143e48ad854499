//! The per-tick focus control loop.
//!
//! Each tick pulls a frame pair, refreshes the ROI, detects and tracks people
//! inside it, fuses a focus distance from the current selection (face, then
//! mask, then optical flow) and hands the result to the motor gate. The loop
//! is single-threaded; the only state shared with the motor worker sits
//! behind [`MotorLink`].

use std::sync::Arc;
use std::time::Duration;

use image::imageops;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::calibration::{CalibrationCurve, CorrectionOffset};
use crate::fusion::{
    crop_bbox, flow_depth_median, mean_depth_in, occlusion_crop, sample_mask, DepthProfile,
    MarkerKind,
};
use crate::motor::{FocusGate, MotorError, MotorLink, MotorLut};
use crate::selection::{PressOutcome, ReleaseOutcome, Roi, TargetAcquisition, TargetSelection};
use crate::tracking::{FlowTracker, FlowUpdate, LkParams};
use crate::vision::{BBox, Detector, FramePair, FrameSource, Point, Track, Tracker, VisionError};

use super::config::ControlConfig;
use super::report::{FocusSource, TickReport};

/// Errors that abandon a tick.
#[derive(Error, Debug)]
pub enum ControlError {
    #[error(transparent)]
    Vision(#[from] VisionError),
    #[error("Color {color:?} and depth {depth:?} frames are not aligned")]
    Misaligned { color: (u32, u32), depth: (u32, u32) },
}

/// The external vision collaborators.
pub struct VisionStack {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn Detector>,
    pub tracker: Box<dyn Tracker>,
}

/// Autofocus control loop state, threaded from tick to tick.
pub struct FocusController<M: MotorLink> {
    config: ControlConfig,
    curve: Arc<CalibrationCurve>,
    lut: Arc<MotorLut>,
    vision: VisionStack,
    motor: M,
    acquisition: TargetAcquisition,
    flow: FlowTracker,
    gate: FocusGate,
    focus_distance_m: f64,
    tracks: Vec<Track>,
    rng: StdRng,
}

impl<M: MotorLink> FocusController<M> {
    pub fn new(
        config: ControlConfig,
        curve: Arc<CalibrationCurve>,
        lut: Arc<MotorLut>,
        vision: VisionStack,
        motor: M,
    ) -> Self {
        let acquisition = TargetAcquisition::new(config.corner_size, config.min_roi_size);
        let gate = FocusGate::new(config.hysteresis_m, config.ramp_time_s, config.fast_time_s);
        Self {
            config,
            curve,
            lut,
            vision,
            motor,
            acquisition,
            flow: FlowTracker::new(LkParams::default()),
            gate,
            focus_distance_m: 0.0,
            tracks: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed seed for mask sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn focus_distance(&self) -> f64 {
        self.focus_distance_m
    }

    pub fn selection(&self) -> TargetSelection {
        self.acquisition.selection()
    }

    pub fn roi(&self) -> Option<Roi> {
        self.acquisition.roi()
    }

    /// Tracks from the last completed detection.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }

    pub fn motor(&self) -> &M {
        &self.motor
    }

    /// Change the ramp focus time used until focus first locks.
    pub fn set_focus_time(&mut self, seconds: f64) {
        self.gate.set_ramp_time(seconds);
        tracing::debug!("Focus time set to {:.2} s", self.gate.ramp_time());
    }

    pub fn press(&mut self, p: Point) -> PressOutcome {
        let before = self.acquisition.selection();
        let outcome = self.acquisition.press(p, &self.tracks);
        match outcome {
            PressOutcome::TrackLocked(_) => {
                self.flow.invalidate();
                self.gate.reset();
            }
            PressOutcome::FlowPointSet(local) => {
                self.flow.select(local);
                self.gate.reset();
            }
            PressOutcome::Cleared => {
                self.flow.invalidate();
                if before != TargetSelection::None {
                    tracing::info!("Focus selection cleared");
                    self.gate.reset();
                }
            }
            PressOutcome::CornerGrabbed(_) | PressOutcome::Ignored => {}
        }
        outcome
    }

    pub fn move_to(&mut self, p: Point) -> bool {
        self.acquisition.move_to(p)
    }

    pub fn release(&mut self) -> ReleaseOutcome {
        let outcome = self.acquisition.release();
        if outcome.dragged {
            self.flow.invalidate();
        }
        if outcome.selection_cleared {
            self.gate.reset();
        }
        outcome
    }

    /// Forget the selection and flow state and unlock focus. The ROI and the
    /// last focus distance are kept.
    pub fn reset(&mut self) {
        self.acquisition.reset();
        self.flow.invalidate();
        self.gate.reset();
        tracing::info!("Tracking reset");
    }

    /// Run one control tick.
    ///
    /// Returns `Ok(None)` when there was nothing to process (no frame pair or
    /// an empty ROI); the loop state is left untouched in that case.
    pub fn tick(&mut self) -> Result<Option<TickReport>, ControlError> {
        let Some(frame) = self.vision.source.aligned_frames()? else {
            tracing::trace!("No frame pair this tick");
            return Ok(None);
        };
        if !frame.is_aligned() {
            return Err(ControlError::Misaligned {
                color: frame.color.dimensions(),
                depth: frame.depth.dimensions(),
            });
        }
        let (width, height) = (frame.width(), frame.height());
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let roi = self.acquisition.on_frame(width, height);
        if roi.width() <= 0 || roi.height() <= 0 {
            return Ok(None);
        }
        let roi_origin = (roi.start.x as u32, roi.start.y as u32);
        let roi_color = imageops::crop_imm(
            &frame.color,
            roi_origin.0,
            roi_origin.1,
            roi.width() as u32,
            roi.height() as u32,
        )
        .to_image();

        let detections: Vec<BBox> = self
            .vision
            .detector
            .detect_person_bboxes(&roi_color)?
            .into_iter()
            .map(|b| b.translate(roi_origin.0 as f32, roi_origin.1 as f32))
            .collect();
        self.tracks = self.vision.tracker.update(&detections)?;

        let mut profile = DepthProfile::new(width);
        let selection = self.acquisition.selection();
        let mut source = None;

        if let TargetSelection::LockedTrack(id) = selection {
            if let Some(track) = self.tracks.iter().find(|t| t.id == id).copied() {
                source = self.fuse_locked_track(&frame, &track, &mut profile)?;
            }
        }
        self.add_untracked_markers(&frame, selection, &mut profile)?;

        if let TargetSelection::FlowPoint(_) = selection {
            let gray = imageops::grayscale(&roi_color);
            source = self.fuse_flow(&frame, &gray, roi_origin);
        }

        let target_steps = self.lut.distance_to_steps(self.focus_distance_m);
        let current_steps = self.motor.current_steps();
        self.gate.observe(target_steps, current_steps);

        let command = match self.gate.plan(self.focus_distance_m, target_steps) {
            Some(command) => match self.motor.enqueue_move(command) {
                Ok(()) => {
                    self.gate.commit(self.focus_distance_m);
                    tracing::debug!(
                        "Focus {:.3} m -> {} steps in {:.3} s",
                        self.focus_distance_m,
                        command.target_steps,
                        command.focus_time
                    );
                    Some(command)
                }
                Err(e) => {
                    tracing::warn!("Motor command dropped: {}", e);
                    None
                }
            },
            None => None,
        };

        profile.focus_distance_m = self.focus_distance_m;
        profile.focus_plane_m = if current_steps != 0 {
            self.lut.steps_to_distance(current_steps)
        } else {
            self.config.profile.near_limit_m
        };

        Ok(Some(TickReport {
            roi,
            tracks: self.tracks.clone(),
            selection: self.acquisition.selection(),
            source,
            focus_distance_m: self.focus_distance_m,
            target_steps,
            current_steps,
            command,
            locked: self.gate.is_locked(),
            profile,
        }))
    }

    /// Face, then mask, for the locked person. Also adds the person's mask
    /// samples to the profile.
    fn fuse_locked_track(
        &mut self,
        frame: &FramePair,
        track: &Track,
        profile: &mut DepthProfile,
    ) -> Result<Option<FocusSource>, ControlError> {
        let others: Vec<BBox> = self
            .tracks
            .iter()
            .filter(|t| t.id != track.id)
            .map(|t| t.bbox)
            .collect();
        let Some(crop) = occlusion_crop(&frame.color, &track.bbox, &others) else {
            return Ok(None);
        };

        let mut source = None;
        let faces = self.vision.detector.detect_faces(&crop.image)?;
        if let Some(face) = faces
            .iter()
            .find(|f| f.score > self.config.face_score_threshold)
        {
            let raw_m = mean_depth_in(&frame.depth, &crop.to_frame(&face.bbox));
            let corrected_m = self.curve.correct(raw_m);
            self.focus_distance_m = corrected_m + self.config.camera_offset_m;
            source = Some(FocusSource::Face { raw_m, corrected_m });
        }

        if let Some(mask) = self.vision.detector.segment_person(&crop.image)? {
            let sample = sample_mask(
                &mask,
                crop.image.dimensions(),
                crop.origin,
                &frame.depth,
                self.config.tracked_sample_ratio,
                &mut self.rng,
            );
            if let Some(sample) = sample {
                let offset = CorrectionOffset::from_mean(sample.mean_m, &self.curve);
                profile.add_samples(
                    &sample.points,
                    offset.diff(),
                    self.config.camera_offset_m,
                    MarkerKind::Tracked,
                );
                if source.is_none() {
                    let corrected_m = offset.apply(sample.mean_m);
                    self.focus_distance_m = corrected_m + self.config.camera_offset_m;
                    source = Some(FocusSource::Mask {
                        raw_m: sample.mean_m,
                        corrected_m,
                    });
                }
            }
        }

        Ok(source)
    }

    /// Background markers for everyone who is not the locked person.
    fn add_untracked_markers(
        &mut self,
        frame: &FramePair,
        selection: TargetSelection,
        profile: &mut DepthProfile,
    ) -> Result<(), ControlError> {
        for track in &self.tracks {
            if selection == TargetSelection::LockedTrack(track.id) {
                continue;
            }
            let Some(crop) = crop_bbox(&frame.color, &track.bbox) else {
                continue;
            };
            let Some(mask) = self.vision.detector.segment_person(&crop.image)? else {
                continue;
            };
            let sample = sample_mask(
                &mask,
                crop.image.dimensions(),
                crop.origin,
                &frame.depth,
                self.config.untracked_sample_ratio,
                &mut self.rng,
            );
            if let Some(sample) = sample {
                let offset = CorrectionOffset::from_mean(sample.mean_m, &self.curve);
                profile.add_samples(
                    &sample.points,
                    offset.diff(),
                    self.config.camera_offset_m,
                    MarkerKind::Untracked,
                );
            }
        }
        Ok(())
    }

    /// Optical-flow source for a manually picked point.
    fn fuse_flow(
        &mut self,
        frame: &FramePair,
        gray_roi: &image::GrayImage,
        roi_origin: (u32, u32),
    ) -> Option<FocusSource> {
        match self.flow.update(gray_roi) {
            FlowUpdate::Tracking(points) => {
                let raw_m = flow_depth_median(
                    &frame.depth,
                    &points,
                    roi_origin,
                    self.config.flow_window_half,
                );
                let corrected_m = self.curve.correct(raw_m);
                if corrected_m > 0.0 {
                    self.focus_distance_m = corrected_m + self.config.camera_offset_m;
                    Some(FocusSource::Flow { raw_m, corrected_m })
                } else {
                    None
                }
            }
            FlowUpdate::Lost | FlowUpdate::Inactive => {
                tracing::info!("Focus point lost, selection cleared");
                self.acquisition.clear_selection();
                None
            }
        }
    }

    /// Stop the motor worker and wait until it has homed.
    pub fn shutdown(&mut self, grace: Duration) -> Result<(), MotorError> {
        tracing::info!("Shutting down focus controller");
        self.motor.shutdown(grace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::LightingCondition;
    use crate::motor::{MoveCommand, MotorError};
    use crate::vision::{DepthImage, Face, PersonMask, TrackId};
    use image::{Luma, RgbImage};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    const W: u32 = 320;
    const H: u32 = 240;

    struct ScriptedSource {
        frames: VecDeque<Option<FramePair>>,
        fallback: Option<FramePair>,
    }

    impl FrameSource for ScriptedSource {
        fn aligned_frames(&mut self) -> Result<Option<FramePair>, VisionError> {
            Ok(self
                .frames
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone()))
        }
    }

    #[derive(Clone, Default)]
    struct FixedDetector {
        /// ROI-relative person boxes.
        persons: Rc<RefCell<Vec<BBox>>>,
        /// Crop-relative faces.
        faces: Rc<RefCell<Vec<Face>>>,
        mask: Rc<RefCell<bool>>,
        fail: Rc<Cell<bool>>,
    }

    impl Detector for FixedDetector {
        fn detect_person_bboxes(&mut self, _image: &RgbImage) -> Result<Vec<BBox>, VisionError> {
            if self.fail.get() {
                return Err(VisionError::Detector("inference failed".into()));
            }
            Ok(self.persons.borrow().clone())
        }

        fn detect_faces(&mut self, _image: &RgbImage) -> Result<Vec<Face>, VisionError> {
            Ok(self.faces.borrow().clone())
        }

        fn segment_person(&mut self, image: &RgbImage) -> Result<Option<PersonMask>, VisionError> {
            if !*self.mask.borrow() {
                return Ok(None);
            }
            // half-size mask to exercise the resize path
            let (w, h) = ((image.width() / 2).max(1), (image.height() / 2).max(1));
            Ok(Some(PersonMask::from_pixel(w, h, Luma([0.9]))))
        }
    }

    /// Numbers detections in order.
    struct IndexTracker;

    impl Tracker for IndexTracker {
        fn update(&mut self, detections: &[BBox]) -> Result<Vec<Track>, VisionError> {
            Ok(detections
                .iter()
                .enumerate()
                .map(|(i, b)| Track {
                    bbox: *b,
                    id: TrackId(i as u32 + 1),
                })
                .collect())
        }
    }

    #[derive(Clone, Default)]
    struct FakeMotor {
        commands: Rc<RefCell<Vec<MoveCommand>>>,
        steps: Rc<Cell<i32>>,
        reject: Rc<Cell<bool>>,
    }

    impl MotorLink for FakeMotor {
        fn enqueue_move(&self, command: MoveCommand) -> Result<(), MotorError> {
            if self.reject.get() {
                return Err(MotorError::WorkerStopped);
            }
            self.commands.borrow_mut().push(command);
            Ok(())
        }

        fn current_steps(&self) -> i32 {
            self.steps.get()
        }

        fn shutdown(&mut self, _timeout: Duration) -> Result<(), MotorError> {
            self.steps.set(0);
            Ok(())
        }
    }

    fn textured_frame(depth_mm: impl Fn(u32, u32) -> u16) -> FramePair {
        let color = RgbImage::from_fn(W, H, |x, y| {
            let v = 128.0
                + 40.0 * (0.25 * x as f32).sin()
                + 40.0 * (0.2 * y as f32 + 0.5).sin();
            let v = v.round() as u8;
            image::Rgb([v, v, v])
        });
        let depth = DepthImage::from_fn(W, H, |x, y| Luma([depth_mm(x, y)]));
        FramePair::new(color, depth)
    }

    struct Rig {
        controller: FocusController<FakeMotor>,
        detector: FixedDetector,
        motor: FakeMotor,
    }

    fn rig(frames: Vec<Option<FramePair>>, fallback: Option<FramePair>) -> Rig {
        let detector = FixedDetector::default();
        let motor = FakeMotor::default();
        let vision = VisionStack {
            source: Box::new(ScriptedSource {
                frames: frames.into(),
                fallback,
            }),
            detector: Box::new(detector.clone()),
            tracker: Box::new(IndexTracker),
        };
        let controller = FocusController::new(
            ControlConfig::default().with_ramp_time(1.5),
            LightingCondition::IndoorBad.curve(),
            MotorLut::builtin(),
            vision,
            motor.clone(),
        )
        .with_seed(11);
        Rig {
            controller,
            detector,
            motor,
        }
    }

    /// ROI for 320x240 is (118, 88)-(195, 156).
    fn person_in_roi() -> BBox {
        BBox::new(10.0, 5.0, 50.0, 60.0)
    }

    #[test]
    fn test_missing_frame_skips_tick() {
        let mut rig = rig(vec![None], None);
        assert!(rig.controller.tick().unwrap().is_none());
        assert!(rig.motor.commands.borrow().is_empty());
        assert_eq!(rig.controller.roi(), None);
    }

    #[test]
    fn test_misaligned_frame_is_an_error() {
        let mut frame = textured_frame(|_, _| 1000);
        frame.depth = DepthImage::new(10, 10);
        let mut rig = rig(vec![Some(frame)], None);
        assert!(matches!(
            rig.controller.tick(),
            Err(ControlError::Misaligned { .. })
        ));
    }

    #[test]
    fn test_detector_error_abandons_tick_and_loop_continues() {
        let frame = textured_frame(|_, _| 1000);
        let mut rig = rig(vec![], Some(frame));
        rig.detector.fail.set(true);
        assert!(rig.controller.tick().is_err());
        rig.detector.fail.set(false);
        assert!(rig.controller.tick().unwrap().is_some());
    }

    #[test]
    fn test_face_distance_indoor_bad() {
        let frame = textured_frame(|_, _| 1000);
        let mut rig = rig(vec![], Some(frame));
        rig.detector.persons.borrow_mut().push(person_in_roi());
        rig.detector.faces.borrow_mut().push(Face {
            bbox: BBox::new(5.0, 5.0, 25.0, 25.0),
            score: 0.9,
        });

        rig.controller.tick().unwrap();
        let track = rig.controller.tracks()[0];
        let press = Point::new(track.bbox.x1 as i32 + 5, track.bbox.y1 as i32 + 30);
        assert_eq!(
            rig.controller.press(press),
            PressOutcome::TrackLocked(TrackId(1))
        );

        let report = rig.controller.tick().unwrap().unwrap();
        let corrected = 0.9 + (1.00 - 0.90) / (1.01 - 0.90) * (1.0 - 0.9);
        let expected = corrected + 0.075;
        assert!(matches!(report.source, Some(FocusSource::Face { .. })));
        assert!((report.focus_distance_m - expected).abs() < 1e-9);
        let command = report.command.unwrap();
        assert_eq!(
            command.target_steps,
            MotorLut::builtin().distance_to_steps(expected)
        );
        assert_eq!(command.focus_time, 1.5);
    }

    #[test]
    fn test_mask_source_when_no_face() {
        let frame = textured_frame(|_, _| 2000);
        let mut rig = rig(vec![], Some(frame));
        rig.detector.persons.borrow_mut().push(person_in_roi());
        *rig.detector.mask.borrow_mut() = true;

        rig.controller.tick().unwrap();
        let bbox = rig.controller.tracks()[0].bbox;
        rig.controller
            .press(Point::new(bbox.x1 as i32 + 20, bbox.y1 as i32 + 30));
        let report = rig.controller.tick().unwrap().unwrap();

        let corrected = LightingCondition::IndoorBad.curve().correct(2.0);
        assert!(matches!(report.source, Some(FocusSource::Mask { .. })));
        assert!((report.focus_distance_m - (corrected + 0.075)).abs() < 1e-9);
        assert!(report
            .profile
            .markers
            .iter()
            .all(|m| m.kind == MarkerKind::Tracked));
        assert!(!report.profile.markers.is_empty());
    }

    #[test]
    fn test_untracked_people_only_add_markers() {
        let frame = textured_frame(|_, _| 3000);
        let mut rig = rig(vec![], Some(frame));
        rig.detector.persons.borrow_mut().push(person_in_roi());
        *rig.detector.mask.borrow_mut() = true;

        let report = rig.controller.tick().unwrap().unwrap();
        assert!(report.source.is_none());
        assert_eq!(report.focus_distance_m, 0.0);
        assert!(!report.profile.markers.is_empty());
        assert!(report
            .profile
            .markers
            .iter()
            .all(|m| m.kind == MarkerKind::Untracked));
    }

    #[test]
    fn test_flow_point_sets_focus_from_median() {
        let frame = textured_frame(|x, _| if x < 160 { 1500 } else { 0 });
        let mut rig = rig(vec![], Some(frame));
        rig.controller.tick().unwrap();
        let roi = rig.controller.roi().unwrap();

        let outcome = rig.controller.press(roi.start + Point::new(20, 30));
        assert_eq!(outcome, PressOutcome::FlowPointSet(Point::new(20, 30)));
        let report = rig.controller.tick().unwrap().unwrap();

        let corrected = LightingCondition::IndoorBad.curve().correct(1.5);
        assert!(matches!(report.source, Some(FocusSource::Flow { .. })));
        assert!((report.focus_distance_m - (corrected + 0.075)).abs() < 1e-9);
    }

    #[test]
    fn test_flow_on_invalid_depth_keeps_distance() {
        let frame = textured_frame(|_, _| 0);
        let mut rig = rig(vec![], Some(frame));
        rig.controller.tick().unwrap();
        let roi = rig.controller.roi().unwrap();
        rig.controller.press(roi.start + Point::new(20, 30));
        let report = rig.controller.tick().unwrap().unwrap();
        assert!(report.source.is_none());
        assert_eq!(report.focus_distance_m, 0.0);
        assert!(matches!(report.selection, TargetSelection::FlowPoint(_)));
    }

    #[test]
    fn test_flow_loss_clears_selection() {
        let flat = FramePair::new(
            RgbImage::from_pixel(W, H, image::Rgb([90, 90, 90])),
            DepthImage::from_pixel(W, H, Luma([1000])),
        );
        let mut rig = rig(vec![], Some(flat));
        rig.controller.tick().unwrap();
        let roi = rig.controller.roi().unwrap();
        rig.controller.press(roi.start + Point::new(20, 30));
        let report = rig.controller.tick().unwrap().unwrap();
        assert!(report.source.is_none());
        assert_eq!(report.selection, TargetSelection::None);
    }

    #[test]
    fn test_drag_release_invalidates_flow_point() {
        let frame = textured_frame(|_, _| 1500);
        let mut rig = rig(vec![], Some(frame));
        rig.controller.tick().unwrap();
        let roi = rig.controller.roi().unwrap();
        rig.controller.press(roi.start + Point::new(20, 30));
        rig.controller.press(roi.start);
        assert!(rig.controller.move_to(roi.start + Point::new(-10, -10)));
        let outcome = rig.controller.release();
        assert!(outcome.dragged && outcome.selection_cleared);
        assert_eq!(rig.controller.selection(), TargetSelection::None);
        let moved = rig.controller.roi().unwrap();
        assert_eq!(moved.start, roi.start + Point::new(-10, -10));
    }

    #[test]
    fn test_hysteresis_and_lock_across_ticks() {
        let frame = textured_frame(|_, _| 1500);
        let mut rig = rig(vec![], Some(frame));
        rig.controller.tick().unwrap();
        let roi = rig.controller.roi().unwrap();
        rig.controller.press(roi.start + Point::new(20, 30));

        let first = rig.controller.tick().unwrap().unwrap();
        let command = first.command.unwrap();
        assert_eq!(command.focus_time, 1.5);
        assert!(!first.locked);

        // same distance, within hysteresis
        let second = rig.controller.tick().unwrap().unwrap();
        assert!(second.command.is_none());

        // motor arrives; the lock flips but nothing new is sent
        rig.motor.steps.set(command.target_steps);
        let third = rig.controller.tick().unwrap().unwrap();
        assert!(third.locked);
        assert!(third.command.is_none());

        // a fresh selection unlocks and re-arms the ramp while the motor is away
        rig.motor.steps.set(0);
        rig.controller.press(roi.start + Point::new(25, 35));
        let fourth = rig.controller.tick().unwrap().unwrap();
        assert_eq!(fourth.command.unwrap().focus_time, 1.5);
    }

    #[test]
    fn test_enqueue_failure_retries_next_tick() {
        let frame = textured_frame(|_, _| 1500);
        let mut rig = rig(vec![], Some(frame));
        rig.motor.reject.set(true);
        assert!(rig.controller.tick().unwrap().unwrap().command.is_none());
        rig.motor.reject.set(false);
        assert!(rig.controller.tick().unwrap().unwrap().command.is_some());
    }

    #[test]
    fn test_reset_and_focus_time() {
        let frame = textured_frame(|_, _| 1500);
        let mut rig = rig(vec![], Some(frame));
        rig.controller.tick().unwrap();
        let roi = rig.controller.roi().unwrap();
        rig.controller.press(roi.start + Point::new(20, 30));
        rig.controller.tick().unwrap();
        let distance = rig.controller.focus_distance();

        rig.controller.reset();
        rig.controller.set_focus_time(0.25);
        assert_eq!(rig.controller.selection(), TargetSelection::None);
        assert_eq!(rig.controller.focus_distance(), distance);

        // the held distance is re-committed with the new ramp time
        let report = rig.controller.tick().unwrap().unwrap();
        assert_eq!(report.command.unwrap().focus_time, 0.25);
    }

    #[test]
    fn test_focus_plane_reported_from_motor_position() {
        let frame = textured_frame(|_, _| 1500);
        let mut rig = rig(vec![], Some(frame));
        let idle = rig.controller.tick().unwrap().unwrap();
        assert_eq!(idle.profile.focus_plane_m, 0.6);
        rig.motor.steps.set(100);
        let moved = rig.controller.tick().unwrap().unwrap();
        let plane = MotorLut::builtin().steps_to_distance(100);
        assert!((moved.profile.focus_plane_m - plane).abs() < 1e-12);
        rig.controller.shutdown(Duration::from_secs(1)).unwrap();
        assert_eq!(rig.motor.current_steps(), 0);
    }
}
