//! DrivePipeline for combining detection, light colouring and decisions.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::agent::{Decision, Detection, DrivingAgent, check_fraction};
use crate::error::{AgentError, ConfigError};
use crate::settings::Settings;

use super::{DetectionSource, Frame, HsvLightClassifier, LightClassifier};

/// Perception-side settings applied before the agent sees detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Detections scoring below this are dropped.
    pub confidence_threshold: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.45,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // zero is allowed: keep everything
        if self.confidence_threshold == 0.0 {
            return Ok(());
        }
        check_fraction(
            "pipeline.confidence_threshold",
            f64::from(self.confidence_threshold),
        )
    }
}

/// Why a frame was rejected.
#[derive(Debug, Error)]
pub enum FrameError<E> {
    #[error("detector failed: {0}")]
    Detector(E),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

/// One step of the video loop: detect, colour traffic lights, decide.
///
/// [`DrivePipeline::process_frame`] never fails. A rejected frame is logged
/// and the previous decision is returned, starting from
/// [`Decision::PATH_CLEAR`].
pub struct DrivePipeline<D: DetectionSource, C: LightClassifier = HsvLightClassifier> {
    detector: D,
    classifier: C,
    agent: DrivingAgent,
    config: PipelineConfig,
    last_decision: Decision,
    frames_processed: u64,
    frames_rejected: u64,
}

impl<D: DetectionSource> DrivePipeline<D, HsvLightClassifier> {
    /// Create a pipeline with the HSV light classifier and default settings.
    pub fn with_default_config(detector: D) -> Self {
        Self::new(
            detector,
            HsvLightClassifier::default(),
            DrivingAgent::default(),
            PipelineConfig::default(),
        )
    }

    /// Create a pipeline whose agent, classifier and filter come from `settings`.
    pub fn from_settings(detector: D, settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        Ok(Self::new(
            detector,
            HsvLightClassifier::new(settings.color.clone()),
            DrivingAgent::new(settings.agent.clone()),
            settings.pipeline.clone(),
        ))
    }
}

impl<D: DetectionSource, C: LightClassifier> DrivePipeline<D, C> {
    pub fn new(detector: D, classifier: C, agent: DrivingAgent, config: PipelineConfig) -> Self {
        Self {
            detector,
            classifier,
            agent,
            config,
            last_decision: Decision::PATH_CLEAR,
            frames_processed: 0,
            frames_rejected: 0,
        }
    }

    /// Process a frame, holding the previous decision if the frame is rejected.
    pub fn process_frame(&mut self, frame: &Frame) -> Decision
    where
        D::Error: fmt::Display,
    {
        match self.try_process_frame(frame) {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    error = %e,
                    frame = self.frames_processed + self.frames_rejected,
                    held = %self.last_decision,
                    "frame rejected; holding previous decision"
                );
                self.last_decision
            }
        }
    }

    /// Process a frame and surface any detector or geometry error.
    pub fn try_process_frame(&mut self, frame: &Frame) -> Result<Decision, FrameError<D::Error>> {
        match self.run(frame) {
            Ok(decision) => {
                self.frames_processed += 1;
                self.last_decision = decision;
                Ok(decision)
            }
            Err(e) => {
                self.frames_rejected += 1;
                Err(e)
            }
        }
    }

    fn run(&mut self, frame: &Frame) -> Result<Decision, FrameError<D::Error>> {
        let raw = self.detector.detect(frame).map_err(FrameError::Detector)?;
        // One bad detection rejects the whole frame.
        for det in &raw {
            det.validate()?;
        }
        let detections = self.annotate(frame, raw);
        debug!(kept = detections.len(), "detections ready");
        Ok(self.agent.decide(&detections, frame.width(), frame.height())?)
    }

    /// Drop low-confidence detections and fill in traffic-light colours.
    fn annotate(&self, frame: &Frame, detections: Vec<Detection>) -> Vec<Detection> {
        let light_class = self.agent.config().traffic_light_class;

        detections
            .into_iter()
            .filter(|det| det.score >= self.config.confidence_threshold)
            .map(|mut det| {
                if det.class_id == light_class && det.color.is_none() {
                    det.color = Some(self.classifier.classify(frame, &det.bbox));
                }
                det
            })
            .collect()
    }

    /// The most recent accepted decision.
    pub fn last_decision(&self) -> Decision {
        self.last_decision
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the light classifier.
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Get a reference to the decision agent.
    pub fn agent(&self) -> &DrivingAgent {
        &self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ClassId, LightColor, ResolutionPolicy};

    struct MockDetector {
        frames: Vec<Result<Vec<Detection>, String>>,
    }

    impl DetectionSource for MockDetector {
        type Error = String;

        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
            if self.frames.is_empty() {
                return Ok(vec![]);
            }
            self.frames.remove(0)
        }
    }

    fn mock(frames: Vec<Result<Vec<Detection>, String>>) -> DrivePipeline<MockDetector> {
        DrivePipeline::with_default_config(MockDetector { frames })
    }

    #[test]
    fn test_empty_frame_is_path_clear() {
        let mut pipeline = mock(vec![]);
        let frame = Frame::filled(640, 480, [0, 0, 0]).unwrap();
        assert_eq!(pipeline.process_frame(&frame), Decision::PATH_CLEAR);
        assert_eq!(pipeline.frames_processed(), 1);
    }

    #[test]
    fn test_traffic_light_is_colored_from_pixels() {
        let light = Detection::new(ClassId::TRAFFIC_LIGHT, 0.8, 100.0, 50.0, 140.0, 110.0);
        let mut pipeline = mock(vec![Ok(vec![light])]);
        // whole frame lit red
        let frame = Frame::filled(640, 480, [0, 0, 255]).unwrap();
        assert_eq!(pipeline.process_frame(&frame), Decision::RED_LIGHT);
    }

    #[test]
    fn test_existing_color_is_kept() {
        let light = Detection::new(ClassId::TRAFFIC_LIGHT, 0.8, 100.0, 50.0, 140.0, 110.0)
            .with_color(LightColor::Yellow);
        let mut pipeline = mock(vec![Ok(vec![light])]);
        let frame = Frame::filled(640, 480, [0, 0, 255]).unwrap();
        assert_eq!(pipeline.process_frame(&frame), Decision::YELLOW_LIGHT);
    }

    #[test]
    fn test_low_confidence_dropped() {
        let car = Detection::new(ClassId::CAR, 0.3, 280.0, 380.0, 360.0, 460.0);
        let mut pipeline = mock(vec![Ok(vec![car])]);
        let frame = Frame::filled(640, 480, [0, 0, 0]).unwrap();
        assert_eq!(pipeline.process_frame(&frame), Decision::PATH_CLEAR);
    }

    #[test]
    fn test_detector_error_holds_previous_decision() {
        let car = Detection::new(ClassId::CAR, 0.9, 280.0, 380.0, 360.0, 460.0);
        let mut pipeline = mock(vec![Ok(vec![car]), Err("model crashed".to_string())]);
        let frame = Frame::filled(640, 480, [0, 0, 0]).unwrap();

        assert_eq!(pipeline.process_frame(&frame), Decision::OBSTACLE_CRITICAL);
        assert_eq!(pipeline.process_frame(&frame), Decision::OBSTACLE_CRITICAL);
        assert_eq!(pipeline.frames_processed(), 1);
        assert_eq!(pipeline.frames_rejected(), 1);
    }

    #[test]
    fn test_malformed_detection_rejects_frame() {
        let car = Detection::new(ClassId::CAR, 0.9, 280.0, 380.0, 360.0, 460.0);
        let nan_car = Detection::new(ClassId::CAR, 0.9, f32::NAN, 380.0, 360.0, 460.0);
        let mut pipeline = mock(vec![Ok(vec![car]), Ok(vec![nan_car])]);
        let frame = Frame::filled(640, 480, [0, 0, 0]).unwrap();

        assert_eq!(pipeline.process_frame(&frame), Decision::OBSTACLE_CRITICAL);
        assert_eq!(pipeline.process_frame(&frame), Decision::OBSTACLE_CRITICAL);
        assert_eq!(pipeline.frames_processed(), 1);
        assert_eq!(pipeline.frames_rejected(), 1);
    }

    #[test]
    fn test_malformed_detection_error_kind() {
        // validation runs before the confidence filter
        let inverted = Detection::new(ClassId::CAR, 0.1, 360.0, 380.0, 280.0, 460.0);
        let mut pipeline = mock(vec![Ok(vec![inverted])]);
        let frame = Frame::filled(8, 8, [0, 0, 0]).unwrap();
        let err = pipeline.try_process_frame(&frame).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Agent(AgentError::MalformedDetection(_))
        ));
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.agent.resolution = ResolutionPolicy::MostSevere;
        settings.color.area_threshold_fraction = 0.2;
        settings.pipeline.confidence_threshold = 0.2;

        let car = Detection::new(ClassId::CAR, 0.3, 280.0, 380.0, 360.0, 460.0);
        let mut pipeline =
            DrivePipeline::from_settings(MockDetector { frames: vec![Ok(vec![car])] }, &settings)
                .unwrap();
        assert_eq!(pipeline.agent().config().resolution, ResolutionPolicy::MostSevere);
        assert_eq!(pipeline.classifier().config().area_threshold_fraction, 0.2);

        let frame = Frame::filled(640, 480, [0, 0, 0]).unwrap();
        assert_eq!(pipeline.process_frame(&frame), Decision::OBSTACLE_CRITICAL);

        settings.agent.lane_width_fraction = f64::NAN;
        let invalid = DrivePipeline::from_settings(MockDetector { frames: vec![] }, &settings);
        assert!(invalid.is_err());
    }

    #[test]
    fn test_try_process_surfaces_detector_error() {
        let mut pipeline = mock(vec![Err("boom".to_string())]);
        let frame = Frame::filled(8, 8, [0, 0, 0]).unwrap();
        let err = pipeline.try_process_frame(&frame).unwrap_err();
        assert!(matches!(err, FrameError::Detector(ref msg) if msg == "boom"));
        assert_eq!(err.to_string(), "detector failed: boom");
        assert_eq!(pipeline.last_decision(), Decision::PATH_CLEAR);
    }

    #[test]
    fn test_pipeline_config_validation() {
        assert!(PipelineConfig::default().validate().is_ok());
        assert!(PipelineConfig { confidence_threshold: 0.0 }.validate().is_ok());
        assert!(PipelineConfig { confidence_threshold: 1.2 }.validate().is_err());
    }
}
