//! Trait for object detection inference backends.

use crate::agent::Detection;
use crate::integration::Frame;

/// Trait for object detection inference backends.
///
/// Implement this trait to connect any detection model to the driving agent.
/// Traffic-light colours are filled in afterwards by a
/// [`LightClassifier`](crate::integration::LightClassifier), so returned
/// detections normally carry `color: None`.
///
/// # Example
///
/// ```ignore
/// use drive_agent::{Detection, DetectionSource, Frame};
///
/// struct MyDetector {
///     // Your model here
/// }
///
/// impl DetectionSource for MyDetector {
///     type Error = std::io::Error;
///
///     fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
///         // Run inference and return detections
///         Ok(vec![])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Error type for detection failures.
    type Error;

    /// Run inference on one frame and return its detections.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: DetectionSource + ?Sized> DetectionSource for Box<D> {
    type Error = D::Error;

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Self::Error> {
        (**self).detect(frame)
    }
}
