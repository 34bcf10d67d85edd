//! Builder for creating validated Detection objects from detector output.

use crate::agent::{ClassId, Detection, LightColor, Rect};
use crate::error::AgentError;

/// Builder for creating `Detection` objects from various input formats.
///
/// [`DetectionBuilder::build`] is the single validation point between the
/// detector and the agent.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    class_id: Option<ClassId>,
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
    color: Option<LightColor>,
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the detector class.
    pub fn class(mut self, class_id: impl Into<ClassId>) -> Self {
        self.class_id = Some(class_id.into());
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, l: f32, t: f32, w: f32, h: f32) -> Self {
        self.x1 = l;
        self.y1 = t;
        self.x2 = l + w;
        self.y2 = t + h;
        self
    }

    /// Set the confidence score.
    pub fn score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Attach a traffic-light colour label.
    pub fn color(mut self, color: Option<LightColor>) -> Self {
        self.color = color;
        self
    }

    /// Read the legacy flat layout `[class, conf, x1, y1, x2, y2]`.
    ///
    /// The colour is left absent; set it with [`DetectionBuilder::color`].
    pub fn from_fields(fields: &[f32]) -> Result<Self, AgentError> {
        let [class, score, x1, y1, x2, y2] = *fields else {
            return Err(AgentError::MalformedDetection(format!(
                "expected 6 fields, got {}",
                fields.len()
            )));
        };
        if !class.is_finite() || class < 0.0 || class.fract() != 0.0 {
            return Err(AgentError::MalformedDetection(format!(
                "class id {class} is not a non-negative integer"
            )));
        }
        Ok(Self::new()
            .class(class as u32)
            .score(score)
            .tlbr(x1, y1, x2, y2))
    }

    /// Build the final `Detection`, rejecting incomplete or unusable input.
    pub fn build(self) -> Result<Detection, AgentError> {
        let class_id = self
            .class_id
            .ok_or_else(|| AgentError::MalformedDetection("missing class id".to_string()))?;

        let detection = Detection {
            class_id,
            score: self.score,
            bbox: Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2),
            color: self.color,
        };
        detection.validate()?;
        Ok(detection)
    }
}
