//! Per-frame detection input for the agent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::agent::rect::Rect;
use crate::error::AgentError;

/// Category identifier from the detector's (COCO) taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const PERSON: ClassId = ClassId(0);
    pub const BICYCLE: ClassId = ClassId(1);
    pub const CAR: ClassId = ClassId(2);
    pub const MOTORCYCLE: ClassId = ClassId(3);
    pub const BUS: ClassId = ClassId(5);
    pub const TRUCK: ClassId = ClassId(7);
    pub const TRAFFIC_LIGHT: ClassId = ClassId(9);
}

impl From<u32> for ClassId {
    fn from(id: u32) -> Self {
        ClassId(id)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Colour label attached to traffic-light detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightColor {
    Red,
    Green,
    Yellow,
    Unknown,
}

impl LightColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            LightColor::Red => "Red",
            LightColor::Green => "Green",
            LightColor::Yellow => "Yellow",
            LightColor::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightColor {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Red" => Ok(LightColor::Red),
            "Green" => Ok(LightColor::Green),
            "Yellow" => Ok(LightColor::Yellow),
            "Unknown" => Ok(LightColor::Unknown),
            other => Err(AgentError::MalformedDetection(format!(
                "unknown light color `{other}`"
            ))),
        }
    }
}

/// One perceived object in a single frame.
///
/// `color` is only meaningful for traffic lights; the agent ignores it for
/// every other class.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: ClassId,
    /// Detector confidence. Not used by the decision rules.
    pub score: f32,
    pub bbox: Rect,
    pub color: Option<LightColor>,
}

impl Detection {
    pub fn new(
        class_id: impl Into<ClassId>,
        score: f32,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            score,
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            color: None,
        }
    }

    pub fn from_rect(class_id: impl Into<ClassId>, bbox: Rect, score: f32) -> Self {
        Self {
            class_id: class_id.into(),
            score,
            bbox,
            color: None,
        }
    }

    pub fn with_color(mut self, color: LightColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Reject non-finite scores and non-finite or inverted boxes.
    pub fn validate(&self) -> Result<(), AgentError> {
        if !self.score.is_finite() {
            return Err(AgentError::MalformedDetection(format!(
                "score {} is not finite",
                self.score
            )));
        }
        if !self.bbox.is_well_formed() {
            let [x1, y1, x2, y2] = self.bbox.to_tlbr();
            return Err(AgentError::MalformedDetection(format!(
                "bad box ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_color_parse() {
        assert_eq!("Red".parse::<LightColor>().unwrap(), LightColor::Red);
        assert_eq!("Unknown".parse::<LightColor>().unwrap(), LightColor::Unknown);
        assert!("red".parse::<LightColor>().is_err());
        assert_eq!(LightColor::Yellow.to_string(), "Yellow");
    }

    #[test]
    fn test_detection_defaults_to_no_color() {
        let det = Detection::new(ClassId::TRAFFIC_LIGHT, 0.8, 100.0, 50.0, 140.0, 110.0);
        assert_eq!(det.color, None);
        assert_eq!(det.with_color(LightColor::Green).color, Some(LightColor::Green));
    }

    #[test]
    fn test_validate() {
        let det = Detection::new(ClassId::CAR, 0.9, 280.0, 380.0, 360.0, 460.0);
        assert!(det.validate().is_ok());

        let nan_box = Detection::new(ClassId::CAR, 0.9, f32::NAN, 380.0, 360.0, 460.0);
        assert!(matches!(nan_box.validate(), Err(AgentError::MalformedDetection(_))));

        let inverted = Detection::new(ClassId::CAR, 0.9, 360.0, 380.0, 280.0, 460.0);
        assert!(inverted.validate().is_err());

        let nan_score = Detection::new(ClassId::CAR, f32::NAN, 280.0, 380.0, 360.0, 460.0);
        assert!(nan_score.validate().is_err());
    }
}
