//! Traffic-light colour classification from HSV pixel counts.

use ndarray::{ArrayView3, s};
use serde::{Deserialize, Serialize};

use crate::agent::{LightColor, Rect, check_fraction};
use crate::error::ConfigError;
use crate::integration::Frame;

/// Labels the lit colour of a traffic-light crop.
pub trait LightClassifier {
    fn classify(&self, frame: &Frame, bbox: &Rect) -> LightColor;
}

/// Inclusive HSV bounds on the 8-bit scale (hue 0..=180).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue: [u8; 2],
    pub saturation: [u8; 2],
    pub value: [u8; 2],
}

impl HsvRange {
    pub const fn new(hue: [u8; 2], saturation: [u8; 2], value: [u8; 2]) -> Self {
        Self {
            hue,
            saturation,
            value,
        }
    }

    #[inline]
    pub fn contains(&self, [h, s, v]: [u8; 3]) -> bool {
        (self.hue[0]..=self.hue[1]).contains(&h)
            && (self.saturation[0]..=self.saturation[1]).contains(&s)
            && (self.value[0]..=self.value[1]).contains(&v)
    }
}

/// Colour bands and the minimum lit-area fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// A colour counts only if it covers more than this fraction of the box.
    pub area_threshold_fraction: f64,
    /// Red wraps around hue 0, so it has two bands.
    pub red: [HsvRange; 2],
    pub green: HsvRange,
    pub yellow: HsvRange,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            area_threshold_fraction: 0.05,
            red: [
                HsvRange::new([0, 10], [100, 255], [100, 255]),
                HsvRange::new([160, 180], [100, 255], [100, 255]),
            ],
            green: HsvRange::new([40, 90], [100, 255], [100, 255]),
            yellow: HsvRange::new([15, 35], [100, 255], [100, 255]),
        }
    }
}

impl ColorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("color.area_threshold_fraction", self.area_threshold_fraction)
    }
}

/// Counts red, green and yellow pixels inside the box and picks the lit colour.
#[derive(Debug, Clone, Default)]
pub struct HsvLightClassifier {
    config: ColorConfig,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ColorCounts {
    red: usize,
    green: usize,
    yellow: usize,
}

impl HsvLightClassifier {
    pub fn new(config: ColorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ColorConfig {
        &self.config
    }

    fn count(&self, roi: ArrayView3<'_, u8>) -> ColorCounts {
        let mut counts = ColorCounts::default();
        for pixel in roi.rows() {
            let hsv = bgr_to_hsv([pixel[0], pixel[1], pixel[2]]);
            if self.config.red.iter().any(|band| band.contains(hsv)) {
                counts.red += 1;
            }
            if self.config.green.contains(hsv) {
                counts.green += 1;
            }
            if self.config.yellow.contains(hsv) {
                counts.yellow += 1;
            }
        }
        counts
    }
}

impl LightClassifier for HsvLightClassifier {
    fn classify(&self, frame: &Frame, bbox: &Rect) -> LightColor {
        let Some((rows, cols)) = crop_bounds(frame, bbox) else {
            return LightColor::Unknown;
        };

        let pixels = frame.pixels();
        let roi = pixels.slice(s![rows.0..rows.1, cols.0..cols.1, ..]);
        let total = (rows.1 - rows.0) * (cols.1 - cols.0);
        let threshold = total as f64 * self.config.area_threshold_fraction;
        let counts = self.count(roi);
        let above = |n: usize| n as f64 > threshold;

        if above(counts.red) && counts.red > counts.green {
            LightColor::Red
        } else if above(counts.green) && counts.green > counts.red {
            LightColor::Green
        } else if above(counts.yellow) {
            LightColor::Yellow
        } else {
            LightColor::Unknown
        }
    }
}

/// Integer pixel bounds of `bbox` clipped to the frame, or `None` if empty.
fn crop_bounds(frame: &Frame, bbox: &Rect) -> Option<((usize, usize), (usize, usize))> {
    let [x1, y1, x2, y2] = bbox.to_tlbr();
    if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
        return None;
    }

    let clip = |v: f32, max: u32| (v.trunc().max(0.0) as usize).min(max as usize);
    let (x1, x2) = (clip(x1, frame.width()), clip(x2, frame.width()));
    let (y1, y2) = (clip(y1, frame.height()), clip(y2, frame.height()));

    (x1 < x2 && y1 < y2).then_some(((y1, y2), (x1, x2)))
}

/// Convert one BGR pixel to 8-bit HSV with hue halved into 0..=180.
pub(crate) fn bgr_to_hsv([b, g, r]: [u8; 3]) -> [u8; 3] {
    let (b, g, r) = (f32::from(b), f32::from(g), f32::from(r));
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v > 0.0 { diff * 255.0 / v } else { 0.0 };

    let h = if diff == 0.0 {
        0.0
    } else if v == r {
        60.0 * (g - b) / diff
    } else if v == g {
        120.0 + 60.0 * (b - r) / diff
    } else {
        240.0 + 60.0 * (r - g) / diff
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    [
        (h / 2.0).round().min(180.0) as u8,
        s.round() as u8,
        v as u8,
    ]
}

#[cfg(test)]
mod tests {
    use std::ops::Range;

    use super::*;

    const RED: [u8; 3] = [0, 0, 255];
    const GREEN: [u8; 3] = [0, 255, 0];
    const YELLOW: [u8; 3] = [0, 255, 255];
    const BLUE: [u8; 3] = [255, 0, 0];

    fn paint(frame: &mut Frame, rows: Range<usize>, cols: Range<usize>, bgr: [u8; 3]) {
        let pixels = frame.pixels_mut();
        for y in rows {
            for x in cols.clone() {
                for c in 0..3 {
                    pixels[[y, x, c]] = bgr[c];
                }
            }
        }
    }

    #[test]
    fn test_bgr_to_hsv() {
        assert_eq!(bgr_to_hsv(RED), [0, 255, 255]);
        assert_eq!(bgr_to_hsv(GREEN), [60, 255, 255]);
        assert_eq!(bgr_to_hsv(YELLOW), [30, 255, 255]);
        assert_eq!(bgr_to_hsv(BLUE), [120, 255, 255]);
        assert_eq!(bgr_to_hsv([0, 0, 0]), [0, 0, 0]);
        // magenta-ish red wraps into the upper band
        assert_eq!(bgr_to_hsv([40, 0, 255]), [175, 255, 255]);
    }

    #[test]
    fn test_solid_colors() {
        let classifier = HsvLightClassifier::default();
        let bbox = Rect::from_tlbr(0.0, 0.0, 10.0, 10.0);
        for (bgr, expected) in [
            (RED, LightColor::Red),
            (GREEN, LightColor::Green),
            (YELLOW, LightColor::Yellow),
            (BLUE, LightColor::Unknown),
        ] {
            let frame = Frame::filled(10, 10, bgr).unwrap();
            assert_eq!(classifier.classify(&frame, &bbox), expected);
        }
    }

    #[test]
    fn test_small_lit_area_is_unknown() {
        let classifier = HsvLightClassifier::default();
        let mut frame = Frame::filled(20, 20, [0, 0, 0]).unwrap();
        // 4 of 400 pixels: 1%, below the 5% threshold
        paint(&mut frame, 0..2, 0..2, RED);
        let bbox = Rect::from_tlbr(0.0, 0.0, 20.0, 20.0);
        assert_eq!(classifier.classify(&frame, &bbox), LightColor::Unknown);

        // 40 of 400 pixels: 10%
        paint(&mut frame, 0..4, 0..10, RED);
        assert_eq!(classifier.classify(&frame, &bbox), LightColor::Red);
    }

    #[test]
    fn test_red_beats_green_when_larger() {
        let classifier = HsvLightClassifier::default();
        let mut frame = Frame::filled(10, 10, [0, 0, 0]).unwrap();
        paint(&mut frame, 0..6, 0..10, RED);
        paint(&mut frame, 6..10, 0..10, GREEN);
        let bbox = Rect::from_tlbr(0.0, 0.0, 10.0, 10.0);
        assert_eq!(classifier.classify(&frame, &bbox), LightColor::Red);
    }

    #[test]
    fn test_box_is_clipped_to_frame() {
        let classifier = HsvLightClassifier::default();
        let frame = Frame::filled(10, 10, GREEN).unwrap();
        let bbox = Rect::from_tlbr(-5.0, -5.0, 50.0, 50.0);
        assert_eq!(classifier.classify(&frame, &bbox), LightColor::Green);
    }

    #[test]
    fn test_zero_area_is_unknown() {
        let classifier = HsvLightClassifier::default();
        let frame = Frame::filled(10, 10, RED).unwrap();
        let flat = Rect::from_tlbr(2.0, 3.0, 8.0, 3.0);
        assert_eq!(classifier.classify(&frame, &flat), LightColor::Unknown);
        let outside = Rect::from_tlbr(20.0, 20.0, 30.0, 30.0);
        assert_eq!(classifier.classify(&frame, &outside), LightColor::Unknown);
    }
}
