//! Frame-local geometry: the ego-lane danger zone and distance thresholds.

use crate::agent::config::AgentConfig;
use crate::error::AgentError;

/// Danger zone and proximity thresholds derived from frame size.
///
/// All values are in pixels. Objects are "in lane" when their horizontal
/// center lies strictly inside `(zone_left, zone_right)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    pub center_x: f64,
    pub zone_left: f64,
    pub zone_right: f64,
    pub warning_y: f64,
    pub critical_y: f64,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32, config: &AgentConfig) -> Result<Self, AgentError> {
        if width == 0 || height == 0 {
            return Err(AgentError::InvalidGeometry { width, height });
        }

        // Integer midpoint, so odd widths round down.
        let center_x = f64::from(width / 2);
        let half_lane = f64::from(width) * config.lane_width_fraction / 2.0;
        let height = f64::from(height);

        Ok(Self {
            center_x,
            zone_left: center_x - half_lane,
            zone_right: center_x + half_lane,
            warning_y: height * config.warning_distance_fraction,
            critical_y: height * config.critical_distance_fraction,
        })
    }

    #[inline]
    pub fn in_lane(&self, x: f32) -> bool {
        let x = f64::from(x);
        self.zone_left < x && x < self.zone_right
    }

    #[inline]
    pub fn is_critical(&self, bottom_y: f32) -> bool {
        f64::from(bottom_y) > self.critical_y
    }

    #[inline]
    pub fn is_warning(&self, bottom_y: f32) -> bool {
        f64::from(bottom_y) > self.warning_y
    }
}
