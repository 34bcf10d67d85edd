use std::fmt;

/// Discrete driving command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Action {
    #[default]
    Accelerate,
    SlowDown,
    Brake,
    /// Reserved for lateral control; never produced by the agent.
    SteerLeft,
    /// Reserved for lateral control; never produced by the agent.
    SteerRight,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Accelerate => "ACCELERATE",
            Action::SlowDown => "SLOW DOWN",
            Action::Brake => "BRAKE",
            Action::SteerLeft => "STEER LEFT",
            Action::SteerRight => "STEER RIGHT",
        }
    }

    /// Severity rank used when several outcomes compete: BRAKE > SLOW DOWN > ACCELERATE.
    pub fn severity(&self) -> u8 {
        match self {
            Action::Accelerate => 0,
            Action::SlowDown | Action::SteerLeft | Action::SteerRight => 1,
            Action::Brake => 2,
        }
    }

    /// HUD text colour in BGR order.
    pub fn hud_color(&self) -> [u8; 3] {
        match self {
            Action::Brake => [0, 0, 255],
            Action::SlowDown => [0, 165, 255],
            Action::Accelerate => [0, 255, 0],
            Action::SteerLeft | Action::SteerRight => [255, 255, 0],
        }
    }

    /// Speed gauge fill shown next to the video.
    pub fn throttle_percent(&self) -> u8 {
        match self {
            Action::Accelerate => 80,
            Action::SlowDown => 40,
            Action::Brake => 0,
            Action::SteerLeft | Action::SteerRight => 50,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame output: an action and a short human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub reason: &'static str,
}

impl Decision {
    pub const PATH_CLEAR: Decision = Decision::new(Action::Accelerate, "Path Clear");
    pub const RED_LIGHT: Decision = Decision::new(Action::Brake, "Red Light Detected");
    pub const YELLOW_LIGHT: Decision = Decision::new(Action::SlowDown, "Yellow Light Detected");
    pub const UNREADABLE_LIGHT: Decision =
        Decision::new(Action::SlowDown, "Traffic Light Unreadable");
    pub const OBSTACLE_CRITICAL: Decision = Decision::new(Action::Brake, "Obstacle Critical (<5m)");
    pub const OBSTACLE_AHEAD: Decision = Decision::new(Action::SlowDown, "Obstacle Ahead (15m)");

    pub const fn new(action: Action, reason: &'static str) -> Self {
        Self { action, reason }
    }
}

impl Default for Decision {
    fn default() -> Self {
        Decision::PATH_CLEAR
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.reason)
    }
}
