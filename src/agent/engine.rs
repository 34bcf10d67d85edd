//! Decision rules mapping one frame's detections to a driving action.

use tracing::{debug, trace};

use crate::agent::action::Decision;
use crate::agent::config::{AgentConfig, ResolutionPolicy, UnknownLightPolicy};
use crate::agent::detection::{Detection, LightColor};
use crate::agent::zone::FrameGeometry;
use crate::error::{AgentError, ConfigError};

/// Outcome of a single rule applied to a single detection.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verdict {
    /// Terminates a first-match scan.
    Override(Decision),
    /// Replaces the running decision only if more severe.
    Advisory(Decision),
}

/// A verdict together with its tie-break keys for severity resolution.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    decision: Decision,
    /// False only for the unreadable-light advisory.
    definite: bool,
    from_light: bool,
    bottom_y: f32,
}

impl Candidate {
    /// True if `self` strictly outranks `other`. Equal candidates keep list order.
    ///
    /// Keys: severity, then read evidence over an unreadable light, then
    /// traffic light over obstacle, then nearest.
    fn outranks(&self, other: &Candidate) -> bool {
        let lhs = (self.decision.action.severity(), self.definite, self.from_light);
        let rhs = (other.decision.action.severity(), other.definite, other.from_light);
        if lhs != rhs {
            return lhs > rhs;
        }
        self.bottom_y > other.bottom_y
    }
}

/// Stateless driving agent.
///
/// Each call to [`DrivingAgent::decide`] depends only on its arguments and
/// the configuration, so one agent can serve any number of frames.
#[derive(Debug, Clone, Default)]
pub struct DrivingAgent {
    config: AgentConfig,
}

impl DrivingAgent {
    /// Wrap `config` as given. Use [`DrivingAgent::try_new`] for untrusted input.
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    /// Validate `config` first, so bad fractions cannot skew every decision.
    pub fn try_new(config: AgentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Decide the action for one frame.
    ///
    /// Fails only when `width` or `height` is zero. An empty detection list
    /// always yields [`Decision::PATH_CLEAR`].
    pub fn decide(
        &self,
        detections: &[Detection],
        width: u32,
        height: u32,
    ) -> Result<Decision, AgentError> {
        let geometry = FrameGeometry::new(width, height, &self.config)?;

        let decision = match self.config.resolution {
            ResolutionPolicy::FirstMatch => self.first_match(detections, &geometry),
            ResolutionPolicy::MostSevere => self.most_severe(detections, &geometry),
        };

        debug!(
            detections = detections.len(),
            action = %decision.action,
            reason = decision.reason,
            "frame decided"
        );
        Ok(decision)
    }

    fn first_match(&self, detections: &[Detection], geometry: &FrameGeometry) -> Decision {
        let mut decision = Decision::PATH_CLEAR;

        for det in detections {
            for verdict in self.evaluate(det, geometry).into_iter().flatten() {
                match verdict {
                    Verdict::Override(hard) => {
                        trace!(class = %det.class_id, reason = hard.reason, "hard override");
                        return hard;
                    }
                    // An equal advisory keeps the earlier reason.
                    Verdict::Advisory(advice) => {
                        if advice.action.severity() > decision.action.severity() {
                            decision = advice;
                        }
                    }
                }
            }
        }

        decision
    }

    fn most_severe(&self, detections: &[Detection], geometry: &FrameGeometry) -> Decision {
        let mut best: Option<Candidate> = None;

        for det in detections {
            let light = self.light_rule(det).map(|v| (v, true));
            let obstacle = self.obstacle_rule(det, geometry).map(|v| (v, false));

            for (verdict, from_light) in [light, obstacle].into_iter().flatten() {
                let decision = match verdict {
                    Verdict::Override(d) | Verdict::Advisory(d) => d,
                };
                let candidate = Candidate {
                    decision,
                    definite: decision != Decision::UNREADABLE_LIGHT,
                    from_light,
                    bottom_y: det.bbox.bottom(),
                };
                if best.is_none_or(|b| candidate.outranks(&b)) {
                    best = Some(candidate);
                }
            }
        }

        best.map_or(Decision::PATH_CLEAR, |c| c.decision)
    }

    fn evaluate(&self, det: &Detection, geometry: &FrameGeometry) -> [Option<Verdict>; 2] {
        [self.light_rule(det), self.obstacle_rule(det, geometry)]
    }

    fn light_rule(&self, det: &Detection) -> Option<Verdict> {
        if det.class_id != self.config.traffic_light_class {
            return None;
        }

        match det.color {
            Some(LightColor::Red) => Some(Verdict::Override(Decision::RED_LIGHT)),
            Some(LightColor::Yellow) => Some(Verdict::Override(Decision::YELLOW_LIGHT)),
            // Green allows proceeding but an obstacle may still require braking.
            Some(LightColor::Green) => None,
            Some(LightColor::Unknown) | None => match self.config.unknown_light {
                UnknownLightPolicy::Ignore => None,
                UnknownLightPolicy::Caution => Some(Verdict::Advisory(Decision::UNREADABLE_LIGHT)),
            },
        }
    }

    fn obstacle_rule(&self, det: &Detection, geometry: &FrameGeometry) -> Option<Verdict> {
        if !self.config.is_obstacle(det.class_id) {
            return None;
        }

        let (center_x, _) = det.bbox.center();
        if !geometry.in_lane(center_x) {
            return None;
        }

        let bottom_y = det.bbox.bottom();
        if geometry.is_critical(bottom_y) {
            Some(Verdict::Override(Decision::OBSTACLE_CRITICAL))
        } else if geometry.is_warning(bottom_y) {
            Some(Verdict::Advisory(Decision::OBSTACLE_AHEAD))
        } else {
            None
        }
    }
}

/// Decide with the default configuration.
pub fn decide(detections: &[Detection], width: u32, height: u32) -> Result<Decision, AgentError> {
    DrivingAgent::default().decide(detections, width, height)
}
