//! Frame-local driving decisions for dashcam video.
//!
//! The [`agent`] module turns one frame's object detections into an
//! [`Action`] plus a short reason. The [`integration`] module connects an
//! external detector and a traffic-light colour classifier to the agent.

pub mod agent;
pub mod error;
pub mod integration;
pub mod settings;
pub mod telemetry;

pub use agent::{
    Action, AgentConfig, ClassId, Decision, Detection, DrivingAgent, FrameGeometry, LightColor,
    Rect, ResolutionPolicy, UnknownLightPolicy, decide,
};
pub use error::{AgentError, ConfigError};
pub use integration::{
    ColorConfig, DetectionBuilder, DetectionSource, DrivePipeline, Frame, FrameError,
    HsvLightClassifier, HsvRange, LightClassifier, PipelineConfig,
};
pub use settings::Settings;
