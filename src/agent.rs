mod action;
mod config;
mod detection;
mod engine;
mod rect;
mod zone;

pub use action::{Action, Decision};
pub use config::{AGENT_CONFIG_VERSION, AgentConfig, ResolutionPolicy, UnknownLightPolicy};
pub(crate) use config::check_fraction;
pub use detection::{ClassId, Detection, LightColor};
pub use engine::{DrivingAgent, decide};
pub use rect::Rect;
pub use zone::FrameGeometry;
