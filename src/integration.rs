//! Integration module for connecting a detector and a light classifier with the agent.
//!
//! This module provides traits and utilities for plugging an external
//! object detector into the per-frame decision loop.

mod builder;
mod color;
mod detector;
mod frame;
mod pipeline;

pub use builder::DetectionBuilder;
pub use color::{ColorConfig, HsvLightClassifier, HsvRange, LightClassifier};
pub use detector::DetectionSource;
pub use frame::Frame;
pub use pipeline::{DrivePipeline, FrameError, PipelineConfig};
