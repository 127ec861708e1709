// src/lib.rs

pub mod alerts;
pub mod config;
pub mod detector;
pub mod history;
pub mod overlay;
pub mod sampler;
pub mod types;
pub mod video_source;

pub use alerts::{builtin_conditions, AlertCondition, AlertEngine, AlertState, NotificationSink};
pub use detector::{Detector, DetectorAdapter};
pub use history::{HistoryEntry, HistoryLog};
pub use overlay::{class_color, label_position, render, Color, DrawSurface};
pub use sampler::{FrameSampler, Pipeline, SamplerStats};
pub use types::{Config, Detection, DetectionSet, Frame};
pub use video_source::VideoSource;
