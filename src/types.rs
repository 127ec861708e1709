// src/types.rs

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sampler: SamplerConfig,
    pub alerts: AlertsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Sampling period in milliseconds. Fixed for the process lifetime.
    pub period_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsConfig {
    pub person_count: AlertConditionConfig,
    pub device_detected: AlertConditionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConditionConfig {
    pub enabled: bool,
    pub cooldown_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampler: SamplerConfig { period_ms: 200 },
            alerts: AlertsConfig {
                person_count: AlertConditionConfig {
                    enabled: true,
                    cooldown_secs: 5,
                },
                device_detected: AlertConditionConfig {
                    enabled: true,
                    cooldown_secs: 5,
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

/// One raw frame polled from the video source.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// A single detection produced by the detector for one cycle.
/// Never retained across cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub class: String,
    /// Confidence in [0, 1].
    pub score: f32,
    /// [x, y, width, height] in the pixel space of the sampled frame.
    pub bbox: [f32; 4],
}

impl Detection {
    pub fn new(class: &str, score: f32, bbox: [f32; 4]) -> Self {
        Self {
            class: class.to_string(),
            score,
            bbox,
        }
    }
}

/// Ordered detector output for one cycle. Insertion order is detector output
/// order; duplicate classes are valid and expected.
pub type DetectionSet = Vec<Detection>;
