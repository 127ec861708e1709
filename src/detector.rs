// src/detector.rs

use crate::types::{DetectionSet, Frame};
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Externally supplied detection capability. Loading the model is the
/// caller's one-time setup step; this trait only covers inference.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn detect(&self, frame: &Frame) -> Result<DetectionSet>;
}

/// Wraps the raw capability with frame validation. A malformed frame
/// (zero dimensions) fails the cycle before the model ever runs.
pub struct DetectorAdapter {
    inner: Arc<dyn Detector>,
}

impl DetectorAdapter {
    pub fn new(inner: Arc<dyn Detector>) -> Self {
        Self { inner }
    }

    pub async fn detect(&self, frame: &Frame) -> Result<DetectionSet> {
        if frame.width == 0 || frame.height == 0 {
            bail!(
                "malformed frame: {}x{} has zero dimension",
                frame.width,
                frame.height
            );
        }

        let detections = self.inner.detect(frame).await?;
        debug!("Detected {} object(s)", detections.len());
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Detection;

    struct FixedDetector(DetectionSet);

    #[async_trait]
    impl Detector for FixedDetector {
        async fn detect(&self, _frame: &Frame) -> Result<DetectionSet> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn rejects_zero_dimension_frame() {
        let adapter = DetectorAdapter::new(Arc::new(FixedDetector(vec![])));
        let frame = Frame {
            data: vec![],
            width: 0,
            height: 480,
        };
        assert!(adapter.detect(&frame).await.is_err());
    }

    #[tokio::test]
    async fn passes_through_detections_in_order() {
        let detections = vec![
            Detection::new("person", 0.9, [10.0, 10.0, 50.0, 80.0]),
            Detection::new("cell phone", 0.95, [0.0, 0.0, 40.0, 40.0]),
        ];
        let adapter = DetectorAdapter::new(Arc::new(FixedDetector(detections.clone())));
        let frame = Frame {
            data: vec![0; 12],
            width: 2,
            height: 2,
        };

        let out = adapter.detect(&frame).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].class, "person");
        assert_eq!(out[1].class, "cell phone");
    }
}
