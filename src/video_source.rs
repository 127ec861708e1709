// src/video_source.rs

use crate::types::Frame;

/// Read-only view of the capture device. Polled once per sampler tick.
///
/// Readiness mirrors the device's own reporting: a source that has not
/// finished warming up answers `false` and the tick is skipped silently.
pub trait VideoSource: Send + Sync {
    fn is_ready(&self) -> bool;

    /// Snapshot of the current frame, with its native dimensions.
    fn current_frame(&self) -> Frame;
}
