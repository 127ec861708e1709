// src/main.rs
//
// Demo wiring: a synthetic video source and a scripted detector drive the
// real sampling/alerting pipeline for a short run, then print the final
// stats and alert history.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};
use watchcam::alerts::{builtin_conditions, AlertEngine, NotificationSink};
use watchcam::detector::{Detector, DetectorAdapter};
use watchcam::history::HistoryLog;
use watchcam::overlay::{Color, DrawSurface};
use watchcam::sampler::{FrameSampler, Pipeline};
use watchcam::types::{Config, Detection, DetectionSet, Frame};
use watchcam::video_source::VideoSource;

const DEMO_RUN_SECS: u64 = 12;

struct SyntheticSource {
    width: u32,
    height: u32,
}

impl VideoSource for SyntheticSource {
    fn is_ready(&self) -> bool {
        true
    }

    fn current_frame(&self) -> Frame {
        Frame {
            data: vec![0; (self.width * self.height * 3) as usize],
            width: self.width,
            height: self.height,
        }
    }
}

// Cycles through a fixed set of scenes, holding each one for a few calls,
// so both built-in alert conditions fire and re-fire during the demo run.
struct ScriptedDetector {
    scenes: Vec<DetectionSet>,
    cursor: AtomicUsize,
}

impl ScriptedDetector {
    const CALLS_PER_SCENE: usize = 8;

    fn new() -> Self {
        let scenes = vec![
            Vec::new(),
            vec![Detection::new("person", 0.91, [220.0, 60.0, 120.0, 300.0])],
            vec![
                Detection::new("person", 0.92, [80.0, 40.0, 130.0, 320.0]),
                Detection::new("person", 0.85, [360.0, 55.0, 125.0, 310.0]),
            ],
            vec![
                Detection::new("person", 0.90, [200.0, 50.0, 130.0, 320.0]),
                Detection::new("cell phone", 0.88, [250.0, 8.0, 40.0, 70.0]),
            ],
            vec![Detection::new("chair", 0.70, [400.0, 240.0, 90.0, 110.0])],
        ];
        Self {
            scenes,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(&self, _frame: &Frame) -> Result<DetectionSet> {
        // Mimic inference latency.
        tokio::time::sleep(Duration::from_millis(30)).await;

        let call = self.cursor.fetch_add(1, Ordering::Relaxed);
        let scene = (call / Self::CALLS_PER_SCENE) % self.scenes.len();
        Ok(self.scenes[scene].clone())
    }
}

struct BeepSink;

impl NotificationSink for BeepSink {
    fn notify(&self, message: &str) -> Result<()> {
        info!("🔊 BEEP — {}", message);
        Ok(())
    }
}

#[derive(Default)]
struct ConsoleSurface {
    width: u32,
    height: u32,
    boxes_drawn: u64,
}

impl DrawSurface for ConsoleSurface {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
    fn clear(&mut self) {}
    fn set_stroke_style(&mut self, _color: Color) {}
    fn set_fill_style(&mut self, _color: Color) {}
    fn set_line_width(&mut self, _width: f32) {}
    fn set_font(&mut self, _font: &str) {}
    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        debug!("label '{}' at ({:.0}, {:.0})", text, x, y);
    }
    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.boxes_drawn += 1;
        debug!(
            "box ({:.0}, {:.0}) {}x{} on {}x{} surface",
            x, y, width as u32, height as u32, self.width, self.height
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("watchcam={}", config.logging.level))
        .init();

    info!("🎯 Real-Time Object Detection starting");
    info!(
        "Sampler period: {} ms | cool-downs: person={}s, device={}s",
        config.sampler.period_ms,
        config.alerts.person_count.cooldown_secs,
        config.alerts.device_detected.cooldown_secs
    );

    info!("Loading detector model...");
    let detector: Arc<dyn Detector> = Arc::new(ScriptedDetector::new());
    info!("✓ Detector ready");

    let source: Arc<dyn VideoSource> = Arc::new(SyntheticSource {
        width: 640,
        height: 480,
    });
    let console = Arc::new(Mutex::new(ConsoleSurface::default()));
    let surface: Arc<Mutex<dyn DrawSurface>> = console.clone();
    let history = Arc::new(HistoryLog::new());

    let alerts = AlertEngine::new(
        builtin_conditions(&config.alerts),
        Arc::clone(&history),
        Arc::new(BeepSink),
    );

    let pipeline = Arc::new(Pipeline::new(
        source,
        DetectorAdapter::new(detector),
        surface,
        alerts,
    ));
    let sampler = FrameSampler::new(Arc::clone(&pipeline));

    sampler.start(Duration::from_millis(config.sampler.period_ms));
    info!("✓ Sampler running for {} s", DEMO_RUN_SECS);

    tokio::time::sleep(Duration::from_secs(DEMO_RUN_SECS)).await;
    sampler.stop().await;
    info!("✓ Sampler stopped");

    let stats = sampler.stats();
    info!("📊 Final Report:");
    info!("  Ticks fired: {}", stats.ticks_fired);
    info!("  Skipped (source not ready): {}", stats.ticks_skipped_not_ready);
    info!("  Dropped (cycle in flight): {}", stats.ticks_dropped_in_flight);
    info!("  Cycles completed: {}", stats.cycles_completed);
    info!("  Detection failures: {}", stats.detection_failures);
    info!("  Boxes drawn: {}", console.lock().unwrap().boxes_drawn);

    let live = pipeline.last_detections();
    if live.is_empty() {
        info!("📡 Live detections: none");
    } else {
        info!("📡 Live detections:");
        for detection in &live {
            info!(
                "  {} ({:.0}%)",
                detection.class,
                detection.score * 100.0
            );
        }
    }

    let entries = history.entries();
    if entries.is_empty() {
        info!("📝 Alert history: no alerts");
    } else {
        info!("📝 Alert history ({} entries):", entries.len());
        for entry in &entries {
            info!("  {}", entry);
        }
    }

    Ok(())
}
