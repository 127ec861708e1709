// src/sampler.rs
//
// Fixed-period sampling loop. Each tick runs at most one detect → render →
// evaluate cycle; ticks that arrive while a cycle is in flight are dropped,
// never queued. Shedding stale frames beats building a backlog.

use crate::alerts::AlertEngine;
use crate::detector::DetectorAdapter;
use crate::overlay::{self, DrawSurface};
use crate::types::DetectionSet;
use crate::video_source::VideoSource;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Counters for one sampler run.
#[derive(Debug, Clone, Default)]
pub struct SamplerStats {
    pub ticks_fired: u64,
    pub ticks_skipped_not_ready: u64,
    pub ticks_dropped_in_flight: u64,
    pub cycles_completed: u64,
    pub detection_failures: u64,
}

#[derive(Default)]
struct CycleCounters {
    ticks_fired: AtomicU64,
    ticks_skipped_not_ready: AtomicU64,
    ticks_dropped_in_flight: AtomicU64,
    cycles_completed: AtomicU64,
    detection_failures: AtomicU64,
}

impl CycleCounters {
    fn snapshot(&self) -> SamplerStats {
        SamplerStats {
            ticks_fired: self.ticks_fired.load(Ordering::Relaxed),
            ticks_skipped_not_ready: self.ticks_skipped_not_ready.load(Ordering::Relaxed),
            ticks_dropped_in_flight: self.ticks_dropped_in_flight.load(Ordering::Relaxed),
            cycles_completed: self.cycles_completed.load(Ordering::Relaxed),
            detection_failures: self.detection_failures.load(Ordering::Relaxed),
        }
    }
}

/// One detect → render → evaluate unit of work, shared by the sampler and
/// any spawned cycle task.
pub struct Pipeline {
    source: Arc<dyn VideoSource>,
    detector: DetectorAdapter,
    surface: Arc<Mutex<dyn DrawSurface>>,
    alerts: AlertEngine,
    last_detections: Mutex<DetectionSet>,
    counters: CycleCounters,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn VideoSource>,
        detector: DetectorAdapter,
        surface: Arc<Mutex<dyn DrawSurface>>,
        alerts: AlertEngine,
    ) -> Self {
        Self {
            source,
            detector,
            surface,
            alerts,
            last_detections: Mutex::new(Vec::new()),
            counters: CycleCounters::default(),
        }
    }

    /// Run one cycle against the source's current frame. A detection
    /// failure makes the cycle a no-op: no render, no alert evaluation.
    async fn run_cycle(&self) {
        let frame = self.source.current_frame();

        match self.detector.detect(&frame).await {
            Ok(detections) => {
                {
                    let mut surface = self.surface.lock().unwrap();
                    surface.resize(frame.width, frame.height);
                    overlay::render(&detections, &mut *surface);
                }
                self.alerts.evaluate(&detections);
                *self.last_detections.lock().unwrap() = detections;
                self.counters.cycles_completed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.detection_failures.fetch_add(1, Ordering::Relaxed);
                debug!("Detection failed, cycle dropped: {:#}", e);
            }
        }
    }

    /// The most recent successful cycle's detections, replaced wholesale
    /// each cycle.
    pub fn last_detections(&self) -> DetectionSet {
        self.last_detections.lock().unwrap().clone()
    }
}

// Clears the in-flight flag on every exit path of a cycle, including
// detector failure and panic unwinding.
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct FrameSampler {
    pipeline: Arc<Pipeline>,
    in_flight: Arc<AtomicBool>,
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    loop_handle: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl FrameSampler {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            in_flight: Arc::new(AtomicBool::new(false)),
            shutdown: Mutex::new(None),
            loop_handle: Mutex::new(None),
        }
    }

    /// Begin firing ticks every `period` until `stop()`. The period is
    /// fixed for the life of the run. Calling `start` twice without an
    /// intervening `stop` is a no-op.
    pub fn start(&self, period: Duration) {
        let mut handle_slot = self.loop_handle.lock().unwrap();
        if handle_slot.is_some() {
            return;
        }

        let (tx, mut rx) = watch::channel(false);
        *self.shutdown.lock().unwrap() = Some(tx);

        let pipeline = Arc::clone(&self.pipeline);
        let in_flight = Arc::clone(&self.in_flight);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        // A dropped sender also ends the run.
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        Self::on_tick(&pipeline, &in_flight);
                    }
                }
            }
            info!("Sampler loop stopped");
        });

        *handle_slot = Some(handle);
    }

    fn on_tick(pipeline: &Arc<Pipeline>, in_flight: &Arc<AtomicBool>) {
        let counters = &pipeline.counters;
        counters.ticks_fired.fetch_add(1, Ordering::Relaxed);

        // Source not warmed up: skip silently.
        if !pipeline.source.is_ready() {
            counters.ticks_skipped_not_ready.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Previous cycle still running: drop this tick, do not queue.
        // Expected backpressure, not an error.
        if in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            counters.ticks_dropped_in_flight.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let guard = InFlightGuard {
            flag: Arc::clone(in_flight),
        };
        let pipeline = Arc::clone(pipeline);

        tokio::spawn(async move {
            let _guard = guard;
            pipeline.run_cycle().await;
        });
    }

    /// Stop tick delivery. Idempotent; once this returns no further tick
    /// fires. An in-flight cycle and pending cool-down timers are left to
    /// complete naturally.
    pub async fn stop(&self) {
        let tx = self.shutdown.lock().unwrap().take();
        if let Some(tx) = tx {
            let _ = tx.send(true);
        }

        let handle = self.loop_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    pub fn stats(&self) -> SamplerStats {
        self.pipeline.counters.snapshot()
    }
}
