// src/alerts.rs
//
// Per-condition debounce state machine. A condition that evaluates true
// fires at most once per cool-down window; the window is anchored to the
// first true observation and only ever cleared by its own expiry timer,
// never by the predicate going false.

use crate::history::HistoryLog;
use crate::types::{AlertsConfig, DetectionSet};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Fire-and-forget user notification. Failures are the sink's problem;
/// the engine logs and moves on.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str) -> Result<()>;
}

/// Debounce state for one condition. `active` means the condition fired
/// and is inside its cool-down window; further firings are suppressed.
#[derive(Debug, Clone, Copy)]
pub struct AlertState {
    pub active: bool,
    pub since: Option<Instant>,
}

impl AlertState {
    fn idle() -> Self {
        Self {
            active: false,
            since: None,
        }
    }
}

/// A named predicate over one cycle's DetectionSet plus its cool-down.
/// The condition set is fixed at startup.
pub struct AlertCondition {
    pub name: &'static str,
    pub message: &'static str,
    pub cooldown: Duration,
    predicate: fn(&DetectionSet) -> bool,
}

impl AlertCondition {
    pub fn new(
        name: &'static str,
        message: &'static str,
        cooldown: Duration,
        predicate: fn(&DetectionSet) -> bool,
    ) -> Self {
        Self {
            name,
            message,
            cooldown,
            predicate,
        }
    }

    pub fn is_met(&self, detections: &DetectionSet) -> bool {
        (self.predicate)(detections)
    }
}

fn more_than_one_person(detections: &DetectionSet) -> bool {
    detections.iter().filter(|d| d.class == "person").count() > 1
}

fn device_present(detections: &DetectionSet) -> bool {
    detections.iter().any(|d| d.class == "cell phone")
}

/// The built-in condition set, with cool-downs taken from configuration.
pub fn builtin_conditions(config: &AlertsConfig) -> Vec<AlertCondition> {
    let mut conditions = Vec::new();

    if config.person_count.enabled {
        conditions.push(AlertCondition::new(
            "person-count",
            "⚠️ More than 1 person detected!",
            Duration::from_secs(config.person_count.cooldown_secs),
            more_than_one_person,
        ));
    }

    if config.device_detected.enabled {
        conditions.push(AlertCondition::new(
            "device-detected",
            "📱 Cell phone detected!",
            Duration::from_secs(config.device_detected.cooldown_secs),
            device_present,
        ));
    }

    conditions
}

pub struct AlertEngine {
    conditions: Vec<AlertCondition>,
    states: Arc<Mutex<HashMap<&'static str, AlertState>>>,
    history: Arc<HistoryLog>,
    sink: Arc<dyn NotificationSink>,
}

impl AlertEngine {
    pub fn new(
        conditions: Vec<AlertCondition>,
        history: Arc<HistoryLog>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let states = conditions
            .iter()
            .map(|c| (c.name, AlertState::idle()))
            .collect();

        Self {
            conditions,
            states: Arc::new(Mutex::new(states)),
            history,
            sink,
        }
    }

    /// Evaluate every condition against one cycle's detections.
    /// Conditions are independent; one firing never blocks another.
    ///
    /// Must run inside a tokio runtime (cool-down timers are spawned).
    pub fn evaluate(&self, detections: &DetectionSet) {
        for condition in &self.conditions {
            if !condition.is_met(detections) {
                // State only clears via its own timer.
                continue;
            }

            // Atomic read-modify-write: decide and transition under one lock
            // so a concurrent expiry timer cannot interleave.
            let fired = {
                let mut states = self.states.lock().unwrap();
                let state = states.entry(condition.name).or_insert_with(AlertState::idle);
                if state.active {
                    false
                } else {
                    state.active = true;
                    state.since = Some(Instant::now());
                    true
                }
            };

            if !fired {
                debug!("Condition '{}' still in cool-down, suppressed", condition.name);
                continue;
            }

            warn!("🔔 {}", condition.message);
            self.history.append(condition.message);

            if let Err(e) = self.sink.notify(condition.message) {
                warn!("Notification sink failed (ignored): {}", e);
            }

            self.schedule_cooldown(condition.name, condition.cooldown);
        }
    }

    /// Re-arms the condition after its cool-down, unconditionally. If the
    /// condition is still true at expiry, the next evaluation re-fires.
    fn schedule_cooldown(&self, name: &'static str, cooldown: Duration) {
        let states = Arc::clone(&self.states);
        tokio::spawn(async move {
            tokio::time::sleep(cooldown).await;
            let mut states = states.lock().unwrap();
            if let Some(state) = states.get_mut(name) {
                state.active = false;
                state.since = None;
            }
            debug!("Cool-down expired for '{}', re-armed", name);
        });
    }

    pub fn state(&self, name: &str) -> Option<AlertState> {
        self.states.lock().unwrap().get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AlertConditionConfig, Detection};
    use tokio::task::yield_now;
    use tokio::time::advance;

    struct CountingSink {
        messages: Mutex<Vec<String>>,
    }

    impl CountingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                messages: Mutex::new(Vec::new()),
            })
        }

        fn count(&self) -> usize {
            self.messages.lock().unwrap().len()
        }
    }

    impl NotificationSink for CountingSink {
        fn notify(&self, message: &str) -> Result<()> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct FailingSink;

    impl NotificationSink for FailingSink {
        fn notify(&self, _message: &str) -> Result<()> {
            anyhow::bail!("playback blocked")
        }
    }

    fn default_alerts_config() -> AlertsConfig {
        AlertsConfig {
            person_count: AlertConditionConfig {
                enabled: true,
                cooldown_secs: 5,
            },
            device_detected: AlertConditionConfig {
                enabled: true,
                cooldown_secs: 5,
            },
        }
    }

    fn engine_with(
        history: Arc<HistoryLog>,
        sink: Arc<dyn NotificationSink>,
    ) -> AlertEngine {
        AlertEngine::new(builtin_conditions(&default_alerts_config()), history, sink)
    }

    fn two_people() -> DetectionSet {
        vec![
            Detection::new("person", 0.9, [10.0, 10.0, 50.0, 80.0]),
            Detection::new("person", 0.8, [100.0, 10.0, 50.0, 80.0]),
        ]
    }

    fn one_phone() -> DetectionSet {
        vec![Detection::new("cell phone", 0.95, [0.0, 0.0, 40.0, 40.0])]
    }

    // Lets the spawned cool-down timers run after time has advanced.
    async fn settle() {
        for _ in 0..10 {
            yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn two_people_fire_person_count_once() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        engine.evaluate(&two_people());

        assert_eq!(sink.count(), 1);
        let entries = history.entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains("More than 1 person"));
        assert!(engine.state("person-count").unwrap().active);
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_one_alert_per_window() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        // Condition stays true for many cycles inside one window.
        for _ in 0..10 {
            engine.evaluate(&two_people());
            advance(Duration::from_millis(200)).await;
            settle().await;
        }

        assert_eq!(sink.count(), 1);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn suppressed_midway_through_cooldown() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        engine.evaluate(&two_people());
        advance(Duration::from_secs(2)).await;
        settle().await;
        engine.evaluate(&two_people());

        assert_eq!(sink.count(), 1);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearms_after_cooldown_expiry() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        engine.evaluate(&two_people());
        assert_eq!(sink.count(), 1);

        advance(Duration::from_millis(5001)).await;
        settle().await;
        assert!(!engine.state("person-count").unwrap().active);

        engine.evaluate(&two_people());
        assert_eq!(sink.count(), 2);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn conditions_fire_independently() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        // person-count already suppressed...
        engine.evaluate(&two_people());
        assert_eq!(sink.count(), 1);

        // ...does not block device-detected.
        engine.evaluate(&one_phone());
        assert_eq!(sink.count(), 2);
        assert!(history.entries()[1].message.contains("Cell phone"));
        assert!(engine.state("device-detected").unwrap().active);
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_false_does_not_clear_state() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        engine.evaluate(&two_people());

        // Condition flickers false, still inside the window.
        engine.evaluate(&vec![]);
        advance(Duration::from_secs(2)).await;
        settle().await;
        engine.evaluate(&vec![]);

        assert!(engine.state("person-count").unwrap().active);
        engine.evaluate(&two_people());
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_set_produces_nothing() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        engine.evaluate(&vec![]);

        assert_eq!(sink.count(), 0);
        assert!(history.is_empty());
        assert!(!engine.state("person-count").unwrap().active);
        assert!(!engine.state("device-detected").unwrap().active);
    }

    #[tokio::test(start_paused = true)]
    async fn single_person_does_not_fire() {
        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = engine_with(Arc::clone(&history), sink.clone());

        engine.evaluate(&vec![Detection::new("person", 0.9, [10.0, 10.0, 50.0, 80.0])]);

        assert_eq!(sink.count(), 0);
        assert!(history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sink_failure_does_not_block_history_or_state() {
        let history = Arc::new(HistoryLog::new());
        let engine = engine_with(Arc::clone(&history), Arc::new(FailingSink));

        engine.evaluate(&two_people());

        assert_eq!(history.len(), 1);
        assert!(engine.state("person-count").unwrap().active);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_condition_is_excluded() {
        let mut config = default_alerts_config();
        config.device_detected.enabled = false;

        let history = Arc::new(HistoryLog::new());
        let sink = CountingSink::new();
        let engine = AlertEngine::new(
            builtin_conditions(&config),
            Arc::clone(&history),
            sink.clone(),
        );

        engine.evaluate(&one_phone());

        assert_eq!(sink.count(), 0);
        assert!(engine.state("device-detected").is_none());
    }
}
