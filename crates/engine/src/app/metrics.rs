use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_metrics_lock_poison_once(operation: &'static str) {
    if METRICS_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "metrics lock poisoned; recovered inner value");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoopMetricsSnapshot {
    pub tps: f32,
    pub tick_time_ms: f32,
    pub paused_ratio: f32,
    pub collision_events: u32,
}

#[derive(Clone, Debug)]
pub struct MetricsHandle {
    snapshot: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl Default for MetricsHandle {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(LoopMetricsSnapshot::default())),
        }
    }
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        match self.snapshot.read() {
            Ok(guard) => *guard,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("read");
                *poisoned.into_inner()
            }
        }
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_metrics_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    paused_ticks: u32,
    collision_events: u32,
    tick_time_sum: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub(crate) fn starting_at(interval_start: Instant, interval: Duration) -> Self {
        Self {
            interval_start,
            interval,
            ticks: 0,
            paused_ticks: 0,
            collision_events: 0,
            tick_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_tick(&mut self, tick_time: Duration, paused: bool, collision_events: u32) {
        self.ticks = self.ticks.saturating_add(1);
        if paused {
            self.paused_ticks = self.paused_ticks.saturating_add(1);
        }
        self.collision_events = self.collision_events.saturating_add(collision_events);
        self.tick_time_sum = self.tick_time_sum.saturating_add(tick_time);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let (tick_time_ms, paused_ratio) = if self.ticks == 0 {
            (0.0, 0.0)
        } else {
            (
                (self.tick_time_sum.as_secs_f32() / self.ticks as f32) * 1000.0,
                self.paused_ticks as f32 / self.ticks as f32,
            )
        };

        let snapshot = LoopMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            tick_time_ms,
            paused_ratio,
            collision_events: self.collision_events,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.paused_ticks = 0;
        self.collision_events = 0;
        self.tick_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::RwLock;
    use std::thread;

    use super::*;

    fn poison_lock(lock: &RwLock<LoopMetricsSnapshot>) {
        thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().expect("write guard");
                    panic!("poison metrics lock");
                })
                .join();
        });
    }

    #[test]
    fn snapshot_computes_expected_values() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));

        accumulator.record_tick(Duration::from_millis(2), false, 1);
        accumulator.record_tick(Duration::from_millis(2), false, 0);
        accumulator.record_tick(Duration::from_millis(2), true, 0);
        accumulator.record_tick(Duration::from_millis(2), true, 2);

        let snapshot = accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("snapshot should be emitted");

        assert!((snapshot.tps - 4.0).abs() < 0.05);
        assert!((snapshot.tick_time_ms - 2.0).abs() < 0.001);
        assert!((snapshot.paused_ratio - 0.5).abs() < 0.001);
        assert_eq!(snapshot.collision_events, 3);
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_tick(Duration::from_millis(16), false, 0);

        assert!(accumulator
            .maybe_snapshot(base + Duration::from_millis(500))
            .is_none());
    }

    #[test]
    fn snapshot_resets_interval_counters() {
        let base = Instant::now();
        let mut accumulator = MetricsAccumulator::starting_at(base, Duration::from_secs(1));
        accumulator.record_tick(Duration::from_millis(1), true, 5);
        accumulator
            .maybe_snapshot(base + Duration::from_secs(1))
            .expect("first snapshot");

        let second = accumulator
            .maybe_snapshot(base + Duration::from_secs(2))
            .expect("second snapshot");
        assert_eq!(second.tps, 0.0);
        assert_eq!(second.paused_ratio, 0.0);
        assert_eq!(second.collision_events, 0);
    }

    #[test]
    fn snapshot_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.tps, 0.0);
        assert_eq!(snapshot.tick_time_ms, 0.0);
        assert_eq!(snapshot.paused_ratio, 0.0);
    }

    #[test]
    fn publish_recovers_after_poison_without_panic() {
        let handle = MetricsHandle::default();
        poison_lock(handle.snapshot.as_ref());

        let expected = LoopMetricsSnapshot {
            tps: 60.0,
            tick_time_ms: 0.4,
            paused_ratio: 0.25,
            collision_events: 7,
        };
        handle.publish(expected);

        let actual = handle.snapshot();
        assert_eq!(actual.tps, expected.tps);
        assert_eq!(actual.tick_time_ms, expected.tick_time_ms);
        assert_eq!(actual.paused_ratio, expected.paused_ratio);
        assert_eq!(actual.collision_events, expected.collision_events);
    }
}
