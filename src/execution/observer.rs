use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::catalog::placeholder::Classification;

/// Execution events emitted by the expansion engine.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { templates: usize },
    ThrottleWaited { duration: Duration },
    TemplateStarted { template: String },
    DiscoveryStarted { template: String },
    DiscoveryFinished { template: String, ok: bool },
    TemplateFinished {
        template: String,
        classification: Classification,
        fields: usize,
    },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// A simple stderr logger for execution events.
#[derive(Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        eprintln!("{event:?}");
    }
}

/// Real-time metrics for an expansion run.
///
/// The engine updates these counters during execution; callers can snapshot them at any time.
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    templates_started: AtomicU64,
    templates_finished: AtomicU64,
    fields_expanded: AtomicU64,
    discovery_calls: AtomicU64,
    throttle_wait_ns: AtomicU64,

    active_discoveries: AtomicUsize,
    max_active_discoveries: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            templates_started: AtomicU64::new(0),
            templates_finished: AtomicU64::new(0),
            fields_expanded: AtomicU64::new(0),
            discovery_calls: AtomicU64::new(0),
            throttle_wait_ns: AtomicU64::new(0),
            active_discoveries: AtomicUsize::new(0),
            max_active_discoveries: AtomicUsize::new(0),
        }
    }

    pub fn begin_run(&self) {
        let _ = self.run_id.fetch_add(1, Ordering::SeqCst);

        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.templates_started.store(0, Ordering::SeqCst);
        self.templates_finished.store(0, Ordering::SeqCst);
        self.fields_expanded.store(0, Ordering::SeqCst);
        self.discovery_calls.store(0, Ordering::SeqCst);
        self.throttle_wait_ns.store(0, Ordering::SeqCst);
        self.active_discoveries.store(0, Ordering::SeqCst);
        self.max_active_discoveries.store(0, Ordering::SeqCst);
    }

    pub fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub fn on_template_start(&self) {
        let _ = self.templates_started.fetch_add(1, Ordering::SeqCst);
    }

    pub fn on_template_end(&self, fields: usize) {
        let _ = self.templates_finished.fetch_add(1, Ordering::SeqCst);
        let _ = self.fields_expanded.fetch_add(fields as u64, Ordering::SeqCst);
    }

    pub fn on_discovery_start(&self) {
        let _ = self.discovery_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active_discoveries.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_active_discoveries.fetch_max(now, Ordering::SeqCst);
    }

    pub fn on_discovery_end(&self) {
        let _ = self.active_discoveries.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn on_throttle_wait(&self, d: Duration) {
        let add = d.as_nanos().min(u64::MAX as u128) as u64;
        let _ = self.throttle_wait_ns.fetch_add(add, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        let elapsed = if elapsed_ns > 0 {
            Some(Duration::from_nanos(elapsed_ns))
        } else {
            None
        };

        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed,
            templates_started: self.templates_started.load(Ordering::SeqCst),
            templates_finished: self.templates_finished.load(Ordering::SeqCst),
            fields_expanded: self.fields_expanded.load(Ordering::SeqCst),
            discovery_calls: self.discovery_calls.load(Ordering::SeqCst),
            throttle_wait: Duration::from_nanos(self.throttle_wait_ns.load(Ordering::SeqCst)),
            max_active_discoveries: self.max_active_discoveries.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub templates_started: u64,
    pub templates_finished: u64,
    pub fields_expanded: u64,
    pub discovery_calls: u64,
    pub throttle_wait: Duration,
    pub max_active_discoveries: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, templates={}/{}, fields_expanded={}, discovery_calls={}, max_active_discoveries={}, throttle_wait={:?}, elapsed={:?}",
            self.run_id,
            self.templates_finished,
            self.templates_started,
            self.fields_expanded,
            self.discovery_calls,
            self.max_active_discoveries,
            self.throttle_wait,
            self.elapsed
        )
    }
}
