//! Parallel expansion of placeholder templates.
//!
//! Each template expands independently of every other, so the engine runs them on a rayon pool
//! and collects the results in input order. This module provides:
//!
//! - Parallel classification and expansion of a batch of templates
//! - Throttling of concurrent discovery calls (in-flight limit)
//! - Real-time metrics + observer hooks for monitoring
//!
//! The folded catalog is identical to a sequential run: results keep template order and the
//! first error in that order is returned.

mod observer;
mod semaphore;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;

use crate::catalog::discovery::{FieldDiscovery, ProfileContext};
use crate::catalog::exclusion::ExclusionIndex;
use crate::catalog::placeholder::{self, Classification, Expansion, PlaceholderTemplate};
use crate::error::{CatalogError, CatalogResult};

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, StdErrExecutionObserver,
};

use semaphore::Semaphore;

/// Configuration for the [`ExpansionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Upper bound on concurrently running discovery calls.
    ///
    /// Static expansions are not throttled; only calls to the discovery collaborator are.
    pub max_in_flight_discoveries: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        let n = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        Self {
            num_threads: Some(n),
            max_in_flight_discoveries: n.max(1),
        }
    }
}

/// Expands placeholder templates on a dedicated thread pool.
pub struct ExpansionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExpansionEngine {
    /// Create a new engine with the given options.
    ///
    /// Fails if `max_in_flight_discoveries == 0`, `num_threads == Some(0)`, or the pool cannot
    /// be built.
    pub fn new(opts: ExecutionOptions) -> CatalogResult<Self> {
        if opts.max_in_flight_discoveries == 0 {
            return Err(CatalogError::Execution {
                message: "max_in_flight_discoveries must be > 0".to_string(),
            });
        }
        if opts.num_threads == Some(0) {
            return Err(CatalogError::Execution {
                message: "num_threads must be > 0 when set".to_string(),
            });
        }

        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build()
            .map_err(|e| CatalogError::Execution {
                message: format!("failed to build thread pool: {e}"),
            })?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Classify and expand every template, returning expansions in input order.
    pub fn expand_all(
        &self,
        templates: &[PlaceholderTemplate],
        index: &ExclusionIndex,
        discovery: &dyn FieldDiscovery,
        profile: &ProfileContext,
    ) -> CatalogResult<Vec<Expansion>> {
        self.pool
            .install(|| self.expand_all_impl(templates, index, discovery, profile))
    }

    fn expand_all_impl(
        &self,
        templates: &[PlaceholderTemplate],
        index: &ExclusionIndex,
        discovery: &dyn FieldDiscovery,
        profile: &ProfileContext,
    ) -> CatalogResult<Vec<Expansion>> {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            templates: templates.len(),
        });

        let sem = Semaphore::new(self.opts.max_in_flight_discoveries);

        let results: Vec<CatalogResult<Expansion>> = templates
            .par_iter()
            .map(|template| {
                let id = template.identifier().to_string();
                self.metrics.on_template_start();
                self.emit(ExecutionEvent::TemplateStarted { template: id.clone() });

                let classification = placeholder::classify(template, index);
                let fields = match classification {
                    Classification::Static => placeholder::expand_static(template, index),
                    Classification::Dynamic => {
                        let (permit, waited) = sem.acquire();
                        if waited > Duration::ZERO {
                            self.metrics.on_throttle_wait(waited);
                            self.emit(ExecutionEvent::ThrottleWaited { duration: waited });
                        }

                        self.metrics.on_discovery_start();
                        self.emit(ExecutionEvent::DiscoveryStarted { template: id.clone() });
                        let out = placeholder::expand_dynamic(template, index, discovery, profile);
                        self.emit(ExecutionEvent::DiscoveryFinished {
                            template: id.clone(),
                            ok: out.is_ok(),
                        });
                        self.metrics.on_discovery_end();
                        drop(permit);
                        out?
                    }
                    Classification::Unresolved => Vec::new(),
                };

                self.emit(ExecutionEvent::TemplateFinished {
                    template: id,
                    classification,
                    fields: fields.len(),
                });
                self.metrics.on_template_end(fields.len());
                Ok(Expansion { classification, fields })
            })
            .collect();

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });

        results.into_iter().collect()
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}
