use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::catalog::discovery::ProfileContext;
use crate::catalog::placeholder::UnresolvedReason;
use crate::error::CatalogError;
use crate::types::FieldDescriptor;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CatalogSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (generation failed).
    Error,
    /// Critical error (I/O or the discovery collaborator failed).
    Critical,
}

/// Context about a generation run.
#[derive(Debug, Clone)]
pub struct CatalogContext {
    /// Stream the catalog is generated for.
    pub stream: String,
    /// Account/profile the run is scoped to.
    pub profile: ProfileContext,
}

/// Counters reported on successful generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    /// Schema properties, including the primary key.
    pub properties: usize,
    /// Metadata records, including the primary key.
    pub metadata_records: usize,
    /// Concrete fields synthesized from placeholder templates.
    pub expanded_fields: usize,
    /// Standard or custom fields skipped because they are deprecated.
    pub skipped_deprecated: usize,
    /// Placeholder templates that could not be expanded.
    pub unresolved_placeholders: usize,
}

/// Why a field was left out on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Deprecated,
}

/// Non-fatal conditions found during generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// A placeholder template matched neither static nor dynamic expansion and was skipped.
    UnresolvedPlaceholder { field: String, reason: UnresolvedReason },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedPlaceholder { field, reason } => {
                write!(f, "unresolved placeholder '{field}': {reason}")
            }
        }
    }
}

/// Observer interface for generation outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait CatalogObserver: Send + Sync {
    /// Called when generation succeeds.
    fn on_success(&self, _ctx: &CatalogContext, _stats: CatalogStats) {}

    /// Called for each field deliberately left out of the catalog.
    fn on_skip(&self, _ctx: &CatalogContext, _field: &FieldDescriptor, _reason: SkipReason) {}

    /// Called for each non-fatal problem.
    fn on_warning(&self, _ctx: &CatalogContext, _warning: &CatalogWarning) {}

    /// Called when generation fails.
    fn on_failure(&self, _ctx: &CatalogContext, _severity: CatalogSeverity, _error: &CatalogError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Severity used when reporting `error`.
pub fn severity_for_error(error: &CatalogError) -> CatalogSeverity {
    match error {
        CatalogError::Io(_) | CatalogError::Discovery { .. } => CatalogSeverity::Critical,
        CatalogError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => CatalogSeverity::Critical,
            _ => CatalogSeverity::Error,
        },
        CatalogError::Json(err) if err.is_io() => CatalogSeverity::Critical,
        _ => CatalogSeverity::Error,
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn CatalogObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn CatalogObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl CatalogObserver for CompositeObserver {
    fn on_success(&self, ctx: &CatalogContext, stats: CatalogStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_skip(&self, ctx: &CatalogContext, field: &FieldDescriptor, reason: SkipReason) {
        for o in &self.observers {
            o.on_skip(ctx, field, reason);
        }
    }

    fn on_warning(&self, ctx: &CatalogContext, warning: &CatalogWarning) {
        for o in &self.observers {
            o.on_warning(ctx, warning);
        }
    }

    fn on_failure(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs generation events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl CatalogObserver for StdErrObserver {
    fn on_success(&self, ctx: &CatalogContext, stats: CatalogStats) {
        eprintln!(
            "[catalog][ok] stream={} profile={} properties={} expanded={} skipped={} unresolved={}",
            ctx.stream,
            ctx.profile.profile_id,
            stats.properties,
            stats.expanded_fields,
            stats.skipped_deprecated,
            stats.unresolved_placeholders
        );
    }

    fn on_skip(&self, ctx: &CatalogContext, field: &FieldDescriptor, reason: SkipReason) {
        eprintln!(
            "[catalog][skip] stream={} field={} reason={:?}",
            ctx.stream, field.identifier, reason
        );
    }

    fn on_warning(&self, ctx: &CatalogContext, warning: &CatalogWarning) {
        eprintln!("[catalog][Warning] stream={} {}", ctx.stream, warning);
    }

    fn on_failure(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        eprintln!(
            "[catalog][{:?}] stream={} profile={} err={}",
            severity, ctx.stream, ctx.profile.profile_id, error
        );
    }

    fn on_alert(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        eprintln!(
            "[ALERT][catalog][{:?}] stream={} profile={} err={}",
            severity, ctx.stream, ctx.profile.profile_id, error
        );
    }
}

/// Appends generation events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl CatalogObserver for FileObserver {
    fn on_success(&self, ctx: &CatalogContext, stats: CatalogStats) {
        self.append_line(&format!(
            "{} ok stream={} profile={} properties={} metadata={} expanded={} skipped={} unresolved={}",
            unix_ts(),
            ctx.stream,
            ctx.profile.profile_id,
            stats.properties,
            stats.metadata_records,
            stats.expanded_fields,
            stats.skipped_deprecated,
            stats.unresolved_placeholders
        ));
    }

    fn on_skip(&self, ctx: &CatalogContext, field: &FieldDescriptor, reason: SkipReason) {
        self.append_line(&format!(
            "{} skip stream={} field={} reason={:?}",
            unix_ts(),
            ctx.stream,
            field.identifier,
            reason
        ));
    }

    fn on_warning(&self, ctx: &CatalogContext, warning: &CatalogWarning) {
        self.append_line(&format!("{} warn stream={} {}", unix_ts(), ctx.stream, warning));
    }

    fn on_failure(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        self.append_line(&format!(
            "{} fail severity={:?} stream={} profile={} err={}",
            unix_ts(),
            severity,
            ctx.stream,
            ctx.profile.profile_id,
            error
        ));
    }

    fn on_alert(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} stream={} profile={} err={}",
            unix_ts(),
            severity,
            ctx.stream,
            ctx.profile.profile_id,
            error
        ));
    }
}

/// Forwards generation events to `tracing`.
#[cfg(feature = "tracing")]
#[derive(Debug, Default)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
impl CatalogObserver for TracingObserver {
    fn on_success(&self, ctx: &CatalogContext, stats: CatalogStats) {
        tracing::info!(
            stream = %ctx.stream,
            profile = %ctx.profile.profile_id,
            properties = stats.properties,
            expanded = stats.expanded_fields,
            skipped = stats.skipped_deprecated,
            unresolved = stats.unresolved_placeholders,
            "catalog generated"
        );
    }

    fn on_skip(&self, ctx: &CatalogContext, field: &FieldDescriptor, reason: SkipReason) {
        tracing::debug!(stream = %ctx.stream, field = %field.identifier, ?reason, "field skipped");
    }

    fn on_warning(&self, ctx: &CatalogContext, warning: &CatalogWarning) {
        tracing::warn!(stream = %ctx.stream, %warning, "catalog warning");
    }

    fn on_failure(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        tracing::error!(stream = %ctx.stream, ?severity, %error, "catalog generation failed");
    }

    fn on_alert(&self, ctx: &CatalogContext, severity: CatalogSeverity, error: &CatalogError) {
        tracing::error!(stream = %ctx.stream, ?severity, %error, alert = true, "catalog generation failed");
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
