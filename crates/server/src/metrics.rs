// In-process request counters, served at GET /metrics

use qortal_mcp::{DispatchOutcome, DispatchReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub rate_limited: u64,
    pub tool_success: BTreeMap<String, u64>,
    pub tool_error: BTreeMap<String, u64>,
}

/// Counters for a single process. Not aggregated across instances.
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.lock().requests += 1;
    }

    /// Count the outcome of a dispatched call. Rate-limited calls count
    /// toward neither per-tool map.
    pub fn record_dispatch(&self, report: &DispatchReport) {
        let mut metrics = self.lock();
        match (report.outcome, &report.tool) {
            (DispatchOutcome::RateLimited, _) => metrics.rate_limited += 1,
            (DispatchOutcome::Success, Some(tool)) => {
                *metrics.tool_success.entry(tool.clone()).or_default() += 1;
            }
            (DispatchOutcome::ToolError, Some(tool)) => {
                *metrics.tool_error.entry(tool.clone()).or_default() += 1;
            }
            _ => {}
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
