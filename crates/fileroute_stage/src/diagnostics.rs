//! Host-facing diagnostics sink, injected into the stage at construction.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Severity of a host message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumDiagnosticLevel {
    Info,
    Warning,
    Error,
}

/// Receiver for messages and tool progress addressed to the host.
pub trait DiagnosticSink: Send {
    fn report(&mut self, level: EnumDiagnosticLevel, message: &str);

    /// Upstream progress fraction in `[0.0, 1.0]`.
    fn progress(&mut self, _percent: f64) {}
}

/// Forwards host messages to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingDiagnosticSink {
    name_stage: String,
}

impl TracingDiagnosticSink {
    pub fn new(name_stage: impl Into<String>) -> Self {
        Self {
            name_stage: name_stage.into(),
        }
    }
}

impl Default for TracingDiagnosticSink {
    fn default() -> Self {
        Self::new("fileroute")
    }
}

impl DiagnosticSink for TracingDiagnosticSink {
    fn report(&mut self, level: EnumDiagnosticLevel, message: &str) {
        match level {
            EnumDiagnosticLevel::Info => info!(stage = %self.name_stage, "{message}"),
            EnumDiagnosticLevel::Warning => warn!(stage = %self.name_stage, "{message}"),
            EnumDiagnosticLevel::Error => error!(stage = %self.name_stage, "{message}"),
        }
    }

    fn progress(&mut self, percent: f64) {
        tracing::trace!(stage = %self.name_stage, percent, "Tool progress");
    }
}

#[derive(Debug, Default)]
struct SpecDiagnosticLog {
    l_messages: Vec<(EnumDiagnosticLevel, String)>,
    l_progress: Vec<f64>,
}

/// Stores every message; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct CollectingDiagnosticSink {
    log: Arc<Mutex<SpecDiagnosticLog>>,
}

impl CollectingDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(EnumDiagnosticLevel, String)> {
        self.log.lock().l_messages.clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.log
            .lock()
            .l_messages
            .iter()
            .filter(|(level, _)| *level == EnumDiagnosticLevel::Error)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    pub fn progress_values(&self) -> Vec<f64> {
        self.log.lock().l_progress.clone()
    }
}

impl DiagnosticSink for CollectingDiagnosticSink {
    fn report(&mut self, level: EnumDiagnosticLevel, message: &str) {
        self.log.lock().l_messages.push((level, message.to_string()));
    }

    fn progress(&mut self, percent: f64) {
        self.log.lock().l_progress.push(percent);
    }
}
