//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Route resolution finished.
    Resolved,
    /// Build finished (fresh or cached).
    Built,
    /// Shell HTML has been flushed to client.
    ShellSent,
    /// Response assembled and handed to the server.
    Completion,
}

impl LifecyclePhase {
    /// Mark name recorded for this phase.
    pub fn mark_name(&self) -> &str {
        match self {
            Self::Resolved => "resolved",
            Self::Built => "built",
            Self::ShellSent => "shell_sent",
            Self::Completion => "complete",
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record the mark for a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LifecyclePhase) {
        self.mark(phase.mark_name());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start to a named mark.
    pub fn since_start(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time spent resolving the route.
    pub fn time_to_resolve(&self) -> Option<Duration> {
        self.since_start("resolved")
    }

    /// Time spent building, measured from resolution.
    pub fn build_duration(&self) -> Option<Duration> {
        let resolved = self.marks.get("resolved")?;
        let built = self.marks.get("built")?;
        Some(built.duration_since(*resolved))
    }

    /// Get time to shell flush.
    pub fn time_to_shell(&self) -> Option<Duration> {
        self.since_start("shell_sent")
    }

    /// Time from start to completion.
    pub fn total(&self) -> Option<Duration> {
        self.since_start("complete")
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marks_are_ordered() {
        let mut timing = TimingContext::new();
        timing.mark_phase(&LifecyclePhase::Resolved);
        timing.mark_phase(&LifecyclePhase::Built);
        timing.mark_phase(&LifecyclePhase::ShellSent);

        assert!(timing.time_to_resolve().unwrap() <= timing.time_to_shell().unwrap());
        assert!(timing.build_duration().is_some());
        assert!(timing.total().is_none());

        timing.mark_phase(&LifecyclePhase::Completion);
        assert!(timing.time_to_shell().unwrap() <= timing.total().unwrap());
    }

    #[test]
    fn test_missing_marks() {
        let timing = TimingContext::new();
        assert!(timing.time_to_shell().is_none());
        assert!(timing.build_duration().is_none());
    }
}
