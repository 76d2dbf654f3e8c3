//! Progress reporting for long-running operations.
//!
//! Every operation takes a `&dyn ProgressSink` and calls it synchronously
//! between its sequential steps with a short status line and an overall
//! percentage. Closures of the form `Fn(&str, u8)` are sinks, so callers can
//! pass `&|status, percent| ...` directly.

/// Receives status updates from an operation
pub trait ProgressSink {
    /// Called with a human-readable status and an overall percentage (0-100)
    fn report(&self, status: &str, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, u8),
{
    fn report(&self, status: &str, percent: u8) {
        self(status, percent)
    }
}

/// Sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _status: &str, _percent: u8) {}
}

/// Percentage of `done` out of `total` mapped onto `[from, from + span]`
pub(crate) fn scaled(from: u8, span: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return from.saturating_add(span);
    }
    let share = (done as f64 / total as f64 * span as f64).round() as u8;
    from.saturating_add(share.min(span))
}
