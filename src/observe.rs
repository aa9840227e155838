//! Injected logging capability for training runs

use std::sync::{Arc, Mutex};

/// Sink for the informational messages a training run records.
///
/// Injected into [`crate::ModelTrainer`] so tests can assert on messages
/// without capturing global logger output.
pub trait TrainingObserver: Send + Sync {
    /// Record one informational message.
    fn record(&self, message: &str);
}

/// Forwarding impl so callers can hand the trainer a shared observer and
/// keep their own handle to it.
impl<T: TrainingObserver + ?Sized> TrainingObserver for Arc<T> {
    fn record(&self, message: &str) {
        (**self).record(message)
    }
}

/// Default observer, forwards to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TrainingObserver for TracingObserver {
    fn record(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// Observer that buffers messages in memory for later inspection.
#[derive(Debug, Default)]
pub struct BufferingObserver {
    messages: Mutex<Vec<String>>,
}

impl BufferingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every message recorded so far, in order.
    pub fn messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TrainingObserver for BufferingObserver {
    fn record(&self, message: &str) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffering_observer_keeps_order() {
        let observer = BufferingObserver::new();
        observer.record("first");
        observer.record("second");

        assert_eq!(observer.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_tracing_observer_is_silent_without_subscriber() {
        // No subscriber installed; recording must still be a no-op success.
        TracingObserver.record("message into the void");
    }

    #[test]
    fn test_arc_observer_shares_buffer() {
        let observer = Arc::new(BufferingObserver::new());
        let boxed: Box<dyn TrainingObserver> = Box::new(Arc::clone(&observer));
        boxed.record("through the box");

        assert_eq!(observer.messages(), vec!["through the box"]);
    }
}
