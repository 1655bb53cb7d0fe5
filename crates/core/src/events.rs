//! Event sinks
//!
//! Components never reach for a global bus. Whoever drives the core passes a
//! sink in, and every placement, move, clear and phase change is pushed into it
//! in the order it happened.

use crate::types::CoreEvent;

/// Receiver for core events
pub trait EventSink {
    fn emit(&mut self, event: CoreEvent);
}

impl EventSink for Vec<CoreEvent> {
    fn emit(&mut self, event: CoreEvent) {
        self.push(event);
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: CoreEvent) {}
}
