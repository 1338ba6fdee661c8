//! Event sinks shipped with the registry.

use std::sync::Arc;

use cvcp_core::events::RegistryEvent;
use cvcp_core::traits::EventSink;
use parking_lot::Mutex;
use tracing::info;

/// Buffers every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<RegistryEvent>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.lock().clone()
    }

    /// Take and clear the buffer.
    pub fn drain(&self) -> Vec<RegistryEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemoryEventLog {
    fn emit(&self, event: &RegistryEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Writes each event to the `tracing` pipeline at INFO.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &RegistryEvent) {
        match event.subject() {
            Some(subject) => info!(event = event.name(), %subject, ?event, "registry event"),
            None => info!(event = event.name(), ?event, "registry event"),
        }
    }
}

/// Forwards each event to every inner sink, in insertion order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &RegistryEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
