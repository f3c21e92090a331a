//! Page event bus.
//!
//! One bus per page replaces per-listener wiring: action bars, shortcut bars
//! and any other observer subscribe and read events off a channel.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::part::PartId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    PartActivated { part: PartId, forced: bool },
    PartDeactivated { part: PartId, forced: bool },
    PartOpened(PartId),
    PartClosed(PartId),
    PartBroughtToTop(PartId),
    LayoutChanged,
    ZoomChanged { zoomed: bool },
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<PageEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<PageEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping the ones whose receiver
    /// has gone away.
    pub fn emit(&mut self, event: PageEvent) {
        tracing::trace!(?event, "page event");
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
