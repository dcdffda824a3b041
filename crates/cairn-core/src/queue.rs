//! The event queue joining producer callbacks to the dispatch loop.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::backend::{Transport, TransportError};
use crate::event::Event;

/// Unbounded FIFO of [`Event`]s.
///
/// Producers (input/protocol callbacks, on whatever thread the
/// transport runs them) call [`push`](Self::push); the dispatch loop is
/// the single consumer. There is no capacity limit and no priority:
/// push order is the only ordering guarantee.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<Event>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event. Never blocks beyond the internal lock.
    pub fn push(&self, event: Event) {
        self.events.lock().push_back(event);
    }

    /// Removes and returns the head event without waiting.
    pub fn try_pop(&self) -> Option<Event> {
        self.events.lock().pop_front()
    }

    /// Removes and returns the head event, servicing the transport
    /// while the queue is empty.
    ///
    /// Waiting is cooperative, not a spin: each pass flushes pending
    /// client I/O and then blocks in [`Transport::dispatch`] until the
    /// connection sees activity. Producers woken by that dispatch call
    /// push here, which is what eventually satisfies the pop. A dead
    /// transport surfaces as an error instead of looping forever.
    pub fn pop<T: Transport + ?Sized>(&self, transport: &mut T) -> Result<Event, TransportError> {
        loop {
            if let Some(event) = self.try_pop() {
                return Ok(event);
            }
            transport.flush_clients();
            transport.dispatch()?;
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}
