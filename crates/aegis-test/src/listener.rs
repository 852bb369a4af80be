//! Scripted listener.

use aegis_core::Fault;
use aegis_interceptor::Listener;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;

/// A lifecycle event delivered to a [`ScriptedListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerEvent {
    /// `on_ready`
    Ready,
    /// `on_message`
    Message,
    /// `on_half_close`
    HalfClose,
    /// `on_complete`
    Complete,
    /// `on_cancel`
    Cancel,
}

#[derive(Debug, Clone)]
enum Reaction {
    Fail(Fault),
    Panic(String),
}

/// A [`Listener`] that records events and fails on command.
///
/// # Example
///
/// ```
/// use aegis_core::{ErrorType, Fault};
/// use aegis_interceptor::Listener;
/// use aegis_test::{ListenerEvent, ScriptedListener};
///
/// let listener = ScriptedListener::<u32>::new()
///     .fail_on(ListenerEvent::HalfClose, Fault::new(ErrorType::ANY, "boom"));
///
/// listener.on_message(1).unwrap();
/// assert!(listener.on_half_close().is_err());
/// assert_eq!(listener.events(), vec![ListenerEvent::Message, ListenerEvent::HalfClose]);
/// assert_eq!(listener.messages(), vec![1]);
/// ```
pub struct ScriptedListener<Req> {
    reactions: HashMap<ListenerEvent, Reaction>,
    events: Mutex<Vec<ListenerEvent>>,
    messages: Mutex<Vec<Req>>,
}

impl<Req> Default for ScriptedListener<Req> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req> ScriptedListener<Req> {
    /// Creates a listener that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reactions: HashMap::new(),
            events: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Returns `error` from the hook for `event`.
    #[must_use]
    pub fn fail_on(mut self, event: ListenerEvent, error: Fault) -> Self {
        self.reactions.insert(event, Reaction::Fail(error));
        self
    }

    /// Panics with `message` in the hook for `event`.
    #[must_use]
    pub fn panic_on(mut self, event: ListenerEvent, message: impl Into<String>) -> Self {
        self.reactions.insert(event, Reaction::Panic(message.into()));
        self
    }

    /// Returns the events delivered, in order.
    #[must_use]
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().clone()
    }

    /// Returns how many times `event` was delivered.
    #[must_use]
    pub fn count(&self, event: ListenerEvent) -> usize {
        self.events.lock().iter().filter(|e| **e == event).count()
    }

    fn react(&self, event: ListenerEvent) -> Result<(), Fault> {
        self.events.lock().push(event);
        match self.reactions.get(&event) {
            None => Ok(()),
            Some(Reaction::Fail(error)) => Err(error.clone()),
            Some(Reaction::Panic(message)) => panic!("{message}"),
        }
    }
}

impl<Req: Clone> ScriptedListener<Req> {
    /// Returns the messages delivered.
    #[must_use]
    pub fn messages(&self) -> Vec<Req> {
        self.messages.lock().clone()
    }
}

impl<Req: Send> Listener<Req> for ScriptedListener<Req> {
    fn on_ready(&self) -> Result<(), Fault> {
        self.react(ListenerEvent::Ready)
    }

    fn on_message(&self, message: Req) -> Result<(), Fault> {
        self.messages.lock().push(message);
        self.react(ListenerEvent::Message)
    }

    fn on_half_close(&self) -> Result<(), Fault> {
        self.react(ListenerEvent::HalfClose)
    }

    fn on_complete(&self) -> Result<(), Fault> {
        self.react(ListenerEvent::Complete)
    }

    fn on_cancel(&self) -> Result<(), Fault> {
        self.react(ListenerEvent::Cancel)
    }
}

impl<Req> fmt::Debug for ScriptedListener<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedListener")
            .field("reactions", &self.reactions)
            .field("events", &*self.events.lock())
            .finish_non_exhaustive()
    }
}
