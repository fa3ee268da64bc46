//! Event bus -- the dispatch table wiring pipeline stages together.
//!
//! The table is built once at startup and immutable afterwards; there
//! is no runtime registration and no other process-wide state in the
//! core.

use std::collections::HashMap;
use std::sync::Arc;

use crate::events::{Event, EventKind};
use crate::Result;

/// A function bound to an event kind. Reactions may publish further
/// events through the bus handle they are given; those are handled to
/// completion before `publish` returns to the reaction.
#[async_trait::async_trait]
pub trait Reaction: Send + Sync {
    async fn handle(&self, bus: &EventBus, event: &Event) -> Result<()>;
}

/// Immutable mapping from event kind to an ordered reaction list.
pub struct EventBus {
    reactions: HashMap<EventKind, Vec<Arc<dyn Reaction>>>,
}

impl EventBus {
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Invoke every reaction registered for the event's kind, in
    /// registration order, awaiting each before starting the next.
    /// A reaction error surfaces here and halts the remaining
    /// reactions for this publish; there is no isolation between
    /// reactions of the same event.
    pub async fn publish(&self, event: &Event) -> Result<()> {
        for reaction in self.reactions.get(&event.kind()).into_iter().flatten() {
            reaction.handle(self, event).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct EventBusBuilder {
    reactions: HashMap<EventKind, Vec<Arc<dyn Reaction>>>,
}

impl EventBusBuilder {
    /// Append a reaction to the ordered list for `kind`.
    pub fn register(mut self, kind: EventKind, reaction: Arc<dyn Reaction>) -> Self {
        self.reactions.entry(kind).or_default().push(reaction);
        self
    }

    pub fn build(self) -> EventBus {
        EventBus {
            reactions: self.reactions,
        }
    }
}
