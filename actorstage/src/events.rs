//! Stage lifecycle notifications.

use crate::actor::ActorId;
use crate::context::Generation;

/// Everything observers can be told about. Carries enough context to react
/// without querying the stage back.
#[derive(Clone, Debug, PartialEq)]
pub enum StageEvent {
    ActorLoaded { actor: ActorId, asset_id: String },
    ActorLoadFailed { actor: ActorId, asset_id: String, message: String },
    ContextLost,
    ContextRestored { generation: Generation },
    ActorRecovered { actor: ActorId },
    ActorRecoveryFailed { actor: ActorId, message: String },
}

/// Token returned by `subscribe`, used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&StageEvent)>;

/// Synchronous observer list. Events are delivered in subscription order,
/// on the caller's stack, before the emitting operation returns.
#[derive(Default)]
pub struct Observers {
    entries: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&StageEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(observer)));
        id
    }

    /// Returns false when the token is unknown (already unsubscribed).
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let Some(index) = self.entries.iter().position(|(sid, _)| *sid == id) else {
            return false;
        };
        self.entries.remove(index);
        true
    }

    pub fn emit(&mut self, event: &StageEvent) {
        for (_, observer) in &mut self.entries {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
